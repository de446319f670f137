//! @acp:module "Design Sampler"
//! @acp:summary "Pick one color scheme, border and decoration for a style"
//! @acp:domain sampler
//! @acp:layer logic

use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::history::SamplingHistory;
use crate::design::{BorderStyle, ColorVariant, DesignCategory, DesignVariableStore, Decoration, StyleVariables};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorChoice {
    pub scheme: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ColorVariant>,
}

/// @acp:summary "Sampled design options with a description per category"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignSelection {
    pub style_used: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<ColorChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borders: Option<BorderStyle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decorations: Option<Decoration>,
    /// category name -> human-readable line
    pub descriptions: IndexMap<String, String>,
}

impl DesignSelection {
    /// Option name chosen for a category
    pub fn chosen(&self, category: DesignCategory) -> Option<&str> {
        match category {
            DesignCategory::Colors => self.colors.as_ref().map(|c| c.scheme.as_str()),
            DesignCategory::Borders => self.borders.as_ref().map(|b| b.name.as_str()),
            DesignCategory::Decorations => self.decorations.as_ref().map(|d| d.name.as_str()),
        }
    }

    pub fn description_lines(&self) -> impl Iterator<Item = &str> {
        self.descriptions.values().map(String::as_str)
    }
}

/// Samples design variables while avoiding the most recent choices
#[derive(Debug, Clone, Copy)]
pub struct DesignSampler {
    recent_window: usize,
}

impl DesignSampler {
    pub fn new(recent_window: usize) -> Self {
        Self { recent_window }
    }

    /// @acp:summary "Sample the requested categories for a style"
    ///
    /// Unknown styles fall back to the first defined style. `None` only when
    /// the store defines no styles at all.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        store: &DesignVariableStore,
        style: Option<&str>,
        categories: &[DesignCategory],
        history: &mut SamplingHistory,
        rng: &mut R,
    ) -> Option<DesignSelection> {
        let (style_used, vars) = store.resolve_style(style)?;
        let mut selection = DesignSelection {
            style_used: style_used.to_string(),
            colors: None,
            borders: None,
            decorations: None,
            descriptions: IndexMap::new(),
        };

        for &category in categories {
            let Some(name) = self.pick_name(vars, category, history, rng) else {
                debug!(style = style_used, %category, "No options for category");
                continue;
            };
            history.record(category.as_str(), name.clone());

            let description = match category {
                DesignCategory::Colors => vars.colors.get(&name).map(|scheme| {
                    let variant = scheme.variants.choose(&mut *rng).cloned();
                    let line = match &variant {
                        Some(v) => format!(
                            "Color palette: {}, primary color {} ({})",
                            scheme.name, v.name, v.hex
                        ),
                        None => format!("Color palette: {}", scheme.name),
                    };
                    selection.colors = Some(ColorChoice {
                        scheme: scheme.name.clone(),
                        variant,
                    });
                    line
                }),
                DesignCategory::Borders => vars.borders.get(&name).map(|border| {
                    selection.borders = Some(border.clone());
                    match &border.radius {
                        Some(radius) => format!("Border style: {}, radius {}", border.name, radius),
                        None => format!("Border style: {}", border.name),
                    }
                }),
                DesignCategory::Decorations => vars.decorations.get(&name).map(|decoration| {
                    selection.decorations = Some(decoration.clone());
                    format!("Decorative elements: {}", decoration.name)
                }),
            };
            if let Some(line) = description {
                selection.descriptions.insert(category.as_str().to_string(), line);
            }
        }

        Some(selection)
    }

    fn pick_name<R: Rng + ?Sized>(
        &self,
        vars: &StyleVariables,
        category: DesignCategory,
        history: &SamplingHistory,
        rng: &mut R,
    ) -> Option<String> {
        let names = vars.option_names(category);
        // Shrink the window until something is left, so two options still alternate
        for window in (1..=self.recent_window).rev() {
            let recent = history.recent(category.as_str(), window);
            let fresh: Vec<&str> = names
                .iter()
                .copied()
                .filter(|n| !recent.contains(n))
                .collect();
            if !fresh.is_empty() {
                return fresh.choose(rng).map(|n| n.to_string());
            }
        }
        names.choose(rng).map(|n| n.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const COLORS: &str = r##"
温馨可爱:
  珊瑚粉色系:
    variants:
      - name: 珊瑚粉
        hex: "#FF7F7F"
  薄荷绿色系:
    variants:
      - name: 薄荷绿
        hex: "#98E4C9"
  奶油黄色系:
    hex: "#FFF3B0"
"##;

    const BORDERS: &str = r#"
温馨可爱:
  大圆角:
    radius: 24px
  胶囊:
    radius: 999px
"#;

    const DECORATIONS: &str = r#"
温馨可爱:
  星星:
    shapes: [star]
"#;

    fn store() -> DesignVariableStore {
        let mut store = DesignVariableStore::default();
        store.merge_yaml(DesignCategory::Colors, COLORS).unwrap();
        store.merge_yaml(DesignCategory::Borders, BORDERS).unwrap();
        store.merge_yaml(DesignCategory::Decorations, DECORATIONS).unwrap();
        store
    }

    #[test]
    fn test_consecutive_samples_differ() {
        let store = store();
        let sampler = DesignSampler::new(2);
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(42);

        let mut previous: Option<DesignSelection> = None;
        for _ in 0..10 {
            let current = sampler
                .sample(&store, Some("温馨可爱"), &DesignCategory::ALL, &mut history, &mut rng)
                .unwrap();
            if let Some(prev) = &previous {
                assert_ne!(prev.chosen(DesignCategory::Colors), current.chosen(DesignCategory::Colors));
                assert_ne!(prev.chosen(DesignCategory::Borders), current.chosen(DesignCategory::Borders));
                // a single option repeats
                assert_eq!(current.chosen(DesignCategory::Decorations), Some("星星"));
            }
            previous = Some(current);
        }
    }

    #[test]
    fn test_descriptions() {
        let store = store();
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(1);
        let selection = DesignSampler::new(2)
            .sample(
                &store,
                None,
                &[DesignCategory::Borders, DesignCategory::Decorations],
                &mut history,
                &mut rng,
            )
            .unwrap();
        assert_eq!(selection.style_used, "温馨可爱");
        assert!(selection.colors.is_none());
        let lines: Vec<&str> = selection.description_lines().collect();
        assert!(lines[0].starts_with("Border style: "));
        assert!(lines[0].contains("radius"));
        assert_eq!(lines[1], "Decorative elements: 星星");
    }

    #[test]
    fn test_unknown_style_falls_back() {
        let store = store();
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(9);
        let selection = DesignSampler::new(2)
            .sample(&store, Some("赛博朋克"), &[DesignCategory::Colors], &mut history, &mut rng)
            .unwrap();
        assert_eq!(selection.style_used, "温馨可爱");
        assert!(selection.descriptions["colors"].starts_with("Color palette: "));
        assert!(DesignSampler::new(2)
            .sample(&DesignVariableStore::default(), None, &DesignCategory::ALL, &mut history, &mut rng)
            .is_none());
    }
}
