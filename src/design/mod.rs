//! @acp:module "Design Variable Store"
//! @acp:summary "Style-scoped color, border and decoration options loaded from YAML"
//! @acp:domain design
//! @acp:layer io
//!
//! Each variable category has its own file (`colors.yaml`, `borders.yaml`,
//! `decorations.yaml`) shaped as `style -> option name -> option data`.
//! The store is loaded once and is immutable afterwards. Style order is the
//! order styles first appear, colors file first, which makes "the first
//! defined style" well defined for fallback.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, warn};

use crate::error::Result;

/// Color scheme names carrying these markers describe text or background
/// roles, not palettes, and are never sampled.
const NON_PALETTE_MARKERS: &[&str] = &["文字", "背景"];

/// One variable category backed by its own YAML file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DesignCategory {
    Colors,
    Borders,
    Decorations,
}

impl DesignCategory {
    pub const ALL: [DesignCategory; 3] = [
        DesignCategory::Colors,
        DesignCategory::Borders,
        DesignCategory::Decorations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DesignCategory::Colors => "colors",
            DesignCategory::Borders => "borders",
            DesignCategory::Decorations => "decorations",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DesignCategory::Colors => "colors.yaml",
            DesignCategory::Borders => "borders.yaml",
            DesignCategory::Decorations => "decorations.yaml",
        }
    }
}

impl fmt::Display for DesignCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "colors" | "color" => Ok(DesignCategory::Colors),
            "borders" | "border" => Ok(DesignCategory::Borders),
            "decorations" | "decoration" => Ok(DesignCategory::Decorations),
            _ => Err(format!("Unknown design category: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorVariant {
    pub name: String,
    pub hex: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorScheme {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub variants: Vec<ColorVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BorderStyle {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<String>,
    /// Full option data as written in the file
    pub config: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoration {
    pub name: String,
    pub config: Value,
}

/// Every option defined for one style
#[derive(Debug, Clone, Default, Serialize)]
pub struct StyleVariables {
    pub colors: IndexMap<String, ColorScheme>,
    pub borders: IndexMap<String, BorderStyle>,
    pub decorations: IndexMap<String, Decoration>,
}

impl StyleVariables {
    /// Option names for a category, in file order
    pub fn option_names(&self, category: DesignCategory) -> Vec<&str> {
        match category {
            DesignCategory::Colors => self.colors.keys().map(String::as_str).collect(),
            DesignCategory::Borders => self.borders.keys().map(String::as_str).collect(),
            DesignCategory::Decorations => self.decorations.keys().map(String::as_str).collect(),
        }
    }
}

/// @acp:summary "File-based library of style-scoped design variables"
#[derive(Debug, Clone, Default, Serialize)]
pub struct DesignVariableStore {
    styles: IndexMap<String, StyleVariables>,
}

impl DesignVariableStore {
    /// Load every category file found in `dir`. Missing files leave that category empty.
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut store = Self::default();

        for category in DesignCategory::ALL {
            let path = dir.join(category.file_name());
            if !path.is_file() {
                warn!(path = %path.display(), "Design variable file not found");
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            store.merge_yaml(category, &content)?;
        }

        debug!(styles = store.styles.len(), dir = %dir.display(), "Loaded design variables");
        Ok(store)
    }

    /// Parse one category document and merge it into the store
    pub fn merge_yaml(&mut self, category: DesignCategory, content: &str) -> Result<()> {
        let doc: IndexMap<String, Value> = serde_yaml::from_str(content)?;

        for (style, options) in doc {
            let Value::Mapping(options) = options else {
                debug!(%style, %category, "Ignoring non-mapping style entry");
                continue;
            };
            let vars = self.styles.entry(style.clone()).or_default();

            for (name, data) in options {
                let Some(name) = scalar_string(&name) else {
                    continue;
                };
                match category {
                    DesignCategory::Colors => {
                        if let Some(scheme) = parse_color_scheme(&name, &data) {
                            vars.colors.insert(name, scheme);
                        }
                    }
                    DesignCategory::Borders => {
                        if let Some(border) = parse_border(&name, &data) {
                            vars.borders.insert(name, border);
                        }
                    }
                    DesignCategory::Decorations => {
                        vars.decorations.insert(
                            name.clone(),
                            Decoration { name, config: data },
                        );
                    }
                }
            }
        }
        Ok(())
    }

    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    pub fn style(&self, name: &str) -> Option<&StyleVariables> {
        self.styles.get(name)
    }

    /// The requested style, or the first defined style when it is absent
    pub fn resolve_style(&self, requested: Option<&str>) -> Option<(&str, &StyleVariables)> {
        if let Some(name) = requested {
            if let Some((key, vars)) = self.styles.get_key_value(name) {
                return Some((key.as_str(), vars));
            }
            warn!(style = name, "Unknown design style, using first defined style");
        }
        self.styles.first().map(|(k, v)| (k.as_str(), v))
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn parse_color_scheme(name: &str, data: &Value) -> Option<ColorScheme> {
    if NON_PALETTE_MARKERS.iter().any(|m| name.contains(m)) {
        return None;
    }
    let Value::Mapping(map) = data else {
        return None;
    };

    let mut variants = Vec::new();
    if let Some(Value::Sequence(items)) = map.get("variants") {
        for item in items {
            let name = item.get("name").and_then(scalar_string);
            let hex = item.get("hex").and_then(scalar_string);
            if let (Some(name), Some(hex)) = (name, hex) {
                variants.push(ColorVariant { name, hex });
            }
        }
    } else if let Some(hex) = map.get("hex").and_then(scalar_string) {
        variants.push(ColorVariant {
            name: name.to_string(),
            hex,
        });
    }

    Some(ColorScheme {
        name: name.to_string(),
        description: map.get("description").and_then(scalar_string),
        variants,
    })
}

fn parse_border(name: &str, data: &Value) -> Option<BorderStyle> {
    let Value::Mapping(map) = data else {
        return None;
    };
    let radius = map
        .get("radius")
        .or_else(|| map.get("border_radius"))
        .and_then(scalar_string);
    Some(BorderStyle {
        name: name.to_string(),
        radius,
        config: data.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLORS: &str = r##"
温馨可爱:
  珊瑚粉色系:
    description: warm coral tones
    variants:
      - name: 珊瑚粉
        hex: "#FF7F7F"
      - name: 蜜桃粉
        hex: "#FFB6A3"
  文字颜色:
    hex: "#333333"
  薄荷绿:
    hex: "#98E4C9"
  note: just a string
现代简约:
  黑白灰:
    variants:
      - name: 石墨灰
        hex: "#4A4A4A"
"##;

    const BORDERS: &str = r#"
温馨可爱:
  大圆角:
    radius: 24px
  胶囊:
    border_radius: 999
现代简约:
  直角:
    radius: 0
"#;

    #[test]
    fn test_colors_skip_text_roles_and_scalars() {
        let mut store = DesignVariableStore::default();
        store.merge_yaml(DesignCategory::Colors, COLORS).unwrap();

        let cute = store.style("温馨可爱").unwrap();
        assert_eq!(cute.option_names(DesignCategory::Colors), vec!["珊瑚粉色系", "薄荷绿"]);
        assert_eq!(cute.colors["珊瑚粉色系"].variants.len(), 2);
        // A bare hex becomes a single variant named after the option
        assert_eq!(cute.colors["薄荷绿"].variants[0].name, "薄荷绿");
    }

    #[test]
    fn test_border_radius_variants() {
        let mut store = DesignVariableStore::default();
        store.merge_yaml(DesignCategory::Borders, BORDERS).unwrap();
        let cute = store.style("温馨可爱").unwrap();
        assert_eq!(cute.borders["大圆角"].radius.as_deref(), Some("24px"));
        assert_eq!(cute.borders["胶囊"].radius.as_deref(), Some("999"));
    }

    #[test]
    fn test_resolve_style_falls_back_to_first() {
        let mut store = DesignVariableStore::default();
        store.merge_yaml(DesignCategory::Colors, COLORS).unwrap();
        store.merge_yaml(DesignCategory::Borders, BORDERS).unwrap();

        let (name, _) = store.resolve_style(Some("赛博朋克")).unwrap();
        assert_eq!(name, "温馨可爱");
        let (name, _) = store.resolve_style(Some("现代简约")).unwrap();
        assert_eq!(name, "现代简约");
        assert!(DesignVariableStore::default().resolve_style(None).is_none());
    }

    #[test]
    fn test_load_dir_tolerates_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("colors.yaml"), COLORS).unwrap();
        let store = DesignVariableStore::load_dir(dir.path()).unwrap();
        assert_eq!(store.styles().collect::<Vec<_>>(), vec!["温馨可爱", "现代简约"]);
        assert!(store.style("现代简约").unwrap().borders.is_empty());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Colors".parse::<DesignCategory>().unwrap(), DesignCategory::Colors);
        assert!("fonts".parse::<DesignCategory>().is_err());
    }
}
