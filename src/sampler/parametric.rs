//! @acp:module "Parametric Sampler"
//! @acp:summary "Sample declared element variables and fill template placeholders"
//! @acp:domain sampler
//! @acp:layer logic

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::history::SamplingHistory;
use crate::intent::Intent;
use crate::store::{Element, ElementVariable, VariableKind};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"));

const LOW_CUES: &[&str] = &["subtle", "soft", "gentle", "minimal", "轻微", "柔和", "淡"];
const HIGH_CUES: &[&str] = &["intense", "strong", "dramatic", "bold", "强烈", "浓烈", "震撼"];

/// One sampled variable value, keeping the declared numeric type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampledValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for SampledValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampledValue::Bool(b) => write!(f, "{}", b),
            SampledValue::Integer(i) => write!(f, "{}", i),
            SampledValue::Float(x) => write!(f, "{}", x),
            SampledValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangePreference {
    Low,
    High,
}

/// Style hints steering variable sampling
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleContext {
    /// Enum options containing any of these words are preferred
    #[serde(default)]
    pub preferred_values: Vec<String>,
    #[serde(default)]
    pub range_preference: Option<RangePreference>,
    /// Fixed values for boolean variables, by variable name
    #[serde(default)]
    pub boolean_overrides: HashMap<String, bool>,
}

impl StyleContext {
    /// Derive hints from the request: style words become preferences,
    /// intensity words push ranges low or high
    pub fn from_intent(intent: &Intent) -> Self {
        let mut preferred = Vec::new();
        if let Some(style) = intent.visual_style.art_style {
            preferred.extend(style.as_str().split('_').filter(|w| w.len() > 2).map(str::to_string));
        }
        preferred.push(intent.lighting.as_str().replace('_', " "));
        for value in [&intent.scene.theme, &intent.scene.era].into_iter().flatten() {
            preferred.push(value.replace('_', " "));
        }
        if let Some(action) = &intent.action {
            if let Some(energy) = &action.energy {
                preferred.extend(energy.split('_').filter(|w| w.len() > 2).map(str::to_string));
            }
        }

        let raw = intent.raw_lower();
        let range_preference = if HIGH_CUES.iter().any(|c| raw.contains(c)) {
            Some(RangePreference::High)
        } else if LOW_CUES.iter().any(|c| raw.contains(c)) {
            Some(RangePreference::Low)
        } else {
            None
        };

        Self {
            preferred_values: preferred,
            range_preference,
            boolean_overrides: HashMap::new(),
        }
    }
}

/// Element template after substitution, plus what was drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledElement {
    pub element_id: String,
    pub template: String,
    pub values: IndexMap<String, SampledValue>,
}

/// @acp:summary "Samples enum, range and boolean variables"
#[derive(Debug, Clone, Copy)]
pub struct ParametricSampler {
    /// Enum values used this many times back are avoided
    recent_window: usize,
}

impl ParametricSampler {
    pub fn new(recent_window: usize) -> Self {
        Self { recent_window }
    }

    /// Draw a value for one variable; `None` when it declares nothing usable
    pub fn sample_variable<R: Rng + ?Sized>(
        &self,
        variable: &ElementVariable,
        history_key: &str,
        context: &StyleContext,
        history: &SamplingHistory,
        rng: &mut R,
    ) -> Option<SampledValue> {
        let value = match variable.kind {
            VariableKind::Enum => self.sample_enum(variable, history_key, context, history, rng),
            VariableKind::Range => sample_range(variable, context.range_preference, rng),
            VariableKind::Boolean => Some(SampledValue::Bool(
                context
                    .boolean_overrides
                    .get(&variable.name)
                    .copied()
                    .unwrap_or_else(|| rng.random_bool(0.5)),
            )),
        };
        value.or_else(|| variable.default_value.clone().map(SampledValue::Text))
    }

    fn sample_enum<R: Rng + ?Sized>(
        &self,
        variable: &ElementVariable,
        history_key: &str,
        context: &StyleContext,
        history: &SamplingHistory,
        rng: &mut R,
    ) -> Option<SampledValue> {
        let options: Vec<String> = variable.possible_values.iter().map(value_text).collect();
        if options.is_empty() {
            return None;
        }

        let preferred: Vec<&String> = options
            .iter()
            .filter(|o| {
                let o = o.to_lowercase();
                context
                    .preferred_values
                    .iter()
                    .any(|p| !p.is_empty() && o.contains(&p.to_lowercase()))
            })
            .collect();
        let pool: Vec<&String> = if preferred.is_empty() {
            options.iter().collect()
        } else {
            preferred
        };

        let recent = history.recent(history_key, self.recent_window);
        let fresh: Vec<&String> = pool
            .iter()
            .copied()
            .filter(|o| !recent.contains(&o.as_str()))
            .collect();
        let pool = if fresh.is_empty() { pool } else { fresh };

        pool.choose(rng).map(|o| SampledValue::Text((*o).clone()))
    }

    /// @acp:summary "Sample every variable of an element and substitute its template"
    pub fn sample_element<R: Rng + ?Sized>(
        &self,
        element: &Element,
        variables: &[ElementVariable],
        context: &StyleContext,
        history: &mut SamplingHistory,
        rng: &mut R,
    ) -> SampledElement {
        let mut values = IndexMap::new();
        for variable in variables {
            let key = format!("{}.{}", element.id, variable.name);
            if let Some(value) = self.sample_variable(variable, &key, context, history, rng) {
                history.record(key, value.to_string());
                values.insert(variable.name.clone(), value);
            }
        }

        let template = fill_placeholders(&element.template, &values);
        debug!(element_id = %element.id, sampled = values.len(), "Sampled element variables");
        SampledElement {
            element_id: element.id.clone(),
            template,
            values,
        }
    }
}

/// Replace `{name}` tokens verbatim; unknown tokens stay in place
pub fn fill_placeholders<V: fmt::Display>(template: &str, values: &IndexMap<String, V>) -> String {
    let mut text = template.to_string();
    for (name, value) in values {
        text = text.replace(&format!("{{{}}}", name), &value.to_string());
    }
    text
}

/// Placeholder names still present in `text`, first-seen order
pub fn unresolved_placeholders(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for cap in PLACEHOLDER.captures_iter(text) {
        let name = cap[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn sample_range<R: Rng + ?Sized>(
    variable: &ElementVariable,
    preference: Option<RangePreference>,
    rng: &mut R,
) -> Option<SampledValue> {
    let (min, max) = match variable.possible_values.as_slice() {
        [min, max, ..] => (min, max),
        _ => return None,
    };

    if let (Some(a), Some(b)) = (min.as_i64(), max.as_i64()) {
        let (lo, hi) = narrow(a.min(b) as f64, a.max(b) as f64, preference);
        let (lo, hi) = (lo.round() as i64, hi.round() as i64);
        return Some(SampledValue::Integer(rng.random_range(lo..=hi.max(lo))));
    }

    let (a, b) = (min.as_f64()?, max.as_f64()?);
    let (lo, hi) = narrow(a.min(b), a.max(b), preference);
    let drawn = rng.random_range(lo..=hi);
    Some(SampledValue::Float((drawn * 100.0).round() / 100.0))
}

/// Keep the lower or upper half of the range
fn narrow(lo: f64, hi: f64, preference: Option<RangePreference>) -> (f64, f64) {
    let mid = lo + (hi - lo) / 2.0;
    match preference {
        Some(RangePreference::Low) => (lo, mid),
        Some(RangePreference::High) => (mid, hi),
        None => (lo, hi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::parse;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn element() -> Element {
        Element::new(
            "glow_1",
            "common",
            "special_effects",
            "glow",
            "{color} glow at {intensity} intensity, {unknown}",
        )
    }

    #[test]
    fn test_sample_element_fills_known_placeholders() {
        let sampler = ParametricSampler::new(3);
        let variables = vec![
            ElementVariable::enumeration("color", ["blue", "gold"]),
            ElementVariable::range("intensity", 1.into(), 5.into()),
        ];
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(7);

        let sampled = sampler.sample_element(
            &element(),
            &variables,
            &StyleContext::default(),
            &mut history,
            &mut rng,
        );
        assert!(!sampled.template.contains("{color}"));
        assert!(!sampled.template.contains("{intensity}"));
        assert!(sampled.template.ends_with("{unknown}"));
        assert_eq!(unresolved_placeholders(&sampled.template), vec!["unknown"]);
        assert!(matches!(sampled.values["intensity"], SampledValue::Integer(1..=5)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_enum_avoids_recent_values() {
        let sampler = ParametricSampler::new(2);
        let variable = ElementVariable::enumeration("color", ["red", "green", "blue"]);
        let mut history = SamplingHistory::default();
        history.record("e.color", "red");
        history.record("e.color", "green");
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..20 {
            let value = sampler
                .sample_variable(&variable, "e.color", &StyleContext::default(), &history, &mut rng)
                .unwrap();
            assert_eq!(value, SampledValue::Text("blue".into()));
        }
    }

    #[test]
    fn test_enum_prefers_style_values() {
        let sampler = ParametricSampler::new(0);
        let variable = ElementVariable::enumeration("mood", ["neon haze", "sunlit", "moonlit"]);
        let context = StyleContext::from_intent(&parse("neon city portrait"));
        let mut rng = StdRng::seed_from_u64(3);
        let value = sampler
            .sample_variable(&variable, "e.mood", &context, &SamplingHistory::default(), &mut rng)
            .unwrap();
        assert_eq!(value, SampledValue::Text("neon haze".into()));
    }

    #[test]
    fn test_range_preference_and_type() {
        let mut rng = StdRng::seed_from_u64(11);
        let float = ElementVariable::range("blur", 0.0.into(), 1.0.into());
        for _ in 0..20 {
            match sample_range(&float, Some(RangePreference::High), &mut rng) {
                Some(SampledValue::Float(x)) => assert!((0.5..=1.0).contains(&x)),
                other => panic!("unexpected {:?}", other),
            }
        }
        let int = ElementVariable::range("count", 10.into(), 20.into());
        for _ in 0..20 {
            match sample_range(&int, Some(RangePreference::Low), &mut rng) {
                Some(SampledValue::Integer(i)) => assert!((10..=15).contains(&i)),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_boolean_override() {
        let sampler = ParametricSampler::new(3);
        let mut context = StyleContext::default();
        context.boolean_overrides.insert("sparkle".into(), true);
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..10 {
            let value = sampler
                .sample_variable(
                    &ElementVariable::boolean("sparkle"),
                    "e.sparkle",
                    &context,
                    &SamplingHistory::default(),
                    &mut rng,
                )
                .unwrap();
            assert_eq!(value, SampledValue::Bool(true));
        }
    }

    #[test]
    fn test_context_from_intent() {
        let context = StyleContext::from_intent(&parse("intense cyberpunk neon"));
        assert_eq!(context.range_preference, Some(RangePreference::High));
        assert!(context.preferred_values.contains(&"neon".to_string()));
        assert!(context.preferred_values.contains(&"cyberpunk".to_string()));
    }
}
