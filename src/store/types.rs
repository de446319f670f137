//! @acp:module "Element Store Types"
//! @acp:summary "Domain, category, element and variable records"
//! @acp:domain store
//! @acp:layer model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A topical partition of the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "domain_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub total_elements: u32,
}

/// A field-like grouping inside one domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "category_id")]
    pub id: String,
    pub domain_id: String,
    pub name: String,
    #[serde(default)]
    pub total_elements: u32,
}

/// @acp:summary "Atomic reusable content fragment"
///
/// Field names on the wire follow the library's export format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(rename = "element_id")]
    pub id: String,
    pub domain_id: String,
    pub category_id: String,
    pub name: String,
    /// Localized display name
    #[serde(rename = "chinese_name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Prompt text; may contain `{placeholder}` tokens
    #[serde(rename = "ai_prompt_template")]
    pub template: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Quality in [0, 10]
    #[serde(rename = "reusability_score", default)]
    pub quality: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Ids of the source texts this element was learned from
    #[serde(default)]
    pub source_prompts: Vec<i64>,
    #[serde(default = "default_learned_from")]
    pub learned_from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

fn default_learned_from() -> String {
    "manual".to_string()
}

impl Element {
    /// Create a minimal element; remaining fields take defaults
    pub fn new(
        id: impl Into<String>,
        domain_id: impl Into<String>,
        category_id: impl Into<String>,
        name: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            domain_id: domain_id.into(),
            category_id: category_id.into(),
            name: name.into(),
            display_name: None,
            template: template.into(),
            keywords: Vec::new(),
            quality: 0.0,
            tags: Vec::new(),
            source_prompts: Vec::new(),
            learned_from: default_learned_from(),
            metadata: None,
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Lowercased template plus keywords, used for substring matching
    pub fn search_text(&self) -> String {
        let mut text = self.template.to_lowercase();
        for kw in &self.keywords {
            text.push(' ');
            text.push_str(&kw.to_lowercase());
        }
        text
    }

    /// Label shown to users
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Declared type of a parametric slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    Enum,
    Range,
    Boolean,
}

impl VariableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Enum => "enum",
            VariableKind::Range => "range",
            VariableKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VariableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "enum" => Ok(VariableKind::Enum),
            "range" => Ok(VariableKind::Range),
            "boolean" | "bool" => Ok(VariableKind::Boolean),
            _ => Err(format!("Unknown variable type: {}", s)),
        }
    }
}

/// Named parametric slot attached to one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementVariable {
    #[serde(rename = "parameter_name")]
    pub name: String,
    #[serde(rename = "parameter_type")]
    pub kind: VariableKind,
    /// Enum choices, or `[min, max]` for ranges
    #[serde(default)]
    pub possible_values: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ElementVariable {
    pub fn enumeration<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: VariableKind::Enum,
            possible_values: values
                .into_iter()
                .map(|v| serde_json::Value::String(v.into()))
                .collect(),
            default_value: None,
            description: None,
        }
    }

    pub fn range(name: impl Into<String>, min: serde_json::Value, max: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Range,
            possible_values: vec![min, max],
            default_value: None,
            description: None,
        }
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::Boolean,
            possible_values: vec![true.into(), false.into()],
            default_value: None,
            description: None,
        }
    }
}

/// Source text an element was extracted from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcePrompt {
    pub prompt_id: i64,
    pub original_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(default = "default_learning_status")]
    pub learning_status: String,
    #[serde(default)]
    pub extracted_elements_count: u32,
}

fn default_learning_status() -> String {
    "pending".to_string()
}

impl SourcePrompt {
    pub fn new(prompt_id: i64, original_prompt: impl Into<String>) -> Self {
        Self {
            prompt_id,
            original_prompt: original_prompt.into(),
            theme: None,
            domain_classification: None,
            quality_score: None,
            complexity: None,
            learning_status: default_learning_status(),
            extracted_elements_count: 0,
        }
    }
}

/// Library-wide counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct LibraryStats {
    pub total_elements: u32,
    pub total_tags: u32,
    /// (domain id, element count), largest first
    pub domains: Vec<(String, u32)>,
    /// (tag name, usage count), most used first
    pub top_tags: Vec<(String, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_kind_from_str() {
        assert_eq!("enum".parse::<VariableKind>().unwrap(), VariableKind::Enum);
        assert_eq!("Range".parse::<VariableKind>().unwrap(), VariableKind::Range);
        assert_eq!("bool".parse::<VariableKind>().unwrap(), VariableKind::Boolean);
        assert!("list".parse::<VariableKind>().is_err());
    }

    #[test]
    fn test_search_text_includes_keywords() {
        let element = Element::new("e1", "portrait", "eye_types", "almond", "Almond Eyes")
            .with_keywords(["Dark Brown", "gentle"]);
        assert_eq!(element.search_text(), "almond eyes dark brown gentle");
    }

    #[test]
    fn test_element_wire_names() {
        let element = Element::new("e1", "portrait", "gender", "female", "young woman");
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(json["element_id"], "e1");
        assert_eq!(json["ai_prompt_template"], "young woman");
        assert_eq!(json["learned_from"], "manual");
    }
}
