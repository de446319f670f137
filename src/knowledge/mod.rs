//! @acp:module "Knowledge Base"
//! @acp:summary "Plausibility tables and keyword maps shared by selection and consistency checks"
//! @acp:domain consistency
//! @acp:layer data

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::intent::Ethnicity;

/// Lighting profile attached to a director or lighting style
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LightingProfile {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub lighting_keywords: Vec<String>,
    #[serde(default)]
    pub required_elements: Vec<String>,
}

/// Expected prompt words per requested trait value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletenessTable {
    #[serde(default)]
    pub clothing: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub hairstyle: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub era: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub director_style: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub lighting: HashMap<String, Vec<String>>,
}

/// @acp:summary "Fixed domain knowledge loaded from YAML"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub ethnicity_typical_eyes: HashMap<Ethnicity, Vec<String>>,
    #[serde(default)]
    pub ethnicity_typical_hair: HashMap<Ethnicity, Vec<String>>,
    #[serde(default)]
    pub preferred_eye_shape: HashMap<Ethnicity, String>,
    #[serde(default)]
    pub eye_colors: Vec<String>,
    #[serde(default)]
    pub ethnicity_categories: Vec<String>,
    #[serde(default)]
    pub eye_categories: Vec<String>,
    #[serde(default)]
    pub hair_color_categories: Vec<String>,
    #[serde(default)]
    pub co_occurring_categories: Vec<String>,
    #[serde(default)]
    pub subject_attribute_categories: Vec<String>,
    #[serde(default)]
    pub director_lighting_styles: HashMap<String, LightingProfile>,
    #[serde(default)]
    pub director_keywords: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub clothing_keywords: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub hairstyle_keywords: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub era_keywords: HashMap<String, Vec<String>>,
    #[serde(default)]
    pub completeness: CompletenessTable,
}

impl KnowledgeBase {
    /// Built-in tables compiled into the binary
    pub fn builtin() -> Result<Self> {
        let yaml = include_str!("../../data/knowledge.yaml");
        serde_yaml::from_str(yaml).context("Failed to parse built-in knowledge.yaml")
    }

    /// Load from an override file, or the built-in tables when `path` is None
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read knowledge base from {:?}", path))?;
                serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Failed to parse knowledge base from {:?}", path))
            }
            None => Self::builtin(),
        }
    }

    pub fn typical_eyes(&self, ethnicity: Ethnicity) -> &[String] {
        self.ethnicity_typical_eyes
            .get(&ethnicity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn typical_hair(&self, ethnicity: Ethnicity) -> &[String] {
        self.ethnicity_typical_hair
            .get(&ethnicity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Eye color words in `text` that the ethnicity's whitelist does not allow
    ///
    /// Returns nothing when the ethnicity has no whitelist.
    pub fn incompatible_eye_colors(&self, ethnicity: Ethnicity, text: &str) -> Vec<String> {
        let allowed = self.typical_eyes(ethnicity);
        if allowed.is_empty() {
            return Vec::new();
        }
        let text = text.to_lowercase();
        let mut found: Vec<String> = Vec::new();
        for color in &self.eye_colors {
            let canonical = canonical_color(color);
            if !text.contains(color.as_str()) || found.contains(&canonical) {
                continue;
            }
            if !allowed.iter().any(|a| canonical_color(a) == canonical) {
                found.push(canonical);
            }
        }
        found
    }

    pub fn is_eye_category(&self, category: &str) -> bool {
        self.eye_categories.iter().any(|c| c == category)
    }

    pub fn is_hair_color_category(&self, category: &str) -> bool {
        self.hair_color_categories.iter().any(|c| c == category)
    }

    pub fn is_ethnicity_category(&self, category: &str) -> bool {
        self.ethnicity_categories.iter().any(|c| c == category)
    }

    pub fn allows_repeats(&self, category: &str) -> bool {
        self.co_occurring_categories.iter().any(|c| c == category)
    }

    pub fn is_subject_attribute(&self, category: &str) -> bool {
        self.subject_attribute_categories.iter().any(|c| c == category)
    }
}

/// `gray` and `grey` are the same color
fn canonical_color(color: &str) -> String {
    let lower = color.trim().to_lowercase();
    if lower == "gray" {
        "grey".to_string()
    } else {
        lower
    }
}
