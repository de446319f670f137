//! @acp:module "Lexicon"
//! @acp:summary "Synonym groups, fragment denylist and scene cue tables"
//! @acp:domain compose
//! @acp:layer data

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Raw-input cues mapped to one English scene description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneCue {
    pub cues: Vec<String>,
    pub text: String,
}

/// @acp:summary "Data tables driving deduplication and scene enhancement"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Lexicon {
    /// canonical concept -> surface forms
    #[serde(default)]
    pub synonyms: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub denylist: Vec<String>,
    #[serde(default)]
    pub scene_cues: Vec<SceneCue>,
    /// name in the raw input -> English description
    #[serde(default)]
    pub character_cues: IndexMap<String, String>,

    #[serde(skip)]
    concept_index: HashMap<String, String>,
}

impl Lexicon {
    pub fn builtin() -> Result<Self> {
        let yaml = include_str!("../../data/lexicon.yaml");
        let lexicon: Lexicon =
            serde_yaml::from_str(yaml).context("Failed to parse built-in lexicon.yaml")?;
        Ok(lexicon.indexed())
    }

    /// Load from an override file, or the built-in lexicon when `path` is None
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read lexicon from {:?}", path))?;
                let lexicon: Lexicon = serde_yaml::from_str(&yaml)
                    .with_context(|| format!("Failed to parse lexicon from {:?}", path))?;
                Ok(lexicon.indexed())
            }
            None => Self::builtin(),
        }
    }

    /// Rebuild the surface-form index; call after editing `synonyms`
    pub fn indexed(mut self) -> Self {
        let mut index = HashMap::new();
        for (concept, forms) in &self.synonyms {
            let canonical = concept.to_lowercase();
            index.insert(canonical.clone(), canonical.clone());
            for form in forms {
                index
                    .entry(form.trim().to_lowercase())
                    .or_insert_with(|| canonical.clone());
            }
        }
        self.concept_index = index;
        self
    }

    /// Canonical concept key for a whole fragment; unknown fragments are their own concept
    pub fn concept(&self, fragment: &str) -> String {
        let lower = fragment.trim().to_lowercase();
        match self.concept_index.get(&lower) {
            Some(concept) => concept.clone(),
            None => lower,
        }
    }

    /// True when the fragment contains a denylisted word
    pub fn is_denied(&self, fragment: &str) -> bool {
        let lower = fragment.to_lowercase();
        self.denylist
            .iter()
            .any(|word| lower.contains(&word.to_lowercase()))
    }

    /// English scene and character descriptions triggered by the raw input, first-seen order
    pub fn scene_descriptions(&self, raw_input: &str) -> Vec<String> {
        let lower = raw_input.to_lowercase();
        let mut parts: Vec<String> = Vec::new();
        let mut push = |text: &str| {
            if !parts.iter().any(|p| p == text) {
                parts.push(text.to_string());
            }
        };

        for cue in &self.scene_cues {
            if cue.cues.iter().any(|c| lower.contains(&c.to_lowercase())) {
                push(&cue.text);
            }
        }
        for (name, description) in &self.character_cues {
            if lower.contains(&name.to_lowercase()) {
                push(description);
            }
        }
        parts
    }
}
