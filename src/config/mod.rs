//! @acp:module "Configuration"
//! @acp:summary "Engine configuration loading and defaults"
//! @acp:domain cli
//! @acp:layer config
//!
//! Every tunable threshold of the pipeline lives here so that selection,
//! sampling and composition stay free of magic numbers.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::compose::ComposeMode;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = ".promptsmith.json";

fn default_database() -> PathBuf {
    PathBuf::from("extracted_results/elements.db")
}

fn default_variables_dir() -> PathBuf {
    PathBuf::from("variables")
}

/// @acp:summary "Main promptsmith configuration structure"
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// SQLite element library
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Directory holding colors/borders/decorations/software YAML files
    #[serde(default = "default_variables_dir")]
    pub variables_dir: PathBuf,

    /// Optional lexicon override (synonyms, denylist, scene cues)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lexicon: Option<PathBuf>,

    /// Optional knowledge base override (ethnicity tables, keyword maps)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge: Option<PathBuf>,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub composition: CompositionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            variables_dir: default_variables_dir(),
            lexicon: None,
            knowledge: None,
            selection: SelectionConfig::default(),
            sampling: SamplingConfig::default(),
            composition: CompositionConfig::default(),
        }
    }
}

impl Config {
    /// @acp:summary "Load config from a JSON file"
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load a config file whose relative data paths are relative to the file itself
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let config = Self::load(path)?;
        Ok(match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => config.resolve(dir),
            _ => config,
        })
    }

    /// @acp:summary "Save config to a file"
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// @acp:summary "Load from default location or fall back to defaults"
    pub fn load_or_default() -> Self {
        Self::load(CONFIG_FILE).unwrap_or_default()
    }

    /// Resolve a relative data path against a base directory
    pub fn resolve(&self, base: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        Self {
            database: join(&self.database),
            variables_dir: join(&self.variables_dir),
            lexicon: self.lexicon.as_deref().map(join),
            knowledge: self.knowledge.as_deref().map(join),
            ..self.clone()
        }
    }
}

fn default_keyword_weight() -> f64 {
    60.0
}

fn default_quality_weight() -> f64 {
    30.0
}

fn default_min_score() -> f64 {
    20.0
}

fn default_refined_penalty() -> f64 {
    20.0
}

fn default_full_match_bonus() -> f64 {
    10.0
}

fn default_plump_cues() -> Vec<String> {
    ["plump", "chubby", "full cheeks", "baby fat", "rounded", "圆润", "婴儿肥"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_refined_cues() -> Vec<String> {
    ["refined", "delicate", "classical", "sculpted", "elegant"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Element scoring weights and the acceptance gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConfig {
    /// Points for matching every user keyword
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,

    /// Points for a quality score of 10
    #[serde(default = "default_quality_weight")]
    pub quality_weight: f64,

    /// Selections scoring below this are discarded
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    #[serde(default = "default_refined_penalty")]
    pub refined_penalty: f64,

    #[serde(default = "default_full_match_bonus")]
    pub full_match_bonus: f64,

    /// User words that ask for a rounded/plump trait
    #[serde(default = "default_plump_cues")]
    pub plump_cues: Vec<String>,

    /// Element words that signal a refined/delicate trait
    #[serde(default = "default_refined_cues")]
    pub refined_cues: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            keyword_weight: default_keyword_weight(),
            quality_weight: default_quality_weight(),
            min_score: default_min_score(),
            refined_penalty: default_refined_penalty(),
            full_match_bonus: default_full_match_bonus(),
            plump_cues: default_plump_cues(),
            refined_cues: default_refined_cues(),
        }
    }
}

fn default_history_capacity() -> usize {
    100
}

fn default_enum_recent_window() -> usize {
    3
}

fn default_design_recent_window() -> usize {
    2
}

/// Repeat-avoidance windows for both samplers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingConfig {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Recent enum values excluded per variable
    #[serde(default = "default_enum_recent_window")]
    pub enum_recent_window: usize,

    /// Recent design options excluded per category
    #[serde(default = "default_design_recent_window")]
    pub design_recent_window: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            enum_recent_window: default_enum_recent_window(),
            design_recent_window: default_design_recent_window(),
        }
    }
}

fn default_keywords_limit() -> usize {
    3
}

fn default_min_word_len() -> usize {
    4
}

fn default_separator() -> String {
    ", ".to_string()
}

fn default_min_elements() -> usize {
    5
}

fn default_style_element_limit() -> usize {
    10
}

fn default_style_search_limit() -> usize {
    30
}

/// Composer and orchestration limits
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionConfig {
    #[serde(default)]
    pub mode: ComposeMode,

    /// Keywords used per element when the mode prefers brevity
    #[serde(default = "default_keywords_limit")]
    pub keywords_limit: usize,

    /// Single-word fragments shorter than this are dropped
    #[serde(default = "default_min_word_len")]
    pub min_word_len: usize,

    #[serde(default = "default_separator")]
    pub separator: String,

    /// Cross-domain sets smaller than this are supplemented from the portrait plan
    #[serde(default = "default_min_elements")]
    pub min_elements: usize,

    #[serde(default = "default_style_element_limit")]
    pub style_element_limit: usize,

    #[serde(default = "default_style_search_limit")]
    pub style_search_limit: usize,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            mode: ComposeMode::default(),
            keywords_limit: default_keywords_limit(),
            min_word_len: default_min_word_len(),
            separator: default_separator(),
            min_elements: default_min_elements(),
            style_element_limit: default_style_element_limit(),
            style_search_limit: default_style_search_limit(),
        }
    }
}
