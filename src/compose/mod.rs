//! @acp:module "Composer"
//! @acp:summary "Merge selected elements into one deduplicated, comma-delimited prompt"
//! @acp:domain compose
//! @acp:layer logic
//!
//! Order is the order of the input; nothing here ranks or sorts.

pub mod lexicon;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::CompositionConfig;
use crate::store::Element;

pub use lexicon::{Lexicon, SceneCue};

/// How much of each element to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComposeMode {
    /// Full template text
    Simple,
    /// Leading keywords when an element has at least three, else the template
    #[default]
    Auto,
    /// Leading keywords whenever any exist
    Detailed,
}

impl fmt::Display for ComposeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComposeMode::Simple => write!(f, "simple"),
            ComposeMode::Auto => write!(f, "auto"),
            ComposeMode::Detailed => write!(f, "detailed"),
        }
    }
}

impl FromStr for ComposeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simple" => Ok(ComposeMode::Simple),
            "auto" => Ok(ComposeMode::Auto),
            "detailed" => Ok(ComposeMode::Detailed),
            _ => Err(format!("Unknown compose mode: {}", s)),
        }
    }
}

/// Ordered fragment list that rejects repeated concepts
#[derive(Debug, Clone)]
pub struct Composition<'a> {
    lexicon: &'a Lexicon,
    min_word_len: usize,
    fragments: Vec<String>,
    seen: HashSet<String>,
}

impl<'a> Composition<'a> {
    pub fn new(lexicon: &'a Lexicon, min_word_len: usize) -> Self {
        Self {
            lexicon,
            min_word_len,
            fragments: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add one whole fragment; returns whether it survived
    pub fn push(&mut self, text: &str) -> bool {
        self.accept(text, false)
    }

    /// Add a keyword; a lone word under the length floor is dropped
    pub fn push_keyword(&mut self, keyword: &str) -> bool {
        self.accept(keyword, true)
    }

    fn accept(&mut self, text: &str, keyword: bool) -> bool {
        let text = text.trim();
        if text.is_empty() || self.lexicon.is_denied(text) {
            return false;
        }
        if keyword && is_short_word(text, self.min_word_len) {
            return false;
        }
        let concept = self.lexicon.concept(text);
        if !self.seen.insert(concept) {
            return false;
        }
        self.fragments.push(text.to_string());
        true
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn join(&self, separator: &str) -> String {
        self.fragments.join(separator)
    }
}

/// A lone word below the length floor, counted in characters
fn is_short_word(piece: &str, min_len: usize) -> bool {
    !piece.contains(char::is_whitespace) && piece.chars().count() < min_len
}

/// @acp:summary "Element-list composer configured by lexicon and limits"
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    lexicon: &'a Lexicon,
    config: &'a CompositionConfig,
}

impl<'a> Composer<'a> {
    pub fn new(lexicon: &'a Lexicon, config: &'a CompositionConfig) -> Self {
        Self { lexicon, config }
    }

    /// Start an empty composition using this composer's rules
    pub fn composition(&self) -> Composition<'a> {
        Composition::new(self.lexicon, self.config.min_word_len)
    }

    /// Whether `element` contributes its leading keywords instead of its template
    pub fn uses_keywords(&self, element: &Element, mode: ComposeMode) -> bool {
        match mode {
            ComposeMode::Simple => false,
            ComposeMode::Auto => element.keywords.len() >= 3,
            ComposeMode::Detailed => !element.keywords.is_empty(),
        }
    }

    /// Texts an element contributes under `mode`
    pub fn element_texts<'e>(&self, element: &'e Element, mode: ComposeMode) -> Vec<&'e str> {
        if self.uses_keywords(element, mode) {
            element
                .keywords
                .iter()
                .take(self.config.keywords_limit)
                .map(String::as_str)
                .collect()
        } else {
            vec![element.template.as_str()]
        }
    }

    /// Append every element's texts to an existing composition
    pub fn extend(&self, composition: &mut Composition<'_>, elements: &[Element], mode: ComposeMode) {
        for element in elements {
            let keywords = self.uses_keywords(element, mode);
            for text in self.element_texts(element, mode) {
                if keywords {
                    composition.push_keyword(text);
                } else {
                    composition.push(text);
                }
            }
        }
    }

    /// @acp:summary "Compose elements into the final delimited text"
    pub fn compose(&self, elements: &[Element], mode: ComposeMode) -> String {
        let mut composition = self.composition();
        self.extend(&mut composition, elements, mode);
        composition.join(&self.config.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn el(id: &str, template: &str, keywords: &[&str]) -> Element {
        Element::new(id, "portrait", "misc", id, template).with_keywords(keywords.iter().copied())
    }

    fn compose(elements: &[Element], mode: ComposeMode) -> String {
        let lexicon = Lexicon::builtin().unwrap();
        let config = CompositionConfig::default();
        Composer::new(&lexicon, &config).compose(elements, mode)
    }

    #[test]
    fn test_auto_uses_keywords_only_with_three_or_more() {
        let elements = vec![
            el("a", "a young woman with a calm face", &["young woman", "calm"]),
            el("b", "soft rim light from behind", &["rim light", "backlight", "glow", "halo"]),
        ];
        assert_eq!(
            compose(&elements, ComposeMode::Auto),
            "a young woman with a calm face, rim light, glow"
        );
    }

    #[test]
    fn test_detailed_and_simple() {
        let elements = vec![el("a", "a young woman with a calm face", &["young woman", "calm"])];
        assert_eq!(compose(&elements, ComposeMode::Detailed), "young woman, calm");
        assert_eq!(
            compose(&elements, ComposeMode::Simple),
            "a young woman with a calm face"
        );
    }

    #[test]
    fn test_synonyms_collapse_to_first_seen() {
        let elements = vec![
            el("a", "woman", &[]),
            el("b", "lady", &[]),
            el("c", "Rim Light", &[]),
            el("d", "edge lighting", &[]),
            el("e", "cinematic bokeh", &[]),
            el("f", "bokeh", &[]),
        ];
        assert_eq!(
            compose(&elements, ComposeMode::Simple),
            "woman, Rim Light, cinematic bokeh"
        );
    }

    #[test]
    fn test_template_with_commas_is_one_fragment() {
        let elements = vec![
            el("a", "soft light, gentle glow", &[]),
            el("b", "soft light", &[]),
            el("c", "red, paper cut", &[]),
        ];
        assert_eq!(
            compose(&elements, ComposeMode::Simple),
            "soft light, gentle glow, soft light, red, paper cut"
        );
    }

    #[test]
    fn test_denylist_and_short_words() {
        let elements = vec![el(
            "a",
            "x",
            &["red", "paper lanterns", "glass bottle", "moody haze"],
        )];
        // "red" is a short single word, the next two hit the denylist, the last is past the limit
        assert_eq!(compose(&elements, ComposeMode::Detailed), "");
        // Characters are counted for every script; templates are exempt
        assert_eq!(compose(&[el("b", "x", &["红衣", "长发飘逸"])], ComposeMode::Detailed), "长发飘逸");
        assert_eq!(compose(&[el("c", "红衣", &[])], ComposeMode::Simple), "红衣");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(compose(&[], ComposeMode::Auto), "");
    }

    #[test]
    fn test_no_two_fragments_share_a_concept() {
        let lexicon = Lexicon::builtin().unwrap();
        let elements = vec![
            el("a", "x", &["female", "girl", "young", "youthful"]),
            el("b", "x", &["dramatic shadows", "dramatic lighting"]),
            el("c", "x", &["Chinese", "Korean", "almond eyes", "eyes"]),
        ];
        let out = compose(&elements, ComposeMode::Detailed);
        let concepts: Vec<String> = out.split(", ").map(|f| lexicon.concept(f)).collect();
        let unique: HashSet<&String> = concepts.iter().collect();
        assert_eq!(unique.len(), concepts.len());
        assert_eq!(out, "female, young, dramatic shadows, Chinese, almond eyes");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Detailed".parse::<ComposeMode>().unwrap(), ComposeMode::Detailed);
        assert!("verbose".parse::<ComposeMode>().is_err());
    }
}
