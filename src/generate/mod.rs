//! @acp:module "Generator"
//! @acp:summary "End-to-end orchestration from raw request to final prompt"
//! @acp:domain generate
//! @acp:layer service
//! @acp:stability stable
//!
//! The [`Generator`] owns every library the pipeline reads plus both
//! sampling histories, so repeat avoidance carries across requests made
//! through the same instance.

pub mod cross_domain;
pub mod design;
pub mod portrait;
pub mod software;

use std::path::Path;

use anyhow::{Context, Result};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classify::{classify, FieldRequest, GenerationType};
use crate::compose::Lexicon;
use crate::config::Config;
use crate::consistency::{ConflictResolver, ConsistencyChecker, MissingRequirement};
use crate::design::DesignVariableStore;
use crate::error::PromptError;
use crate::intent::{parse, Intent};
use crate::knowledge::KnowledgeBase;
use crate::retrieve::CandidateRetriever;
use crate::sampler::{DesignSelection, SamplingHistory};
use crate::select::ElementSelector;
use crate::store::{Element, ElementStore};

pub use software::SoftwareCatalog;

/// @acp:summary "Final prompt with the path taken and what went into it"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub prompt: String,
    #[serde(rename = "type")]
    pub generation_type: GenerationType,
    pub metadata: GenerationMetadata,
}

impl GenerationResult {
    /// Empty prompt carrying the failure in `metadata.error`
    pub fn failed(generation_type: GenerationType, error: impl std::fmt::Display) -> Self {
        Self {
            prompt: String::new(),
            generation_type,
            metadata: GenerationMetadata {
                error: Some(error.to_string()),
                ..GenerationMetadata::default()
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.metadata.error.is_some()
    }
}

/// Path-specific details; absent fields are left out of JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domains_used: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_fixed: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<String>,
    /// Ids of the elements composed, in prompt order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design_selection: Option<DesignSelection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    /// Whether scene descriptions were prepended
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enhanced: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_requirements: Vec<MissingRequirement>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved_placeholders: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Borrowed view of the read-only libraries a store-backed path needs
#[derive(Clone, Copy)]
pub(crate) struct Pipeline<'a> {
    pub store: &'a ElementStore,
    pub config: &'a Config,
    pub lexicon: &'a Lexicon,
    pub knowledge: &'a KnowledgeBase,
}

impl<'a> Pipeline<'a> {
    pub fn retriever(&self) -> CandidateRetriever<'a> {
        CandidateRetriever::new(self.store)
    }

    /// @acp:summary "Fill each requested field with its best accepted candidate"
    ///
    /// Filters are tried in order; an unfiltered query follows only when the
    /// request allows it. Ids already taken are never added twice.
    pub fn fill_fields(
        &self,
        plan: &[FieldRequest],
        intent: &Intent,
        elements: &mut Vec<Element>,
    ) -> crate::Result<usize> {
        let retriever = self.retriever();
        let selector = ElementSelector::new(&self.config.selection);
        let mut added = 0;

        for request in plan {
            let field = request.field_name();
            let mut candidates = Vec::new();
            for filter in &request.filters {
                candidates = retriever.get_candidates(&request.domain, &request.category, Some(filter))?;
                if !candidates.is_empty() {
                    break;
                }
            }
            if candidates.is_empty() && (request.filters.is_empty() || request.fallback_unfiltered) {
                candidates = retriever.get_candidates(&request.domain, &request.category, None)?;
            }
            if candidates.is_empty() {
                debug!(%field, "No candidates, skipping field");
                continue;
            }

            if let Some(element) = selector.pick(&candidates, &request.keywords, intent, &field) {
                if !elements.iter().any(|e| e.id == element.id) {
                    elements.push(element);
                    added += 1;
                }
            }
        }
        Ok(added)
    }

    /// Check once, then repair; returns the repaired list, issue count and fix lines
    pub fn check_and_resolve(
        &self,
        elements: Vec<Element>,
        intent: &Intent,
    ) -> crate::Result<(Vec<Element>, usize, Vec<String>)> {
        let hint = intent.subject.ethnicity;
        let issues = ConsistencyChecker::new(self.knowledge).check(&elements, hint);
        if issues.is_empty() {
            return Ok((elements, 0, Vec::new()));
        }
        for issue in &issues {
            debug!(kind = ?issue.kind, severity = %issue.severity, "{}", issue.description);
        }
        let count = issues.len();
        let resolution =
            ConflictResolver::new(self.knowledge).resolve(elements, &issues, &self.retriever(), hint)?;
        Ok((resolution.elements, count, resolution.fixes))
    }
}

/// Distinct domains in first-seen order
pub(crate) fn domains_of(elements: &[Element]) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();
    for element in elements {
        if !domains.contains(&element.domain_id) {
            domains.push(element.domain_id.clone());
        }
    }
    domains
}

/// @acp:summary "Prompt generation engine with per-instance sampling state"
#[derive(Debug)]
pub struct Generator {
    config: Config,
    store: Option<ElementStore>,
    store_error: Option<String>,
    design: DesignVariableStore,
    software: SoftwareCatalog,
    lexicon: Lexicon,
    knowledge: KnowledgeBase,
    parametric_history: SamplingHistory,
    design_history: SamplingHistory,
}

impl Generator {
    /// Generator with no element library; add one with [`Generator::with_store`]
    pub fn new(config: Config, lexicon: Lexicon, knowledge: KnowledgeBase) -> Self {
        let capacity = config.sampling.history_capacity;
        Self {
            config,
            store: None,
            store_error: Some("no element store configured".to_string()),
            design: DesignVariableStore::default(),
            software: SoftwareCatalog::default(),
            lexicon,
            knowledge,
            parametric_history: SamplingHistory::new(capacity),
            design_history: SamplingHistory::new(capacity),
        }
    }

    /// @acp:summary "Load every library named by the config"
    ///
    /// A missing or unreadable element library is not fatal: store-backed
    /// paths report it per request while software generation keeps working.
    /// Broken lexicon, knowledge or YAML files are errors.
    pub fn from_config(config: Config) -> Result<Self> {
        let lexicon = Lexicon::load(config.lexicon.as_deref())?;
        let knowledge = KnowledgeBase::load(config.knowledge.as_deref())?;
        let design = load_design(&config.variables_dir)?;
        let software = SoftwareCatalog::load_dir_or_builtin(&config.variables_dir)?;

        let mut generator = Self::new(config, lexicon, knowledge)
            .with_design(design)
            .with_software(software);
        match ElementStore::open(&generator.config.database) {
            Ok(store) => generator = generator.with_store(store),
            Err(e) => {
                warn!(error = %e, "Element store unavailable");
                generator.store_error = Some(e.to_string());
            }
        }
        Ok(generator)
    }

    pub fn with_store(mut self, store: ElementStore) -> Self {
        self.store = Some(store);
        self.store_error = None;
        self
    }

    pub fn with_design(mut self, design: DesignVariableStore) -> Self {
        self.design = design;
        self
    }

    pub fn with_software(mut self, software: SoftwareCatalog) -> Self {
        self.software = software;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> Option<&ElementStore> {
        self.store.as_ref()
    }

    pub fn design_store(&self) -> &DesignVariableStore {
        &self.design
    }

    pub fn design_history(&self) -> &SamplingHistory {
        &self.design_history
    }

    pub fn parametric_history(&self) -> &SamplingHistory {
        &self.parametric_history
    }

    /// @acp:summary "Generate a prompt; `None` classifies the request"
    pub fn generate(&mut self, text: &str, requested: Option<GenerationType>) -> GenerationResult {
        self.generate_with_rng(text, requested, &mut rand::rng())
    }

    /// Same as [`Generator::generate`] with a caller-supplied random source
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &mut self,
        text: &str,
        requested: Option<GenerationType>,
        rng: &mut R,
    ) -> GenerationResult {
        let intent = parse(text);
        let generation_type = requested.unwrap_or_else(|| classify(&intent));
        info!(%generation_type, forced = requested.is_some(), "Generating prompt");

        let store_backed = match generation_type {
            GenerationType::Software => return software::generate(&intent, &self.software),
            other => other,
        };

        let Some(store) = self.store.as_ref() else {
            let reason = self.store_error.as_deref().unwrap_or("element store unavailable");
            warn!(%generation_type, reason, "Cannot generate without element store");
            return GenerationResult::failed(
                generation_type,
                PromptError::StoreUnavailable(reason.to_string()),
            );
        };
        let pipeline = Pipeline {
            store,
            config: &self.config,
            lexicon: &self.lexicon,
            knowledge: &self.knowledge,
        };

        let outcome = match store_backed {
            GenerationType::Portrait => portrait::generate(&pipeline, &intent),
            GenerationType::Design => {
                design::generate(&pipeline, &self.design, &intent, &mut self.design_history, rng)
            }
            _ => cross_domain::generate(&pipeline, &intent, &mut self.parametric_history, rng),
        };

        match outcome {
            Ok(result) => {
                debug!(chars = result.prompt.chars().count(), "Prompt generated");
                result
            }
            Err(e) => {
                warn!(error = %e, %generation_type, "Generation failed");
                GenerationResult::failed(generation_type, e)
            }
        }
    }
}

fn load_design(dir: &Path) -> Result<DesignVariableStore> {
    if !dir.is_dir() {
        warn!(dir = %dir.display(), "Variables directory not found, design sampling disabled");
        return Ok(DesignVariableStore::default());
    }
    DesignVariableStore::load_dir(dir)
        .with_context(|| format!("Failed to load design variables from {:?}", dir))
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn generator() -> Generator {
        Generator::new(
            Config::default(),
            Lexicon::builtin().unwrap(),
            KnowledgeBase::builtin().unwrap(),
        )
    }

    #[test]
    fn test_missing_store_reports_error() {
        let mut generator = generator();
        let result = generator.generate("a young woman", None);
        assert_eq!(result.generation_type, GenerationType::Portrait);
        assert!(result.prompt.is_empty());
        assert!(result.metadata.error.as_deref().unwrap().contains("element store unavailable"));
    }

    #[test]
    fn test_software_works_without_store() {
        let mut generator = generator().with_software(SoftwareCatalog::builtin().unwrap());
        let result = generator.generate("write unit tests in python", None);
        assert_eq!(result.generation_type, GenerationType::Software);
        assert!(!result.is_error());
        assert_eq!(result.metadata.framework.as_deref(), Some("pytest"));
    }

    #[test]
    fn test_fill_fields_respects_exact_filters() {
        let store = fixtures::library();
        let config = Config::default();
        let lexicon = Lexicon::builtin().unwrap();
        let knowledge = KnowledgeBase::builtin().unwrap();
        let pipeline = Pipeline {
            store: &store,
            config: &config,
            lexicon: &lexicon,
            knowledge: &knowledge,
        };
        let intent = parse("a young man");
        let mut plan = vec![FieldRequest::new("portrait", "gender")];
        plan[0].filters = vec!["male".into()];
        plan[0].keywords = vec!["male".into()];
        plan[0].fallback_unfiltered = false;

        let mut elements = Vec::new();
        assert_eq!(pipeline.fill_fields(&plan, &intent, &mut elements).unwrap(), 1);
        assert_eq!(elements[0].id, "p_gender_m");
        // a repeated request adds nothing
        assert_eq!(pipeline.fill_fields(&plan, &intent, &mut elements).unwrap(), 0);

        plan[0].filters = vec!["nonbinary".into()];
        let mut elements = Vec::new();
        assert_eq!(pipeline.fill_fields(&plan, &intent, &mut elements).unwrap(), 0);
    }

    #[test]
    fn test_result_json_shape() {
        let mut generator = generator().with_store(fixtures::library());
        let mut rng = StdRng::seed_from_u64(3);
        let result = generator.generate_with_rng("a quiet lake at dusk", None, &mut rng);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["type"], "cross_domain");
        assert!(json["metadata"].get("error").is_none());
        assert!(json["metadata"]["element_count"].as_u64().unwrap() >= 1);
    }
}
