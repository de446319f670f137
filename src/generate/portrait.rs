//! @acp:module "Portrait Path"
//! @acp:summary "Subject-focused generation with style elements and consistency repair"
//! @acp:domain generate
//! @acp:layer service

use tracing::debug;

use super::{domains_of, GenerationMetadata, GenerationResult, Pipeline};
use crate::classify::{portrait_plan, style_keywords, GenerationType};
use crate::compose::Composer;
use crate::consistency::check_completeness;
use crate::error::Result;
use crate::intent::Intent;

/// @acp:summary "Select, repair and compose a portrait prompt"
pub(crate) fn generate(pipeline: &Pipeline<'_>, intent: &Intent) -> Result<GenerationResult> {
    let config = &pipeline.config.composition;
    let mut elements = Vec::new();
    pipeline.fill_fields(&portrait_plan(intent, pipeline.knowledge), intent, &mut elements)?;

    let keywords = style_keywords(intent, pipeline.knowledge);
    let style = pipeline.retriever().search_style_elements(
        &keywords,
        pipeline.knowledge,
        config.style_search_limit,
        config.style_element_limit,
    )?;
    let mut added = 0;
    for element in style {
        if !elements.iter().any(|e| e.id == element.id) {
            elements.push(element);
            added += 1;
        }
    }
    debug!(keywords = keywords.len(), added, "Added style elements");

    let (elements, issues, fixes) = pipeline.check_and_resolve(elements, intent)?;

    let prompt = Composer::new(pipeline.lexicon, config).compose(&elements, config.mode);
    let missing = check_completeness(intent, &prompt, pipeline.knowledge);

    Ok(GenerationResult {
        prompt,
        generation_type: GenerationType::Portrait,
        metadata: GenerationMetadata {
            domains_used: Some(domains_of(&elements)),
            element_count: Some(elements.len()),
            issues_fixed: Some(issues),
            fixes,
            elements: elements.iter().map(|e| e.id.clone()).collect(),
            missing_requirements: missing,
            ..GenerationMetadata::default()
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::Lexicon;
    use crate::config::Config;
    use crate::generate::fixtures;
    use crate::intent::parse;
    use crate::knowledge::KnowledgeBase;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_east_asian_portrait_uses_typical_traits() {
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

        let result = generate(&pipeline, &parse("年轻的东亚女性")).unwrap();
        let ids = &result.metadata.elements;
        assert_eq!(&ids[..3], ["p_gender_f", "p_eth_ea", "p_age_ya"]);
        assert!(ids.contains(&"p_eyes_almond".to_string()));
        assert!(ids.contains(&"p_hair_black".to_string()));
        assert!(!ids.contains(&"p_eyes_blue".to_string()));
        assert!(result.prompt.starts_with("a beautiful woman, East Asian features"));
        assert!(!result.prompt.contains("blue eyes"));
        assert_eq!(result.metadata.issues_fixed, Some(0));
        assert_eq!(result.metadata.element_count, Some(ids.len()));
    }
}
