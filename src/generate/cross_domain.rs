//! @acp:module "Cross-Domain Path"
//! @acp:summary "Multi-domain generation with variable sampling and scene enhancement"
//! @acp:domain generate
//! @acp:layer service

use rand::Rng;
use tracing::debug;

use super::{domains_of, GenerationMetadata, GenerationResult, Pipeline};
use crate::classify::{cross_domain_plan, portrait_plan, required_domains, GenerationType};
use crate::compose::Composer;
use crate::consistency::check_completeness;
use crate::error::Result;
use crate::intent::Intent;
use crate::sampler::{unresolved_placeholders, ParametricSampler, SamplingHistory, StyleContext};
use crate::store::Element;

/// @acp:summary "Query every required domain, repair, sample variables and compose"
pub(crate) fn generate<R: Rng + ?Sized>(
    pipeline: &Pipeline<'_>,
    intent: &Intent,
    history: &mut SamplingHistory,
    rng: &mut R,
) -> Result<GenerationResult> {
    let knowledge = pipeline.knowledge;
    let config = &pipeline.config.composition;

    let mut elements = Vec::new();
    pipeline.fill_fields(&cross_domain_plan(intent, knowledge), intent, &mut elements)?;
    if elements.len() < config.min_elements {
        let added = pipeline.fill_fields(&portrait_plan(intent, knowledge), intent, &mut elements)?;
        debug!(added, min = config.min_elements, "Supplemented from portrait plan");
    }

    // Replacements may declare variables too, so sampling runs on the repaired list
    let (elements, issues, fixes) = pipeline.check_and_resolve(elements, intent)?;
    let elements = sample_variables(pipeline, elements, intent, history, rng)?;

    let composer = Composer::new(pipeline.lexicon, config);
    let mut composition = composer.composition();
    let scenes = pipeline.lexicon.scene_descriptions(&intent.raw_input);
    for scene in &scenes {
        composition.push(scene);
    }
    composer.extend(&mut composition, &elements, config.mode);
    let prompt = composition.join(&config.separator);

    let mut domains: Vec<String> = required_domains(intent).iter().map(|d| d.to_string()).collect();
    for domain in domains_of(&elements) {
        if !domains.contains(&domain) {
            domains.push(domain);
        }
    }

    Ok(GenerationResult {
        metadata: GenerationMetadata {
            domains_used: Some(domains),
            element_count: Some(elements.len()),
            issues_fixed: Some(issues),
            fixes,
            elements: elements.iter().map(|e| e.id.clone()).collect(),
            enhanced: Some(!scenes.is_empty()),
            missing_requirements: check_completeness(intent, &prompt, knowledge),
            unresolved_placeholders: unresolved_placeholders(&prompt),
            ..GenerationMetadata::default()
        },
        prompt,
        generation_type: GenerationType::CrossDomain,
    })
}

/// Substitute sampled values into every element that declares variables
fn sample_variables<R: Rng + ?Sized>(
    pipeline: &Pipeline<'_>,
    elements: Vec<Element>,
    intent: &Intent,
    history: &mut SamplingHistory,
    rng: &mut R,
) -> Result<Vec<Element>> {
    let sampler = ParametricSampler::new(pipeline.config.sampling.enum_recent_window);
    let context = StyleContext::from_intent(intent);

    elements
        .into_iter()
        .map(|mut element| {
            let variables = pipeline.store.variables(&element.id)?;
            if !variables.is_empty() {
                let sampled = sampler.sample_element(&element, &variables, &context, history, rng);
                element.template = sampled.template;
            }
            Ok(element)
        })
        .collect()
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
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_wax_figure_action_request() {
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
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(11);

        let intent = parse("龙珠动漫的蜡像3D感悟空打出龟派气功");
        let result = generate(&pipeline, &intent, &mut history, &mut rng).unwrap();

        assert_eq!(
            result.metadata.domains_used.as_deref().map(|d| &d[..3]),
            Some(&["portrait".to_string(), "video".to_string(), "art".to_string()][..])
        );
        assert_eq!(result.metadata.enhanced, Some(true));
        assert!(result.prompt.contains("Son Goku"));
        assert!(result.prompt.contains("wax figure 3d render"));
        assert!(!result.prompt.contains("{material}"));
        assert!(result.metadata.unresolved_placeholders.is_empty());
        assert!(result.metadata.elements.contains(&"v_scene".to_string()));

        let recorded: Vec<&str> = history.records().map(|r| r.key.as_str()).collect();
        assert_eq!(recorded, vec!["a_style.material"]);
    }

    #[test]
    fn test_small_result_is_supplemented() {
        let store = fixtures::library();
        let mut config = Config::default();
        config.composition.min_elements = 50;
        let lexicon = Lexicon::builtin().unwrap();
        let knowledge = KnowledgeBase::builtin().unwrap();
        let pipeline = Pipeline {
            store: &store,
            config: &config,
            lexicon: &lexicon,
            knowledge: &knowledge,
        };
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(5);

        let result = generate(&pipeline, &parse("a quiet lake"), &mut history, &mut rng).unwrap();
        assert_eq!(result.metadata.enhanced, Some(false));
        assert!(result.metadata.elements.contains(&"p_skin".to_string()));
        let domains = result.metadata.domains_used.unwrap();
        assert_eq!(domains, vec!["common", "portrait"]);
    }
}
