//! @acp:module "Design Path"
//! @acp:summary "Content elements plus sampled design variables plus technical elements"
//! @acp:domain generate
//! @acp:layer service
//!
//! Prompt order is fixed: content, design descriptions, technical.

use rand::Rng;
use tracing::{debug, warn};

use super::{domains_of, GenerationMetadata, GenerationResult, Pipeline};
use crate::classify::{cross_domain_plan, technical_plan, GenerationType, ART, PORTRAIT, VIDEO};
use crate::compose::Composer;
use crate::design::{DesignCategory, DesignVariableStore};
use crate::error::Result;
use crate::intent::Intent;
use crate::sampler::{DesignSampler, SamplingHistory};

/// Domains whose elements describe what is depicted
const CONTENT_DOMAINS: [&str; 3] = [PORTRAIT, VIDEO, ART];

/// @acp:summary "Bridge element content with YAML design variables"
pub(crate) fn generate<R: Rng + ?Sized>(
    pipeline: &Pipeline<'_>,
    design: &DesignVariableStore,
    intent: &Intent,
    history: &mut SamplingHistory,
    rng: &mut R,
) -> Result<GenerationResult> {
    let config = &pipeline.config.composition;

    let content_plan: Vec<_> = cross_domain_plan(intent, pipeline.knowledge)
        .into_iter()
        .filter(|r| CONTENT_DOMAINS.contains(&r.domain.as_str()))
        .collect();
    let mut content = Vec::new();
    pipeline.fill_fields(&content_plan, intent, &mut content)?;
    let (content, issues, fixes) = pipeline.check_and_resolve(content, intent)?;

    let mut technical = Vec::new();
    pipeline.fill_fields(&technical_plan(intent), intent, &mut technical)?;
    technical.retain(|t| !content.iter().any(|c| c.id == t.id));

    let selection = DesignSampler::new(pipeline.config.sampling.design_recent_window).sample(
        design,
        intent.design.style.as_deref(),
        &DesignCategory::ALL,
        history,
        rng,
    );
    if selection.is_none() {
        warn!("No design variables loaded, composing without design descriptions");
    }

    let composer = Composer::new(pipeline.lexicon, config);
    let mut composition = composer.composition();
    composer.extend(&mut composition, &content, config.mode);
    if let Some(selection) = &selection {
        for line in selection.description_lines() {
            composition.push(line);
        }
    }
    composer.extend(&mut composition, &technical, config.mode);
    let prompt = composition.join(&config.separator);
    debug!(content = content.len(), technical = technical.len(), "Composed design prompt");

    let elements: Vec<_> = content.iter().chain(technical.iter()).cloned().collect();
    Ok(GenerationResult {
        prompt,
        generation_type: GenerationType::Design,
        metadata: GenerationMetadata {
            domains_used: Some(domains_of(&elements)),
            element_count: Some(elements.len()),
            issues_fixed: Some(issues),
            fixes,
            elements: elements.iter().map(|e| e.id.clone()).collect(),
            design_style: selection.as_ref().map(|s| s.style_used.clone()),
            design_selection: selection,
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
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const COLORS: &str = r##"
温馨可爱:
  珊瑚粉色系:
    variants:
      - name: 珊瑚粉
        hex: "#FF7F7F"
  薄荷绿色系:
    hex: "#98E4C9"
"##;

    const BORDERS: &str = r#"
温馨可爱:
  大圆角:
    radius: 24px
"#;

    #[test]
    fn test_design_prompt_order() {
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
        let mut design = DesignVariableStore::default();
        design.merge_yaml(DesignCategory::Colors, COLORS).unwrap();
        design.merge_yaml(DesignCategory::Borders, BORDERS).unwrap();
        let mut history = SamplingHistory::default();
        let mut rng = StdRng::seed_from_u64(8);

        let intent = parse("温馨可爱的女孩海报");
        let result = generate(&pipeline, &design, &intent, &mut history, &mut rng).unwrap();

        assert_eq!(result.metadata.design_style.as_deref(), Some("温馨可爱"));
        let prompt = &result.prompt;
        let content = prompt.find("a beautiful woman").unwrap();
        let palette = prompt.find("Color palette: ").unwrap();
        let border = prompt.find("Border style: 大圆角").unwrap();
        let technical = prompt.find("shallow depth of field").unwrap();
        assert!(content < palette && palette < border && border < technical);

        let ids = &result.metadata.elements;
        assert!(ids.contains(&"c_light".to_string()));
        assert!(!ids.contains(&"c_quality".to_string()));
    }
}
