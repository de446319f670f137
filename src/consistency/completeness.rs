//! @acp:module "Completeness Check"
//! @acp:summary "Report requested traits that the composed prompt never mentions"
//! @acp:domain consistency
//! @acp:layer logic

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::intent::rules::{first_match, Field};
use crate::intent::Intent;
use crate::knowledge::KnowledgeBase;

/// A trait the intent asked for but the prompt lacks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingRequirement {
    /// clothing, hairstyle, era, director_style or lighting
    pub aspect: String,
    pub value: String,
    /// Any one of these words would have satisfied the requirement
    pub expected: Vec<String>,
}

/// @acp:summary "Compare intent traits against the composed text"
pub fn check_completeness(
    intent: &Intent,
    prompt: &str,
    knowledge: &KnowledgeBase,
) -> Vec<MissingRequirement> {
    let prompt = prompt.to_lowercase();
    let table = &knowledge.completeness;

    // Lighting always has a value; only check it when the request named one
    let lighting = first_match(Field::Lighting, &intent.raw_lower()).map(|_| intent.lighting.as_str());

    let requested: [(&str, Option<&str>, &HashMap<String, Vec<String>>); 5] = [
        ("clothing", intent.scene.clothing.as_deref(), &table.clothing),
        ("hairstyle", intent.scene.hairstyle.as_deref(), &table.hairstyle),
        ("era", intent.scene.era.as_deref(), &table.era),
        ("director_style", intent.scene.director_style.as_deref(), &table.director_style),
        ("lighting", lighting, &table.lighting),
    ];

    requested
        .into_iter()
        .filter_map(|(aspect, value, words)| {
            let value = value?;
            let expected = words.get(value)?;
            let satisfied = expected.iter().any(|w| prompt.contains(&w.to_lowercase()));
            (!satisfied).then(|| MissingRequirement {
                aspect: aspect.to_string(),
                value: value.to_string(),
                expected: expected.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::parse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_clothing_and_era() {
        let kb = KnowledgeBase::builtin().unwrap();
        let intent = parse("古装汉服女子");
        let missing = check_completeness(&intent, "young woman, soft smile", &kb);
        let aspects: Vec<&str> = missing.iter().map(|m| m.aspect.as_str()).collect();
        assert_eq!(aspects, vec!["clothing", "era"]);
        assert_eq!(missing[0].value, "traditional_chinese");
    }

    #[test]
    fn test_satisfied_requirements() {
        let kb = KnowledgeBase::builtin().unwrap();
        let intent = parse("古装汉服女子");
        assert!(check_completeness(&intent, "woman in flowing Hanfu, ancient palace", &kb).is_empty());
    }

    #[test]
    fn test_default_lighting_not_checked() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert!(check_completeness(&parse("a portrait"), "portrait", &kb).is_empty());

        let missing = check_completeness(&parse("neon portrait"), "portrait", &kb);
        assert_eq!(missing[0].aspect, "lighting");
        assert_eq!(missing[0].value, "neon");
    }
}
