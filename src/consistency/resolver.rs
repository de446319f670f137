//! @acp:module "Conflict Resolver"
//! @acp:summary "Deterministic repairs for consistency issues"
//! @acp:domain consistency
//! @acp:layer logic
//!
//! Attribute mismatches are replaced in place by a compatible candidate,
//! or dropped when none exists. Duplicates keep the first occurrence.
//! A second check over the result reports nothing.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ConsistencyChecker, ConsistencyIssue, IssueKind};
use crate::error::Result;
use crate::intent::Ethnicity;
use crate::knowledge::KnowledgeBase;
use crate::retrieve::CandidateSource;
use crate::store::Element;

/// Repaired element list plus a human-readable line per fix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub elements: Vec<Element>,
    pub fixes: Vec<String>,
}

/// @acp:summary "Applies fixes for issues reported by the checker"
#[derive(Debug, Clone, Copy)]
pub struct ConflictResolver<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// @acp:summary "Repair the element list for the given issues"
    pub fn resolve<S>(
        &self,
        elements: Vec<Element>,
        issues: &[ConsistencyIssue],
        source: &S,
        ethnicity_hint: Option<Ethnicity>,
    ) -> Result<Resolution>
    where
        S: CandidateSource + ?Sized,
    {
        let checker = ConsistencyChecker::new(self.knowledge);
        let ethnicity = checker.subject_ethnicity(&elements, ethnicity_hint);
        // Replacements change ids, so duplicate groups are located by their original category
        let categories: HashMap<String, String> = elements
            .iter()
            .map(|e| (e.id.clone(), e.category_id.clone()))
            .collect();
        let mut elements = elements;
        let mut fixes = Vec::new();

        for issue in issues {
            match issue.kind {
                IssueKind::EyeColorMismatch | IssueKind::HairColorMismatch => {
                    let Some(ethnicity) = ethnicity else { continue };
                    if let Some(fix) = self.replace_attribute(&mut elements, issue, source, ethnicity, &checker)? {
                        fixes.push(fix);
                    }
                }
                IssueKind::DuplicateCategory => {
                    let category = issue.element_ids.first().and_then(|id| categories.get(id));
                    if let Some(fix) = category.and_then(|c| drop_duplicates(&mut elements, c)) {
                        fixes.push(fix);
                    }
                }
            }
        }

        if !fixes.is_empty() {
            info!(count = fixes.len(), "Resolved consistency issues");
        }
        Ok(Resolution { elements, fixes })
    }

    fn replace_attribute<S>(
        &self,
        elements: &mut Vec<Element>,
        issue: &ConsistencyIssue,
        source: &S,
        ethnicity: Ethnicity,
        checker: &ConsistencyChecker<'_>,
    ) -> Result<Option<String>>
    where
        S: CandidateSource + ?Sized,
    {
        let Some(target_id) = issue.element_ids.first() else {
            return Ok(None);
        };
        let Some(position) = elements.iter().position(|e| &e.id == target_id) else {
            return Ok(None);
        };

        let offending = &elements[position];
        let compatible = |candidate: &Element| {
            candidate.id != offending.id
                && match issue.kind {
                    IssueKind::EyeColorMismatch => checker.eyes_are_compatible(candidate, ethnicity),
                    _ => checker.hair_is_compatible(candidate, ethnicity),
                }
        };

        let mut filters: Vec<Option<&str>> = issue.allowed.iter().map(|v| Some(v.as_str())).collect();
        if issue.kind == IssueKind::EyeColorMismatch {
            if let Some(shape) = self.knowledge.preferred_eye_shape.get(&ethnicity) {
                filters.push(Some(shape.as_str()));
            }
        }
        filters.push(None);

        let mut replacement = None;
        for filter in filters {
            let found = source.candidates(&offending.domain_id, &offending.category_id, filter)?;
            if let Some(candidate) = found.into_iter().find(|c| compatible(c)) {
                debug!(filter = filter.unwrap_or(""), candidate = %candidate.id, "Found replacement");
                replacement = Some(candidate);
                break;
            }
        }

        let old_label = offending.label().to_string();
        Ok(Some(match replacement {
            Some(new) => {
                let fix = format!(
                    "Replaced {} with {} ({})",
                    old_label,
                    new.label(),
                    issue.description
                );
                elements[position] = new;
                fix
            }
            None => {
                elements.remove(position);
                format!("Removed {} ({}); no compatible replacement", old_label, issue.description)
            }
        }))
    }
}

fn drop_duplicates(elements: &mut Vec<Element>, category: &str) -> Option<String> {
    let mut kept = false;
    let mut removed: Vec<String> = Vec::new();
    elements.retain(|e| {
        if e.category_id != category {
            return true;
        }
        if !kept {
            kept = true;
            return true;
        }
        removed.push(e.label().to_string());
        false
    });

    if removed.is_empty() {
        None
    } else {
        Some(format!(
            "Removed duplicate {} element(s): {}",
            category,
            removed.join(", ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eye(id: &str, name: &str, template: &str, quality: f64) -> Element {
        Element::new(id, "portrait", "eye_types", name, template).with_quality(quality)
    }

    fn library() -> Vec<Element> {
        vec![
            eye("blue", "blue_eyes", "bright blue eyes", 9.5),
            eye("green", "green_eyes", "emerald green eyes", 9.0),
            eye("almond", "almond", "almond shaped eyes", 7.0),
            eye("dark", "dark_brown", "deep dark brown eyes", 8.0),
            Element::new("p1", "common", "poses", "p1", "standing"),
            Element::new("p2", "common", "poses", "p2", "sitting"),
        ]
    }

    fn repair(elements: Vec<Element>, source: &[Element], hint: Option<Ethnicity>) -> Resolution {
        let kb = KnowledgeBase::builtin().unwrap();
        let issues = ConsistencyChecker::new(&kb).check(&elements, hint);
        ConflictResolver::new(&kb)
            .resolve(elements, &issues, source, hint)
            .unwrap()
    }

    #[test]
    fn test_eye_mismatch_replaced_in_place() {
        let lib = library();
        let selected = vec![lib[4].clone(), lib[0].clone()];
        let result = repair(selected, &lib, Some(Ethnicity::EastAsian));
        let ids: Vec<&str> = result.elements.iter().map(|e| e.id.as_str()).collect();
        // "dark brown" is the first allowed value that retrieves anything
        assert_eq!(ids, vec!["p1", "dark"]);
        assert_eq!(result.fixes.len(), 1);
        assert!(result.fixes[0].starts_with("Replaced blue_eyes with dark_brown"));
    }

    #[test]
    fn test_unresolvable_mismatch_drops_element() {
        let lib = vec![eye("blue", "blue_eyes", "bright blue eyes", 9.5)];
        let result = repair(lib.clone(), &lib, Some(Ethnicity::EastAsian));
        assert!(result.elements.is_empty());
        assert!(result.fixes[0].contains("no compatible replacement"));
    }

    #[test]
    fn test_duplicates_keep_first() {
        let lib = library();
        let selected = vec![lib[5].clone(), lib[2].clone(), lib[4].clone()];
        let result = repair(selected, &lib, None);
        let ids: Vec<&str> = result.elements.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "almond"]);
    }

    #[test]
    fn test_second_pass_is_clean() {
        let kb = KnowledgeBase::builtin().unwrap();
        let lib = library();
        let selected = vec![lib[0].clone(), lib[1].clone(), lib[4].clone(), lib[5].clone()];
        let hint = Some(Ethnicity::EastAsian);

        let first = repair(selected, &lib, hint);
        let checker = ConsistencyChecker::new(&kb);
        assert!(checker.check(&first.elements, hint).is_empty());

        let second = repair(first.elements.clone(), &lib, hint);
        assert!(second.fixes.is_empty());
        assert_eq!(second.elements, first.elements);
        for element in &second.elements {
            let text = element.template.to_lowercase();
            assert!(!text.contains("green") && !text.contains("blue") && !text.contains("violet"));
        }
    }
}
