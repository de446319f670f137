//! @acp:module "Consistency"
//! @acp:summary "Detect contradictions between selected elements"
//! @acp:domain consistency
//! @acp:layer logic
//!
//! The rule set is fixed: ethnicity against eye color, ethnicity against
//! hair color, and one element per category. Repairs live in [`resolver`].

pub mod completeness;
pub mod resolver;

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::intent::rules::{first_match, Field};
use crate::intent::Ethnicity;
use crate::knowledge::KnowledgeBase;
use crate::store::Element;

pub use completeness::{check_completeness, MissingRequirement};
pub use resolver::{ConflictResolver, Resolution};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    EyeColorMismatch,
    HairColorMismatch,
    DuplicateCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
        }
    }
}

/// @acp:summary "A detected contradiction between selected elements"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Offending elements; for duplicates, every element of the category in order
    pub element_ids: Vec<String>,
    pub description: String,
    pub suggested_fix: String,
    /// Values the knowledge table allows, in preference order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
}

/// @acp:summary "Rule-based checker over a selected element set"
#[derive(Debug, Clone, Copy)]
pub struct ConsistencyChecker<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> ConsistencyChecker<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    /// Subject ethnicity: the hint wins, else the first ethnicity element that names one
    pub fn subject_ethnicity(&self, elements: &[Element], hint: Option<Ethnicity>) -> Option<Ethnicity> {
        hint.or_else(|| {
            elements
                .iter()
                .filter(|e| self.knowledge.is_ethnicity_category(&e.category_id))
                .find_map(element_ethnicity)
        })
    }

    /// @acp:summary "Run every rule and return the issues found"
    pub fn check(&self, elements: &[Element], ethnicity_hint: Option<Ethnicity>) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();

        if let Some(ethnicity) = self.subject_ethnicity(elements, ethnicity_hint) {
            for element in elements {
                if self.knowledge.is_eye_category(&element.category_id) {
                    issues.extend(self.check_eyes(element, ethnicity));
                } else if self.knowledge.is_hair_color_category(&element.category_id) {
                    issues.extend(self.check_hair(element, ethnicity));
                }
            }
        }
        issues.extend(self.check_duplicates(elements));

        debug!(count = issues.len(), "Consistency check complete");
        issues
    }

    fn check_eyes(&self, element: &Element, ethnicity: Ethnicity) -> Option<ConsistencyIssue> {
        let text = format!("{} {}", element.search_text(), element.name.to_lowercase());
        let bad = self.knowledge.incompatible_eye_colors(ethnicity, &text);
        if bad.is_empty() {
            return None;
        }
        let allowed = self.knowledge.typical_eyes(ethnicity).to_vec();
        Some(ConsistencyIssue {
            kind: IssueKind::EyeColorMismatch,
            severity: Severity::Medium,
            element_ids: vec![element.id.clone()],
            description: format!(
                "Eye color {} is unusual for {} (typical: {})",
                bad.join("/"),
                ethnicity,
                allowed.join(", ")
            ),
            suggested_fix: format!("Replace with {} eyes", allowed.first().map(String::as_str).unwrap_or("typical")),
            allowed,
        })
    }

    fn check_hair(&self, element: &Element, ethnicity: Ethnicity) -> Option<ConsistencyIssue> {
        if self.hair_is_compatible(element, ethnicity) {
            return None;
        }
        let allowed = self.knowledge.typical_hair(ethnicity).to_vec();
        Some(ConsistencyIssue {
            kind: IssueKind::HairColorMismatch,
            severity: Severity::Low,
            element_ids: vec![element.id.clone()],
            description: format!(
                "Hair color of {} is unusual for {} (typical: {})",
                element.label(),
                ethnicity,
                allowed.join(", ")
            ),
            suggested_fix: format!("Replace with {} hair", allowed.first().map(String::as_str).unwrap_or("typical")),
            allowed,
        })
    }

    /// True when the element mentions a typical hair color, or the ethnicity has no table
    pub fn hair_is_compatible(&self, element: &Element, ethnicity: Ethnicity) -> bool {
        let allowed = self.knowledge.typical_hair(ethnicity);
        if allowed.is_empty() {
            return true;
        }
        let text = format!("{} {}", element.search_text(), element.name.to_lowercase());
        allowed.iter().any(|color| text.contains(&color.to_lowercase()))
    }

    /// True when the element names no eye color outside the ethnicity's whitelist
    pub fn eyes_are_compatible(&self, element: &Element, ethnicity: Ethnicity) -> bool {
        let text = format!("{} {}", element.search_text(), element.name.to_lowercase());
        self.knowledge.incompatible_eye_colors(ethnicity, &text).is_empty()
    }

    fn check_duplicates(&self, elements: &[Element]) -> Vec<ConsistencyIssue> {
        let mut order: Vec<&str> = Vec::new();
        let mut by_category: HashMap<&str, Vec<&Element>> = HashMap::new();
        for element in elements {
            let category = element.category_id.as_str();
            if self.knowledge.allows_repeats(category) {
                continue;
            }
            let entry = by_category.entry(category).or_default();
            if entry.is_empty() {
                order.push(category);
            }
            entry.push(element);
        }

        order
            .into_iter()
            .filter_map(|category| {
                let group = by_category.get(category)?;
                if group.len() < 2 {
                    return None;
                }
                Some(ConsistencyIssue {
                    kind: IssueKind::DuplicateCategory,
                    severity: Severity::High,
                    element_ids: group.iter().map(|e| e.id.clone()).collect(),
                    description: format!("Category {} selected {} times", category, group.len()),
                    suggested_fix: format!("Keep only {}", group[0].label()),
                    allowed: Vec::new(),
                })
            })
            .collect()
    }
}

/// Ethnicity named by an element: its name first, then its text through the rule table
fn element_ethnicity(element: &Element) -> Option<Ethnicity> {
    element.name.parse().ok().or_else(|| {
        let text = format!("{} {}", element.name.to_lowercase(), element.search_text());
        first_match(Field::Ethnicity, &text).and_then(|rule| rule.value.parse().ok())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eye(id: &str, template: &str) -> Element {
        Element::new(id, "portrait", "eye_types", id, template).with_quality(8.0)
    }

    #[test]
    fn test_east_asian_blue_eyes_flagged() {
        let kb = KnowledgeBase::builtin().unwrap();
        let checker = ConsistencyChecker::new(&kb);
        let elements = vec![eye("e1", "striking blue eyes")];
        let issues = checker.check(&elements, Some(Ethnicity::EastAsian));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::EyeColorMismatch);
        assert_eq!(issues[0].severity, Severity::Medium);
        assert_eq!(issues[0].allowed, vec!["black", "dark brown", "brown"]);
        assert!(issues[0].description.contains("blue"));
    }

    #[test]
    fn test_ethnicity_from_element() {
        let kb = KnowledgeBase::builtin().unwrap();
        let checker = ConsistencyChecker::new(&kb);
        let elements = vec![
            Element::new("eth", "portrait", "ethnicity", "East_Asian", "East Asian woman"),
            eye("e1", "green eyes"),
        ];
        assert_eq!(
            checker.subject_ethnicity(&elements, None),
            Some(Ethnicity::EastAsian)
        );
        assert_eq!(checker.check(&elements, None).len(), 1);

        let by_text = vec![Element::new("eth", "portrait", "ethnicity", "asian_1", "Chinese features")];
        assert_eq!(checker.subject_ethnicity(&by_text, None), Some(Ethnicity::EastAsian));
    }

    #[test]
    fn test_no_ethnicity_no_attribute_issues() {
        let kb = KnowledgeBase::builtin().unwrap();
        let checker = ConsistencyChecker::new(&kb);
        assert!(checker.check(&[eye("e1", "violet eyes")], None).is_empty());
    }

    #[test]
    fn test_hair_mismatch_is_low() {
        let kb = KnowledgeBase::builtin().unwrap();
        let checker = ConsistencyChecker::new(&kb);
        let elements = vec![Element::new("h", "portrait", "hair_colors", "platinum", "platinum blonde hair")];
        let issues = checker.check(&elements, Some(Ethnicity::African));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Low);

        let fine = vec![Element::new("h", "portrait", "hair_colors", "jet", "glossy black hair")];
        assert!(checker.check(&fine, Some(Ethnicity::African)).is_empty());
    }

    #[test]
    fn test_duplicates_except_co_occurring() {
        let kb = KnowledgeBase::builtin().unwrap();
        let checker = ConsistencyChecker::new(&kb);
        let elements = vec![
            Element::new("p1", "common", "poses", "p1", "standing"),
            Element::new("l1", "common", "lighting_techniques", "l1", "rim light"),
            Element::new("p2", "common", "poses", "p2", "sitting"),
            Element::new("l2", "common", "lighting_techniques", "l2", "soft box"),
        ];
        let issues = checker.check(&elements, None);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::DuplicateCategory);
        assert_eq!(issues[0].severity, Severity::High);
        assert_eq!(issues[0].element_ids, vec!["p1", "p2"]);
    }
}
