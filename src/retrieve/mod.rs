//! @acp:module "Candidate Retriever"
//! @acp:summary "Fetch candidate elements per domain/category with optional value narrowing"
//! @acp:domain retrieve
//! @acp:layer service
//!
//! An empty result is never an error: callers skip the field.

use tracing::debug;

use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::store::{Element, ElementStore};

/// Anything that can list candidates for a field
///
/// The resolver depends on this rather than on the store so that repairs
/// can be exercised against fixed element lists.
pub trait CandidateSource {
    /// Candidates ordered by quality descending, narrowed by `value_filter` if given
    fn candidates(
        &self,
        domain: &str,
        category: &str,
        value_filter: Option<&str>,
    ) -> Result<Vec<Element>>;
}

/// @acp:summary "Store-backed candidate retrieval"
#[derive(Debug, Clone, Copy)]
pub struct CandidateRetriever<'a> {
    store: &'a ElementStore,
}

impl<'a> CandidateRetriever<'a> {
    pub fn new(store: &'a ElementStore) -> Self {
        Self { store }
    }

    pub fn get_candidates(
        &self,
        domain: &str,
        category: &str,
        value_filter: Option<&str>,
    ) -> Result<Vec<Element>> {
        let all = self
            .store
            .search_by_domain(domain, Some(category), None, None)?;
        let narrowed = match value_filter {
            Some(filter) => narrow_by_value(all, filter),
            None => all,
        };
        debug!(
            domain,
            category,
            filter = value_filter.unwrap_or(""),
            count = narrowed.len(),
            "Retrieved candidates"
        );
        Ok(narrowed)
    }

    /// @acp:summary "Style elements by text search, ranked by relevance x quality"
    ///
    /// Subject-attribute categories are excluded so style words never
    /// override who is depicted.
    pub fn search_style_elements(
        &self,
        keywords: &[String],
        knowledge: &KnowledgeBase,
        search_limit: usize,
        keep: usize,
    ) -> Result<Vec<Element>> {
        let found = self.store.search_by_text(keywords, search_limit)?;
        Ok(rank_style_elements(found, keywords, knowledge, keep))
    }
}

impl CandidateSource for CandidateRetriever<'_> {
    fn candidates(
        &self,
        domain: &str,
        category: &str,
        value_filter: Option<&str>,
    ) -> Result<Vec<Element>> {
        self.get_candidates(domain, category, value_filter)
    }
}

/// Fixed in-memory candidates, for callers that already hold the elements
impl CandidateSource for [Element] {
    fn candidates(
        &self,
        domain: &str,
        category: &str,
        value_filter: Option<&str>,
    ) -> Result<Vec<Element>> {
        let mut all: Vec<Element> = self
            .iter()
            .filter(|e| e.domain_id == domain && e.category_id == category)
            .cloned()
            .collect();
        all.sort_by(|a, b| {
            b.quality
                .partial_cmp(&a.quality)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(match value_filter {
            Some(filter) => narrow_by_value(all, filter),
            None => all,
        })
    }
}

/// Narrow quality-ordered candidates by a value filter
///
/// Substring match on template + keywords first. A single hit, or a hit
/// list led by an element whose name equals the filter, is returned as is.
/// Otherwise the list is ambiguous (e.g. `male` also hits `female`) and
/// exact name matches win; if there are none the substring hits stand.
pub fn narrow_by_value(candidates: Vec<Element>, filter: &str) -> Vec<Element> {
    let needle = filter.trim().to_lowercase();
    if needle.is_empty() {
        return candidates;
    }

    let hits: Vec<Element> = candidates
        .into_iter()
        .filter(|e| e.search_text().contains(&needle) || e.name.to_lowercase() == needle)
        .collect();

    let leads_with_exact = hits
        .first()
        .map(|e| e.name.to_lowercase() == needle)
        .unwrap_or(false);
    if hits.len() <= 1 || leads_with_exact {
        return hits;
    }

    let exact: Vec<Element> = hits
        .iter()
        .filter(|e| e.name.to_lowercase() == needle)
        .cloned()
        .collect();
    if exact.is_empty() {
        hits
    } else {
        exact
    }
}

/// Fraction of keywords found in the element's template or keywords
pub fn relevance(element: &Element, keywords: &[String]) -> f64 {
    if keywords.is_empty() {
        return 0.5;
    }
    let text = element.search_text();
    let matched = keywords
        .iter()
        .filter(|k| text.contains(&k.to_lowercase()))
        .count();
    matched as f64 / keywords.len() as f64
}

fn rank_style_elements(
    found: Vec<Element>,
    keywords: &[String],
    knowledge: &KnowledgeBase,
    keep: usize,
) -> Vec<Element> {
    let mut scored: Vec<(f64, Element)> = found
        .into_iter()
        .filter(|e| !knowledge.is_subject_attribute(&e.category_id))
        .map(|e| (relevance(&e, keywords) * e.quality, e))
        .collect();
    // Stable: equal scores keep store order
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(keep).map(|(_, e)| e).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gender(id: &str, name: &str, template: &str, quality: f64) -> Element {
        Element::new(id, "portrait", "gender", name, template).with_quality(quality)
    }

    fn ids(elements: &[Element]) -> Vec<&str> {
        elements.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_ambiguous_filter_prefers_exact_name() {
        let candidates = vec![
            gender("f", "female", "young female model", 9.0),
            gender("m", "male", "handsome male model", 7.0),
        ];
        assert_eq!(ids(&narrow_by_value(candidates.clone(), "male")), vec!["m"]);
        assert_eq!(ids(&narrow_by_value(candidates, "Female")), vec!["f"]);
    }

    #[test]
    fn test_substring_hits_kept_without_exact_name() {
        let candidates = vec![
            Element::new("a", "portrait", "eye_types", "large_almond", "large almond eyes")
                .with_quality(9.0),
            Element::new("b", "portrait", "eye_types", "soft_almond", "soft almond eyes")
                .with_quality(8.0),
            Element::new("c", "portrait", "eye_types", "round", "round eyes").with_quality(7.0),
        ];
        assert_eq!(ids(&narrow_by_value(candidates, "almond")), vec!["a", "b"]);
    }

    #[test]
    fn test_filter_with_no_hits_is_empty() {
        let candidates = vec![gender("f", "female", "young female model", 9.0)];
        assert!(narrow_by_value(candidates, "robot").is_empty());
    }

    #[test]
    fn test_store_candidates_ordered_by_quality() {
        let mut store = ElementStore::in_memory().unwrap();
        store.add_element(&gender("a", "female", "woman", 5.0)).unwrap();
        store.add_element(&gender("b", "female_2", "lady", 8.0)).unwrap();
        let retriever = CandidateRetriever::new(&store);
        assert_eq!(
            ids(&retriever.get_candidates("portrait", "gender", None).unwrap()),
            vec!["b", "a"]
        );
        assert!(retriever
            .get_candidates("portrait", "poses", None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_slice_source_matches_store_semantics() {
        let elements = vec![
            gender("a", "female", "woman", 5.0),
            gender("b", "male", "man", 8.0),
            Element::new("c", "common", "poses", "pose", "natural pose"),
        ];
        let found = elements[..].candidates("portrait", "gender", None).unwrap();
        assert_eq!(ids(&found), vec!["b", "a"]);
    }

    #[test]
    fn test_style_search_excludes_subject_attributes() {
        let knowledge = KnowledgeBase::builtin().unwrap();
        let mut store = ElementStore::in_memory().unwrap();
        store
            .add_element(
                &Element::new("l1", "common", "lighting_techniques", "neon", "neon rim glow")
                    .with_quality(6.0),
            )
            .unwrap();
        store
            .add_element(
                &Element::new("l2", "common", "lighting_techniques", "soft", "soft neon wash")
                    .with_quality(9.0),
            )
            .unwrap();
        store
            .add_element(
                &Element::new("h1", "portrait", "hair_colors", "neon", "neon pink hair")
                    .with_quality(10.0),
            )
            .unwrap();

        let keywords = vec!["neon".to_string(), "glow".to_string()];
        let found = CandidateRetriever::new(&store)
            .search_style_elements(&keywords, &knowledge, 30, 10)
            .unwrap();
        // l1: 1.0 * 6 = 6, l2: 0.5 * 9 = 4.5
        assert_eq!(ids(&found), vec!["l1", "l2"]);
    }
}
