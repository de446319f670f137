//! @acp:module "Element Selector"
//! @acp:summary "Score candidates and pick the best one per field"
//! @acp:domain select
//! @acp:layer logic

pub mod scoring;

use tracing::debug;

use crate::config::SelectionConfig;
use crate::intent::Intent;
use crate::store::Element;

pub use scoring::{matched_keywords, score_parts, ScoreParts};

/// @acp:summary "Field-level selection with an acceptance gate"
#[derive(Debug, Clone, Copy)]
pub struct ElementSelector<'a> {
    config: &'a SelectionConfig,
}

impl<'a> ElementSelector<'a> {
    pub fn new(config: &'a SelectionConfig) -> Self {
        Self { config }
    }

    /// Score in [0, 100]
    pub fn score(&self, element: &Element, keywords: &[String], intent: &Intent, field: &str) -> f64 {
        let parts = score_parts(element, keywords, intent, self.config);
        let total = parts.total();
        debug!(
            field,
            element_id = %element.id,
            keyword = parts.keyword,
            quality = parts.quality,
            adjustment = parts.adjustment,
            total,
            "Scored candidate"
        );
        total
    }

    /// @acp:summary "Highest-scoring candidate; earlier candidates win ties"
    ///
    /// Only a positive score can win, so an empty list or one where every
    /// candidate scores zero returns `(None, 0.0)`.
    pub fn select_best<'c>(
        &self,
        candidates: &'c [Element],
        keywords: &[String],
        intent: &Intent,
        field: &str,
    ) -> (Option<&'c Element>, f64) {
        let mut best: Option<&Element> = None;
        let mut best_score = 0.0;
        for candidate in candidates {
            let score = self.score(candidate, keywords, intent, field);
            if score > best_score {
                best = Some(candidate);
                best_score = score;
            }
        }
        (best, best_score)
    }

    /// Whether a score clears the acceptance gate
    pub fn accepts(&self, score: f64) -> bool {
        score >= self.config.min_score
    }

    /// Best candidate if it clears the gate, cloned for the caller's element list
    pub fn pick(
        &self,
        candidates: &[Element],
        keywords: &[String],
        intent: &Intent,
        field: &str,
    ) -> Option<Element> {
        let (best, score) = self.select_best(candidates, keywords, intent, field);
        match best {
            Some(element) if self.accepts(score) => {
                debug!(field, element_id = %element.id, score, "Selected element");
                Some(element.clone())
            }
            Some(element) => {
                debug!(field, element_id = %element.id, score, "Best candidate below threshold");
                None
            }
            None => None,
        }
    }
}
