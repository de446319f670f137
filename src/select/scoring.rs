//! @acp:module "Element Scoring"
//! @acp:summary "Linear keyword/quality score with semantic adjustments"
//! @acp:domain select
//! @acp:layer logic

use crate::config::SelectionConfig;
use crate::intent::Intent;
use crate::store::Element;

/// Breakdown of one element's score
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreParts {
    pub keyword: f64,
    pub quality: f64,
    pub adjustment: f64,
}

impl ScoreParts {
    /// Clamped total in [0, 100]
    pub fn total(&self) -> f64 {
        (self.keyword + self.quality + self.adjustment).clamp(0.0, 100.0)
    }
}

/// Number of user keywords found in the element's keywords, template or name
pub fn matched_keywords(element: &Element, keywords: &[String]) -> usize {
    let haystack = haystack(element);
    keywords
        .iter()
        .filter(|k| {
            let k = k.trim().to_lowercase();
            !k.is_empty() && haystack.contains(&k)
        })
        .count()
}

fn haystack(element: &Element) -> String {
    format!("{} {}", element.search_text(), element.name.to_lowercase())
}

/// Compute the score parts for an element
///
/// Keyword share and quality are linear. The adjustment subtracts the
/// refined penalty when the request asks for a plump trait and the element
/// reads refined, and adds the full-match bonus when every keyword matched.
pub fn score_parts(
    element: &Element,
    keywords: &[String],
    intent: &Intent,
    config: &SelectionConfig,
) -> ScoreParts {
    let matched = matched_keywords(element, keywords);
    let keyword = if keywords.is_empty() {
        0.0
    } else {
        matched as f64 / keywords.len() as f64 * config.keyword_weight
    };
    let quality = element.quality.clamp(0.0, 10.0) / 10.0 * config.quality_weight;

    let mut adjustment = 0.0;
    if wants_plump(keywords, intent, config) && reads_refined(element, config) {
        adjustment -= config.refined_penalty;
    }
    if !keywords.is_empty() && matched == keywords.len() {
        adjustment += config.full_match_bonus;
    }

    ScoreParts {
        keyword,
        quality,
        adjustment,
    }
}

fn wants_plump(keywords: &[String], intent: &Intent, config: &SelectionConfig) -> bool {
    let raw = intent.raw_lower();
    config.plump_cues.iter().any(|cue| {
        let cue = cue.to_lowercase();
        raw.contains(&cue) || keywords.iter().any(|k| k.to_lowercase().contains(&cue))
    })
}

fn reads_refined(element: &Element, config: &SelectionConfig) -> bool {
    let text = haystack(element);
    config
        .refined_cues
        .iter()
        .any(|cue| text.contains(&cue.to_lowercase()))
}
