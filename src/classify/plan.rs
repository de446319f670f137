//! @acp:module "Query Plan"
//! @acp:summary "Per-domain category lists and per-field retrieval requests"
//! @acp:domain classify
//! @acp:layer logic

use serde::Serialize;

use super::{required_domains, COMMON, PORTRAIT};
use crate::intent::Intent;
use crate::knowledge::KnowledgeBase;

/// One field to fill: where to look, how to narrow, what to score against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRequest {
    pub domain: String,
    pub category: String,
    /// Value filters tried in order; the first that retrieves anything wins
    pub filters: Vec<String>,
    /// Retrieve unfiltered when every filter comes back empty
    pub fallback_unfiltered: bool,
    pub keywords: Vec<String>,
}

impl FieldRequest {
    pub fn new(domain: &str, category: &str) -> Self {
        Self {
            domain: domain.to_string(),
            category: category.to_string(),
            filters: Vec::new(),
            fallback_unfiltered: true,
            keywords: Vec::new(),
        }
    }

    /// Narrow by one required value; nothing is taken if it matches nothing
    fn exact(mut self, value: &str) -> Self {
        self.filters = vec![value.to_string()];
        self.keywords = vec![value.to_string()];
        self.fallback_unfiltered = false;
        self
    }

    /// Field label used in logs and metadata
    pub fn field_name(&self) -> String {
        format!("{}.{}", self.domain, self.category)
    }
}

/// Categories queried for a domain
pub fn query_plan(domain: &str) -> &'static [&'static str] {
    match domain {
        "portrait" => &[
            "gender",
            "age_range",
            "ethnicity",
            "eye_types",
            "face_shapes",
            "skin_tones",
            "makeup_styles",
            "hair_styles",
            "hair_colors",
            "expressions",
            "poses",
        ],
        "video" => &["scene_types", "motion_effects", "camera_movements"],
        "art" => &["art_styles", "special_effects"],
        "design" => &["layout_types", "visual_styles", "composition_techniques"],
        "product" => &["photography_styles", "lighting_setups"],
        "common" => &[
            "lighting_techniques",
            "photography_techniques",
            "poses",
            "technical_quality",
        ],
        _ => &[],
    }
}

/// Keywords for scoring a non-portrait category, drawn from raw-text cues
pub fn field_keywords(intent: &Intent, category: &str) -> Vec<String> {
    let raw = intent.raw_lower();

    match category {
        "scene_types" => cues_in(&raw, &["energy", "aura", "atmosphere", "power", "能量", "气息", "氛围"]),
        "motion_effects" => cues_in(&raw, &["motion", "movement", "action", "dynamic", "动作", "运动", "动态"]),
        "art_styles" => {
            let mut words: Vec<String> = intent
                .visual_style
                .art_style
                .map(|s| vec![s.as_str().replace('_', " ")])
                .unwrap_or_default();
            words.extend(cues_in(&raw, &["3d", "wax", "蜡像", "holographic", "realistic", "rendering"]));
            words
        }
        "special_effects" => cues_in(&raw, &["glow", "particle", "holographic", "energy", "发光", "粒子", "全息"]),
        "lighting_techniques" => vec![intent.lighting.as_str().replace('_', " ")],
        _ => Vec::new(),
    }
}

fn cues_in(raw: &str, cues: &[&str]) -> Vec<String> {
    cues.iter()
        .filter(|c| raw.contains(**c))
        .map(|c| c.to_string())
        .collect()
}

/// @acp:summary "Subject fields for a portrait, filtered by intent and knowledge"
pub fn portrait_plan(intent: &Intent, knowledge: &KnowledgeBase) -> Vec<FieldRequest> {
    let subject = &intent.subject;
    let mut plan = Vec::new();

    if let Some(gender) = subject.gender {
        plan.push(FieldRequest::new(PORTRAIT, "gender").exact(gender.as_str()));
    }
    if let Some(ethnicity) = subject.ethnicity {
        plan.push(FieldRequest::new(PORTRAIT, "ethnicity").exact(ethnicity.as_str()));
    }
    if let Some(age) = subject.age_range {
        plan.push(FieldRequest::new(PORTRAIT, "age_range").exact(age.as_str()));
    }

    let mut eyes = FieldRequest::new(PORTRAIT, "eye_types");
    let mut hair_color = FieldRequest::new(PORTRAIT, "hair_colors");
    if let Some(ethnicity) = subject.ethnicity {
        if let Some(shape) = knowledge.preferred_eye_shape.get(&ethnicity) {
            eyes.filters.push(shape.clone());
            eyes.keywords.push(shape.clone());
        }
        if let Some(color) = knowledge.typical_hair(ethnicity).first() {
            hair_color.filters.push(color.clone());
            hair_color.keywords.push(color.clone());
        }
    }
    plan.push(eyes);
    plan.push(hair_color);

    plan.push(keyed_request(
        "clothing_styles",
        intent.scene.clothing.as_deref().and_then(|c| knowledge.clothing_keywords.get(c)),
    ));
    plan.push(keyed_request(
        "hair_styles",
        intent.scene.hairstyle.as_deref().and_then(|h| knowledge.hairstyle_keywords.get(h)),
    ));

    for category in [
        "skin_tones",
        "skin_textures",
        "face_shapes",
        "makeup_styles",
        "expressions",
        "poses",
    ] {
        plan.push(FieldRequest::new(PORTRAIT, category));
    }
    plan
}

/// A requested trait narrows by its keyword list and never falls back;
/// no requested trait means the best unfiltered candidate
fn keyed_request(category: &str, words: Option<&Vec<String>>) -> FieldRequest {
    let mut request = FieldRequest::new(PORTRAIT, category);
    if let Some(words) = words {
        request.filters = words.clone();
        request.keywords = words.clone();
        request.fallback_unfiltered = false;
    }
    request
}

/// @acp:summary "Field requests across every required domain"
///
/// The portrait domain uses the portrait plan so subject filters apply.
pub fn cross_domain_plan(intent: &Intent, knowledge: &KnowledgeBase) -> Vec<FieldRequest> {
    let mut plan = Vec::new();
    for domain in required_domains(intent) {
        if domain == PORTRAIT {
            plan.extend(portrait_plan(intent, knowledge));
            continue;
        }
        for category in query_plan(domain) {
            let mut request = FieldRequest::new(domain, category);
            request.keywords = field_keywords(intent, category);
            plan.push(request);
        }
    }
    plan
}

/// Technical fields added after design content
pub fn technical_plan(intent: &Intent) -> Vec<FieldRequest> {
    ["lighting_techniques", "photography_techniques"]
        .into_iter()
        .map(|category| {
            let mut request = FieldRequest::new(COMMON, category);
            request.keywords = field_keywords(intent, category);
            request
        })
        .collect()
}

/// @acp:summary "Words used to search style elements for a portrait"
///
/// Deduplicated, first-seen order.
pub fn style_keywords(intent: &Intent, knowledge: &KnowledgeBase) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut push = |word: &str| {
        let word = word.trim().to_lowercase();
        if !word.is_empty() && !words.contains(&word) {
            words.push(word);
        }
    };

    if let Some(style) = intent.visual_style.art_style {
        push(&style.as_str().replace('_', " "));
    }
    if let Some(theme) = &intent.scene.theme {
        push(theme.as_str());
    }
    push(&intent.lighting.as_str().replace('_', " "));

    let scene = &intent.scene;
    if let Some(words) = scene.era.as_deref().and_then(|e| knowledge.era_keywords.get(e)) {
        words.iter().for_each(|w| push(w.as_str()));
    }
    if let Some(director) = scene.director_style.as_deref() {
        if let Some(profile) = knowledge.director_lighting_styles.get(director) {
            profile.lighting_keywords.iter().for_each(|w| push(w.as_str()));
        }
        if let Some(words) = knowledge.director_keywords.get(director) {
            words.iter().for_each(|w| push(w.as_str()));
        }
    }
    if let Some(profile) = knowledge.director_lighting_styles.get(intent.lighting.as_str()) {
        profile.lighting_keywords.iter().for_each(|w| push(w.as_str()));
    }
    if let Some(words) = scene.clothing.as_deref().and_then(|c| knowledge.clothing_keywords.get(c)) {
        words.iter().for_each(|w| push(w.as_str()));
    }
    if let Some(words) = scene.hairstyle.as_deref().and_then(|h| knowledge.hairstyle_keywords.get(h)) {
        words.iter().for_each(|w| push(w.as_str()));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::VIDEO;
    use crate::intent::parse;
    use pretty_assertions::assert_eq;

    fn categories(plan: &[FieldRequest]) -> Vec<String> {
        plan.iter().map(|r| r.field_name()).collect()
    }

    #[test]
    fn test_portrait_plan_filters() {
        let kb = KnowledgeBase::builtin().unwrap();
        let plan = portrait_plan(&parse("年轻的东亚女性"), &kb);

        assert_eq!(plan[0].field_name(), "portrait.gender");
        assert_eq!(plan[0].filters, vec!["female"]);
        assert!(!plan[0].fallback_unfiltered);
        assert_eq!(plan[1].filters, vec!["East_Asian"]);
        assert_eq!(plan[2].filters, vec!["young_adult"]);

        let eyes = plan.iter().find(|r| r.category == "eye_types").unwrap();
        assert_eq!(eyes.filters, vec!["almond"]);
        assert!(eyes.fallback_unfiltered);
        let hair = plan.iter().find(|r| r.category == "hair_colors").unwrap();
        assert_eq!(hair.filters, vec!["black"]);
        let clothing = plan.iter().find(|r| r.category == "clothing_styles").unwrap();
        assert!(clothing.filters.is_empty());
    }

    #[test]
    fn test_requested_clothing_does_not_fall_back() {
        let kb = KnowledgeBase::builtin().unwrap();
        let plan = portrait_plan(&parse("穿和服的女子"), &kb);
        let clothing = plan.iter().find(|r| r.category == "clothing_styles").unwrap();
        assert_eq!(clothing.filters, vec!["kimono", "japanese"]);
        assert!(!clothing.fallback_unfiltered);
    }

    #[test]
    fn test_cross_domain_plan_covers_domains() {
        let kb = KnowledgeBase::builtin().unwrap();
        let plan = cross_domain_plan(&parse("龙珠动漫的蜡像3D感悟空打出龟派气功"), &kb);
        let fields = categories(&plan);
        assert!(fields.contains(&"portrait.gender".to_string()));
        assert!(fields.contains(&format!("{}.scene_types", VIDEO)));
        assert!(fields.contains(&"art.art_styles".to_string()));
        assert_eq!(fields.last().map(String::as_str), Some("common.technical_quality"));

        let art = plan.iter().find(|r| r.category == "art_styles").unwrap();
        assert_eq!(art.keywords, vec!["wax figure 3d", "3d", "蜡像"]);
    }

    #[test]
    fn test_style_keywords() {
        let kb = KnowledgeBase::builtin().unwrap();
        let words = style_keywords(&parse("张艺谋风格的古装汉服女子，电影级"), &kb);
        assert_eq!(&words[..2], ["cinematic", "ancient"]);
        assert!(words.contains(&"chiaroscuro".to_string()));
        assert!(words.contains(&"hanfu".to_string()));
        let unique: std::collections::HashSet<&String> = words.iter().collect();
        assert_eq!(unique.len(), words.len());
    }
}
