//! @acp:module "Domain Classifier"
//! @acp:summary "Choose the generation type and the element domains a request needs"
//! @acp:domain classify
//! @acp:layer logic

pub mod plan;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PromptError, Result};
use crate::intent::Intent;

pub use plan::{
    cross_domain_plan, field_keywords, portrait_plan, query_plan, style_keywords, technical_plan,
    FieldRequest,
};

pub const PORTRAIT: &str = "portrait";
pub const VIDEO: &str = "video";
pub const ART: &str = "art";
pub const DESIGN: &str = "design";
pub const PRODUCT: &str = "product";
pub const COMMON: &str = "common";

/// Raw-text cues that need the video domain even without a parsed action
const MOTION_CUES: &[&str] = &["kamehameha", "龟派气功", "能量", "energy", "气息"];

/// Which generation path handles a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationType {
    Portrait,
    Design,
    CrossDomain,
    Software,
}

impl GenerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationType::Portrait => "portrait",
            GenerationType::Design => "design",
            GenerationType::CrossDomain => "cross_domain",
            GenerationType::Software => "software",
        }
    }

    /// Parse a requested type where `auto` means "classify"
    pub fn parse_requested(s: &str) -> Result<Option<Self>> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(None);
        }
        s.parse()
            .map(Some)
            .map_err(|_| PromptError::UnknownGenerationType(s.to_string()))
    }
}

impl fmt::Display for GenerationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(GenerationType::Portrait),
            "design" => Ok(GenerationType::Design),
            "cross_domain" | "cross-domain" => Ok(GenerationType::CrossDomain),
            "software" => Ok(GenerationType::Software),
            _ => Err(format!("Unknown generation type: {}", s)),
        }
    }
}

/// @acp:summary "Decide the generation type; first matching rule wins"
pub fn classify(intent: &Intent) -> GenerationType {
    if intent.software.is_some() {
        GenerationType::Software
    } else if intent.design.is_present() {
        GenerationType::Design
    } else if intent.action.is_some() || intent.has_exotic_style() {
        GenerationType::CrossDomain
    } else if !intent.subject.is_empty() {
        GenerationType::Portrait
    } else {
        GenerationType::CrossDomain
    }
}

/// Element Store domains the request draws from, in query order; `common` is always last
pub fn required_domains(intent: &Intent) -> Vec<&'static str> {
    let raw = intent.raw_lower();
    let mut domains = Vec::new();
    if !intent.subject.is_empty() {
        domains.push(PORTRAIT);
    }
    if intent.action.is_some() || MOTION_CUES.iter().any(|c| raw.contains(c)) {
        domains.push(VIDEO);
    }
    if intent.has_exotic_style() {
        domains.push(ART);
    }
    if intent.design.requirement.is_some() {
        domains.push(DESIGN);
    }
    if intent.product.is_some() {
        domains.push(PRODUCT);
    }
    domains.push(COMMON);
    domains
}
