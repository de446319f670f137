//! @acp:module "Intent"
//! @acp:summary "Structured interpretation of a free-text generation request"
//! @acp:domain intent
//! @acp:layer model
//!
//! An [`Intent`] is built per request by [`parse`] and never persisted.
//! Closed vocabularies are enums so that a typo in a rule value fails the
//! rule-table tests instead of silently matching nothing.

pub mod parser;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use parser::parse;
pub use rules::{Field, Rule, RULES};

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($text) {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("Unknown {}: {}", stringify!($name), s))
            }
        }
    };
}

vocabulary!(Gender {
    Female => "female",
    Male => "male",
});

vocabulary!(
    /// Ethnicity labels as used by the knowledge tables
    Ethnicity {
        EastAsian => "East_Asian",
        SoutheastAsian => "Southeast_Asian",
        SouthAsian => "South_Asian",
        European => "European",
        African => "African",
        MiddleEastern => "Middle_Eastern",
        LatinAmerican => "Latin_American",
    }
);

vocabulary!(AgeRange {
    Child => "child",
    YoungAdult => "young_adult",
    Adult => "adult",
    Elderly => "elderly",
});

vocabulary!(ArtStyle {
    WaxFigure3d => "wax_figure_3d",
    Holographic => "holographic",
    Sculpture => "sculpture",
    Anime => "anime",
    Manga => "manga",
    Illustration => "illustration",
    Realistic => "realistic",
});

vocabulary!(Lighting {
    Natural => "natural",
    Cinematic => "cinematic",
    FilmNoir => "film_noir",
    Dramatic => "dramatic",
    Neon => "neon",
    Soft => "soft",
});

vocabulary!(SoftwareTaskKind {
    UnitTest => "unit_test",
    ApiTest => "api_test",
    PerformanceTest => "performance_test",
    DockerFile => "docker_file",
    CiPipeline => "ci_pipeline",
    ArchitectureDesign => "architecture_design",
    DbSchemaDesign => "db_schema_design",
    ReadmeGeneration => "readme_generation",
    SecurityAudit => "security_audit",
    CodeGeneration => "code_generation",
});

impl ArtStyle {
    /// Styles that need the art domain (3D, wax, holographic, sculpture)
    pub fn is_exotic(&self) -> bool {
        matches!(
            self,
            ArtStyle::WaxFigure3d | ArtStyle::Holographic | ArtStyle::Sculpture
        )
    }
}

impl Default for Lighting {
    fn default() -> Self {
        Lighting::Natural
    }
}

/// Demographic cues about the depicted person
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethnicity: Option<Ethnicity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<AgeRange>,
    /// Named character, e.g. "Son Goku"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character: Option<String>,
}

impl Subject {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.ethnicity.is_none()
            && self.age_range.is_none()
            && self.character.is_none()
    }
}

/// Action or energy cue that pulls in the video domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCue {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub art_style: Option<ArtStyle>,
}

/// Atmosphere and period cues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub era: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clothing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hairstyle: Option<String>,
}

/// Graphic design cues
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignCue {
    /// Named style key in the design variable files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Deliverable such as "poster" or "card"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<String>,
}

impl DesignCue {
    pub fn is_present(&self) -> bool {
        self.style.is_some() || self.requirement.is_some()
    }
}

/// Procedural (software engineering) task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareTask {
    pub task: SoftwareTaskKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,
}

/// @acp:summary "Typed request interpretation produced by the intent parser"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub raw_input: String,
    #[serde(default, skip_serializing_if = "Subject::is_empty")]
    pub subject: Subject,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionCue>,
    #[serde(default)]
    pub visual_style: VisualStyle,
    #[serde(default)]
    pub scene: Scene,
    #[serde(default)]
    pub design: DesignCue,
    #[serde(default)]
    pub lighting: Lighting,
    /// Product photography cue
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<SoftwareTask>,
}

impl Intent {
    /// Lowercased raw input, for substring cues
    pub fn raw_lower(&self) -> String {
        self.raw_input.to_lowercase()
    }

    pub fn has_exotic_style(&self) -> bool {
        self.visual_style
            .art_style
            .map(|s| s.is_exotic())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_round_trip() {
        assert_eq!("East_Asian".parse::<Ethnicity>().unwrap(), Ethnicity::EastAsian);
        assert_eq!("east_asian".parse::<Ethnicity>().unwrap(), Ethnicity::EastAsian);
        assert_eq!(Ethnicity::MiddleEastern.to_string(), "Middle_Eastern");
        assert!("martian".parse::<Ethnicity>().is_err());
        assert_eq!(
            serde_json::to_string(&SoftwareTaskKind::DockerFile).unwrap(),
            "\"docker_file\""
        );
    }

    #[test]
    fn test_exotic_styles() {
        assert!(ArtStyle::WaxFigure3d.is_exotic());
        assert!(ArtStyle::Holographic.is_exotic());
        assert!(!ArtStyle::Anime.is_exotic());
    }

    #[test]
    fn test_intent_deserializes_from_nested_map() {
        let intent: Intent = serde_json::from_str(
            r#"{
                "raw_input": "",
                "subject": {"gender": "female", "ethnicity": "East_Asian"},
                "visual_style": {"art_style": "anime"}
            }"#,
        )
        .unwrap();
        assert_eq!(intent.subject.gender, Some(Gender::Female));
        assert_eq!(intent.visual_style.art_style, Some(ArtStyle::Anime));
        assert_eq!(intent.lighting, Lighting::Natural);
    }
}
