//! @acp:module "Intent Parser"
//! @acp:summary "Build a typed Intent from free text using the rule table"
//! @acp:domain intent
//! @acp:layer logic

use std::str::FromStr;

use tracing::debug;

use super::rules::{first_match, Field};
use super::*;

/// @acp:summary "Parse raw text into an Intent"
///
/// Pure and case-insensitive. Fields without a firing rule stay empty,
/// except lighting which defaults to natural.
pub fn parse(raw: &str) -> Intent {
    let text = raw.to_lowercase();
    let text = text.as_str();
    let value = |field: Field| first_match(field, text).map(|r| r.value);

    let software = value(Field::SoftwareTask)
        .and_then(typed::<SoftwareTaskKind>)
        .map(|task| SoftwareTask {
            task,
            language: value(Field::Language).map(str::to_string),
            framework: value(Field::Framework).map(str::to_string),
        });

    let subject = Subject {
        gender: value(Field::Gender).and_then(typed),
        ethnicity: value(Field::Ethnicity).and_then(typed),
        age_range: value(Field::AgeRange).and_then(typed),
        character: value(Field::Character).map(str::to_string),
    };

    let action = value(Field::Action).map(|name| ActionCue {
        name: name.to_string(),
        energy: value(Field::Energy).map(str::to_string),
    });

    let intent = Intent {
        raw_input: raw.to_string(),
        subject,
        action,
        visual_style: VisualStyle {
            art_style: value(Field::ArtStyle).and_then(typed),
        },
        scene: Scene {
            theme: value(Field::Theme).map(str::to_string),
            era: value(Field::Era).map(str::to_string),
            director_style: value(Field::DirectorStyle).map(str::to_string),
            clothing: value(Field::Clothing).map(str::to_string),
            hairstyle: value(Field::Hairstyle).map(str::to_string),
        },
        design: DesignCue {
            style: value(Field::DesignStyle).map(str::to_string),
            requirement: value(Field::DesignRequirement).map(str::to_string),
        },
        lighting: value(Field::Lighting)
            .and_then(typed)
            .unwrap_or_default(),
        product: value(Field::Product).map(str::to_string),
        software,
    };

    debug!(
        software = intent.software.is_some(),
        subject = !intent.subject.is_empty(),
        action = intent.action.is_some(),
        "Parsed intent"
    );
    intent
}

fn typed<T: FromStr<Err = String>>(value: &str) -> Option<T> {
    match value.parse() {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Rule value rejected: {}", e);
            None
        }
    }
}
