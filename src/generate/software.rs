//! @acp:module "Software Prompt Path"
//! @acp:summary "Role/task template filling for software engineering requests"
//! @acp:domain generate
//! @acp:layer service
//!
//! This path never touches the Element Store.

use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{GenerationMetadata, GenerationResult};
use crate::classify::GenerationType;
use crate::intent::{Intent, SoftwareTaskKind};
use crate::sampler::unresolved_placeholders;

const SOFTWARE_FILE: &str = "software.yaml";
const DEFAULT_ROLE: &str = "You are a software engineering expert.";
const DEFAULT_LANGUAGE: &str = "Python";
const DEFAULT_FRAMEWORK: &str = "standard library";
const DEFAULT_TASK: &str = "Implement {feature} in {language} using {framework}.";

/// Placeholder fillers applied after language and framework
const FILLERS: &[(&str, &str)] = &[
    ("{target}", "the specified target"),
    ("{stages}", "build, test, deploy"),
    ("{load}", "1000"),
    ("{type}", "script"),
    ("{tool}", "tool"),
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleSpec {
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskSpec {
    #[serde(default)]
    pub template: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageSpec {
    /// purpose (web, testing, performance) -> frameworks, preferred first
    #[serde(default)]
    pub frameworks: IndexMap<String, Vec<String>>,
}

/// @acp:summary "Roles, task templates and framework recommendations"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SoftwareCatalog {
    #[serde(default)]
    pub roles: IndexMap<String, RoleSpec>,
    #[serde(default)]
    pub tasks: IndexMap<String, TaskSpec>,
    #[serde(default)]
    pub languages: IndexMap<String, LanguageSpec>,
}

impl SoftwareCatalog {
    pub fn builtin() -> Result<Self> {
        let yaml = include_str!("../../variables/software.yaml");
        serde_yaml::from_str(yaml).context("Failed to parse built-in software.yaml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read software catalog from {:?}", path))?;
        serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse software catalog from {:?}", path))
    }

    /// `software.yaml` from the variables directory, else the built-in copy
    pub fn load_dir_or_builtin(dir: &Path) -> Result<Self> {
        let path = dir.join(SOFTWARE_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            warn!(path = %path.display(), "Software catalog not found, using built-in");
            Self::builtin()
        }
    }

    /// First framework listed for the task's purpose
    pub fn recommend_framework(&self, language: &str, task: SoftwareTaskKind) -> Option<&str> {
        let frameworks = &self.languages.get(&language.to_lowercase())?.frameworks;
        let task = task.as_str();
        let purpose = if task.contains("performance") {
            "performance"
        } else if task.contains("test") {
            "testing"
        } else {
            "web"
        };
        frameworks.get(purpose)?.first().map(String::as_str)
    }
}

/// Role key for a task; tasks outrank raw-text hints
pub fn determine_role(task: SoftwareTaskKind, raw_input: &str) -> &'static str {
    let task = task.as_str();
    let has = |words: &[&str]| words.iter().any(|w| task.contains(w));

    if has(&["test"]) {
        "qa_engineer"
    } else if has(&["deploy", "pipeline", "docker"]) {
        "devops_engineer"
    } else if has(&["architecture", "design", "schema"]) {
        "system_architect"
    } else if has(&["security", "audit"]) {
        "security_engineer"
    } else if has(&["readme", "doc"]) {
        "tech_writer"
    } else if mentions_frontend(raw_input) {
        "frontend_dev"
    } else {
        "backend_dev"
    }
}

/// `ui` only counts as a whole word so "build" and "guide" do not match
fn mentions_frontend(raw_input: &str) -> bool {
    let lower = raw_input.to_lowercase();
    ["frontend", "css", "前端", "界面"].iter().any(|w| lower.contains(w))
        || lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word == "ui")
}

/// @acp:summary "Fill the role and task templates for a software request"
pub fn generate(intent: &Intent, catalog: &SoftwareCatalog) -> GenerationResult {
    let detected = intent.software.as_ref();
    let task = detected.map(|s| s.task).unwrap_or(SoftwareTaskKind::CodeGeneration);

    let role = determine_role(task, &intent.raw_input);
    let role_desc = catalog
        .roles
        .get(role)
        .map(|r| r.description.as_str())
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_ROLE);

    let language = detected
        .and_then(|s| s.language.clone())
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let framework = detected
        .and_then(|s| s.framework.clone())
        .or_else(|| catalog.recommend_framework(&language, task).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_FRAMEWORK.to_string());

    let template = catalog
        .tasks
        .get(task.as_str())
        .map(|t| t.template.as_str())
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TASK);

    let mut task_desc = template
        .replace("{language}", &language)
        .replace("{framework}", &framework)
        .replace("{feature}", &format!("'{}'", intent.raw_input));
    for (placeholder, filler) in FILLERS {
        task_desc = task_desc.replace(placeholder, filler);
    }
    let unresolved = unresolved_placeholders(&task_desc);

    let prompt = format!(
        "{}\n\nTask:\n{}\n\nInput Context:\n{}\n\nConstraints:\n- Ensure code quality and best practices.\n- Include comments and documentation.",
        role_desc, task_desc, intent.raw_input
    );
    debug!(role, task = task.as_str(), %language, %framework, "Filled software template");

    GenerationResult {
        prompt,
        generation_type: GenerationType::Software,
        metadata: GenerationMetadata {
            role: Some(role.to_string()),
            task: Some(task.as_str().to_string()),
            language: Some(language),
            framework: Some(framework),
            unresolved_placeholders: unresolved,
            ..GenerationMetadata::default()
        },
    }
}
