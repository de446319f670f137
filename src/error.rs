//! @acp:module "Errors"
//! @acp:summary "Library error type and Result alias"
//! @acp:domain cli
//! @acp:layer model

use thiserror::Error;

/// Errors surfaced by the library API
#[derive(Debug, Error)]
pub enum PromptError {
    /// The element library could not be opened
    #[error("element store unavailable: {0}")]
    StoreUnavailable(String),

    /// An element with this id is already stored
    #[error("element already exists: {0}")]
    DuplicateElement(String),

    /// Element failed validation before insert
    #[error("invalid element: {0}")]
    InvalidElement(String),

    #[error("unknown generation type: {0}")]
    UnknownGenerationType(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PromptError {
    /// True when the error means the library itself is missing or unreadable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, PromptError::StoreUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, PromptError>;
