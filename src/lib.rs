#![forbid(unsafe_code)]

//! @acp:module "Promptsmith Library"
//! @acp:summary "Multi-domain prompt generation from a reusable element library"
//! @acp:domain cli
//! @acp:layer api
//! @acp:stability stable
//!
//! # Promptsmith
//!
//! Turns a short natural-language request into a detailed prompt by
//! assembling reusable elements from a SQLite library and design
//! variables from YAML files.
//!
//! ## Pipeline
//!
//! - **Intent**: rule-table parsing of the raw request
//! - **Classify**: generation type and the domains to query
//! - **Retrieve / Select**: per-field candidates, scored and gated
//! - **Consistency**: ethnicity plausibility and duplicate repair
//! - **Sampler**: non-repeating variable and design sampling
//! - **Compose**: deduplicated, delimited prompt text
//!
//! ## Example
//!
//! ```rust,no_run
//! use promptsmith::{Config, Generator};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut generator = Generator::from_config(Config::load_or_default())?;
//!     let result = generator.generate("年轻的东亚女性，电影级光影", None);
//!     println!("{}", result.prompt);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod commands;
pub mod compose;
pub mod config;
pub mod consistency;
pub mod design;
pub mod error;
pub mod generate;
pub mod intent;
pub mod knowledge;
pub mod retrieve;
pub mod sampler;
pub mod select;
pub mod store;

// Re-exports
pub use classify::{classify, required_domains, GenerationType};
pub use compose::{ComposeMode, Composer, Lexicon};
pub use config::Config;
pub use consistency::{ConflictResolver, ConsistencyChecker, ConsistencyIssue};
pub use design::{DesignCategory, DesignVariableStore};
pub use error::{PromptError, Result};
pub use generate::{GenerationMetadata, GenerationResult, Generator, SoftwareCatalog};
pub use intent::{parse, Intent};
pub use knowledge::KnowledgeBase;
pub use retrieve::{CandidateRetriever, CandidateSource};
pub use sampler::{DesignSampler, ParametricSampler, SamplingHistory};
pub use select::ElementSelector;
pub use store::{Element, ElementStore, LibrarySnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
