//! @acp:module "Commands"
//! @acp:summary "CLI command implementations"
//! @acp:domain cli
//! @acp:layer handler
//!
//! Each command is an options struct plus an `execute_*` function.

pub mod export;
pub mod generate;
pub mod import;
pub mod parse;
pub mod sample_design;
pub mod stats;

pub use export::{execute_export, ExportOptions};
pub use generate::{execute_generate, GenerateOptions};
pub use import::{execute_import, ImportOptions};
pub use parse::{execute_parse, ParseOptions};
pub use sample_design::{execute_sample_design, SampleDesignOptions};
pub use stats::{execute_stats, StatsOptions};
