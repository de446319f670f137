//! @acp:module "Export Command"
//! @acp:summary "Write the element library to a JSON snapshot"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::store::ElementStore;

/// Options for the export command
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Output JSON file
    pub output: PathBuf,
}

/// Execute the export command
pub fn execute_export(options: ExportOptions, config: &Config) -> Result<()> {
    println!("{} Exporting element library...", style("→").cyan());

    let store = ElementStore::open(&config.database)
        .with_context(|| format!("Failed to open element library {:?}", config.database))?;
    let snapshot = store
        .export_to_file(&options.output)
        .with_context(|| format!("Failed to export to {:?}", options.output))?;

    println!(
        "{} Snapshot written to {}",
        style("✓").green(),
        options.output.display()
    );
    println!("  Elements: {}", snapshot.library_metadata.total_elements);
    println!("  Domains: {}", snapshot.library_metadata.total_domains);
    Ok(())
}
