//! @acp:module "Import Command"
//! @acp:summary "Load a JSON snapshot into the element library"
//! @acp:domain cli
//! @acp:layer handler

use std::path::PathBuf;

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::store::ElementStore;

/// Options for the import command
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Snapshot JSON file
    pub input: PathBuf,
    /// Remove existing elements first
    pub clear: bool,
}

/// Execute the import command
///
/// Creates the library file when it does not exist yet.
pub fn execute_import(options: ImportOptions, config: &Config) -> Result<()> {
    println!("{} Importing {}...", style("→").cyan(), options.input.display());

    let mut store = ElementStore::create(&config.database)
        .with_context(|| format!("Failed to open element library {:?}", config.database))?;
    let imported = store
        .import_from_file(&options.input, options.clear)
        .with_context(|| format!("Failed to import {:?}", options.input))?;

    println!("{} Imported {} elements", style("✓").green(), imported);
    if options.clear {
        println!("  Existing elements were cleared first");
    }
    Ok(())
}
