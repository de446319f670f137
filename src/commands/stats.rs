//! @acp:module "Stats Command"
//! @acp:summary "Summarize the element library"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::{Context, Result};
use console::style;

use crate::config::Config;
use crate::store::ElementStore;

/// Options for the stats command
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Print as JSON
    pub json: bool,
}

/// Execute the stats command
pub fn execute_stats(options: StatsOptions, config: &Config) -> Result<()> {
    let store = ElementStore::open(&config.database)
        .with_context(|| format!("Failed to open element library {:?}", config.database))?;
    let stats = store.stats()?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} Element library {}", style("✓").green(), config.database.display());
    println!("  Elements: {}", stats.total_elements);
    println!("  Tags: {}", stats.total_tags);

    if !stats.domains.is_empty() {
        println!();
        println!("{}", style("Domains:").bold());
        for (domain, count) in &stats.domains {
            println!("  {:<12} {}", domain, count);
        }
    }
    if !stats.top_tags.is_empty() {
        println!();
        println!("{}", style("Top tags:").bold());
        for (tag, count) in &stats.top_tags {
            println!("  {:<20} {}", tag, count);
        }
    }
    Ok(())
}
