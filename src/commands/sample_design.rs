//! @acp:module "Sample Design Command"
//! @acp:summary "Draw consecutive design variable samples for a style"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::{bail, Context, Result};
use console::style;

use crate::config::Config;
use crate::design::{DesignCategory, DesignVariableStore};
use crate::sampler::{DesignSampler, SamplingHistory};

/// Options for the sample-design command
#[derive(Debug, Clone)]
pub struct SampleDesignOptions {
    /// Style name; the first defined style when absent
    pub style: Option<String>,
    /// Number of consecutive samples
    pub count: usize,
}

/// Execute the sample-design command
pub fn execute_sample_design(options: SampleDesignOptions, config: &Config) -> Result<()> {
    let store = DesignVariableStore::load_dir(&config.variables_dir)
        .with_context(|| format!("Failed to load design variables from {:?}", config.variables_dir))?;
    if store.is_empty() {
        bail!("No design styles found in {}", config.variables_dir.display());
    }

    let sampler = DesignSampler::new(config.sampling.design_recent_window);
    let mut history = SamplingHistory::new(config.sampling.history_capacity);
    let mut rng = rand::rng();

    for round in 1..=options.count {
        let Some(selection) = sampler.sample(
            &store,
            options.style.as_deref(),
            &DesignCategory::ALL,
            &mut history,
            &mut rng,
        ) else {
            break;
        };
        println!(
            "{} Sample {} ({})",
            style("✓").green(),
            round,
            style(&selection.style_used).bold()
        );
        for line in selection.description_lines() {
            println!("  {}", line);
        }
    }
    Ok(())
}
