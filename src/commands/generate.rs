//! @acp:module "Generate Command"
//! @acp:summary "Generate a prompt from a natural-language request"
//! @acp:domain cli
//! @acp:layer handler

use anyhow::Result;
use console::style;

use crate::classify::GenerationType;
use crate::config::Config;
use crate::generate::Generator;

/// Options for the generate command
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Request text
    pub text: String,
    /// `auto` or a generation type name
    pub generation_type: String,
    /// Print the full result as JSON
    pub json: bool,
}

/// Execute the generate command
pub fn execute_generate(options: GenerateOptions, config: Config) -> Result<()> {
    let requested = GenerationType::parse_requested(&options.generation_type)?;
    let mut generator = Generator::from_config(config)?;
    let result = generator.generate(&options.text, requested);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if let Some(error) = &result.metadata.error {
        eprintln!("{} {} generation failed: {}", style("✗").red(), result.generation_type, error);
        return Ok(());
    }

    println!("{} {} prompt", style("✓").green(), style(result.generation_type).bold());
    println!();
    println!("{}", result.prompt);
    println!();

    let meta = &result.metadata;
    if let Some(count) = meta.element_count {
        println!("  Elements: {}", count);
    }
    if let Some(domains) = &meta.domains_used {
        println!("  Domains: {}", domains.join(", "));
    }
    if let Some(style_used) = &meta.design_style {
        println!("  Design style: {}", style_used);
    }
    if let (Some(role), Some(task)) = (&meta.role, &meta.task) {
        println!("  Role: {}  Task: {}", role, task);
    }
    for fix in &meta.fixes {
        println!("  {} {}", style("↻").cyan(), fix);
    }
    for missing in &meta.missing_requirements {
        println!(
            "  {} {} '{}' not reflected (expected one of: {})",
            style("⚠").yellow(),
            missing.aspect,
            missing.value,
            missing.expected.join(", ")
        );
    }
    if !meta.unresolved_placeholders.is_empty() {
        println!(
            "  {} Unresolved placeholders: {}",
            style("⚠").yellow(),
            meta.unresolved_placeholders.join(", ")
        );
    }

    Ok(())
}
