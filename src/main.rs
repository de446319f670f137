#![forbid(unsafe_code)]
//! Promptsmith Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promptsmith::commands::{
    execute_export, execute_generate, execute_import, execute_parse, execute_sample_design,
    execute_stats, ExportOptions, GenerateOptions, ImportOptions, ParseOptions,
    SampleDesignOptions, StatsOptions,
};
use promptsmith::config::CONFIG_FILE;
use promptsmith::Config;

#[derive(Parser)]
#[command(name = "promptsmith")]
#[command(about = "Multi-domain prompt generation from a reusable element library")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a prompt from a request
    Generate {
        /// Request text
        text: String,

        /// Generation type: auto, portrait, design, cross-domain, software
        #[arg(short = 't', long = "type", default_value = "auto")]
        generation_type: String,

        /// Output the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the parsed intent of a request as JSON
    Parse {
        /// Request text
        text: String,
    },

    /// Show element library statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export the element library to a JSON snapshot
    Export {
        /// Output file
        file: PathBuf,
    },

    /// Import a JSON snapshot into the element library
    Import {
        /// Snapshot file
        file: PathBuf,

        /// Clear the library before importing
        #[arg(long)]
        clear: bool,
    },

    /// Draw design variable samples for a style
    SampleDesign {
        /// Style name (defaults to the first defined style)
        #[arg(short, long)]
        style: Option<String>,

        /// Number of samples
        #[arg(short = 'n', long, default_value_t = 3)]
        count: usize,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load config
    let config = if cli.config.exists() {
        Config::open(&cli.config)?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::Generate { text, generation_type, json } => {
            let options = GenerateOptions {
                text,
                generation_type,
                json,
            };
            execute_generate(options, config)?;
        }

        Commands::Parse { text } => {
            execute_parse(ParseOptions { text })?;
        }

        Commands::Stats { json } => {
            execute_stats(StatsOptions { json }, &config)?;
        }

        Commands::Export { file } => {
            execute_export(ExportOptions { output: file }, &config)?;
        }

        Commands::Import { file, clear } => {
            execute_import(ImportOptions { input: file, clear }, &config)?;
        }

        Commands::SampleDesign { style, count } => {
            execute_sample_design(SampleDesignOptions { style, count }, &config)?;
        }
    }

    Ok(())
}
