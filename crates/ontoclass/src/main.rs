//! Ontoclass CLI - classify applications and skills against an action ontology.
//!
//! Each input record is matched to a node of a remote action ontology by a
//! reasoning LLM. Results are appended to a CSV or JSON Lines table.
//!
//! # Usage
//!
//! ```bash
//! # Classify applications by the activity they perform
//! ontoclass classify apps.csv --task apps -o apps_classified.csv
//!
//! # Generalize skills, resuming an interrupted run
//! ontoclass classify skills.csv --task skills -o skills.jsonl --skip-existing
//!
//! # View configuration
//! ontoclass config show
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use ontoclass_core::Config;
use std::path::{Path, PathBuf};

mod cli;
mod logging;

/// Ontoclass - zero-shot ontology classification with an LLM.
#[derive(Parser, Debug)]
#[command(name = "ontoclass")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "ONTOCLASS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify the records of an input table
    Classify(cli::classify::ClassifyArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Provider keys may live in a local .env file.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Ontoclass v{}", ontoclass_core::VERSION);
    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    match cli.command {
        Commands::Classify(args) => cli::classify::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args, config, cli.config).await,
    }
}

/// An explicitly named config file must load; the default location falls
/// back to built-in defaults.
fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = explicit {
        return Config::load_from(path)
            .with_context(|| format!("Failed to load config file {}", path.display()));
    }

    // Logging isn't initialized yet, so use eprintln for config warnings.
    Ok(Config::load().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config: {e}\n  \
             Using default configuration. Check your config file with `ontoclass config path`."
        );
        Config::default()
    }))
}
