//! The `ontoclass classify` command.

mod batch;
mod setup;
pub mod types;

pub use types::{LlmProvider, OutputFormat, ReasoningEffort, Task};

use clap::Args;
use ontoclass_core::{input, AppActivityTask, Config, SkillGeneralizationTask};
use std::path::PathBuf;

use batch::run_task;

/// Arguments for the `classify` command.
#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Input CSV file
    #[arg(required = true)]
    pub input: PathBuf,

    /// Which classification to run
    #[arg(short, long, value_enum)]
    pub task: Task,

    /// Output file (created, or extended with --skip-existing)
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format (defaults to the configured format)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// LLM provider (defaults to the configured provider, then the task's)
    #[arg(long, value_enum)]
    pub llm: Option<LlmProvider>,

    /// LLM model name (provider-specific)
    #[arg(long)]
    pub llm_model: Option<String>,

    /// Reasoning effort requested from the model
    #[arg(long, value_enum)]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// LLM calls per record before it is skipped
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: Option<u32>,

    /// Number of ontology search hits to request
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub search_limit: Option<u32>,

    /// Ontology application to query
    #[arg(long)]
    pub application_name: Option<String>,

    /// Ontology node type filter (empty string disables the filter)
    #[arg(long)]
    pub node_type: Option<String>,

    /// Skip records already present in the output file and append to it
    #[arg(long)]
    pub skip_existing: bool,
}

/// Execute the classify command.
pub async fn execute(args: ClassifyArgs, mut config: Config) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!(
            "Input file does not exist: {:?}\n\n  Hint: Check the file path and try again.",
            args.input
        );
    }
    setup::apply_overrides(&mut config, &args);

    match args.task {
        Task::Apps => {
            let records = input::read_app_records(&args.input)?;
            tracing::info!("Loaded {} application(s) from {:?}", records.len(), args.input);
            run_task(AppActivityTask, &records, &args, &config).await
        }
        Task::Skills => {
            let records = input::read_skill_records(&args.input)?;
            tracing::info!("Loaded {} skill(s) from {:?}", records.len(), args.input);
            run_task(SkillGeneralizationTask, &records, &args, &config).await
        }
    }
}
