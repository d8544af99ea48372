//! CLI enum types for the classify command: task, output format, provider, effort.

use clap::ValueEnum;
use ontoclass_core::{OutputFormat as CoreOutputFormat, ReasoningEffort as CoreEffort};

/// Which classification to run over the input table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Task {
    /// Applications (Name, Tagline, Description) to the activity they support
    Apps,
    /// Skills (raw_skill lists) to their closest generalization
    Skills,
}

/// Supported output formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated values with a header row
    Csv,
    /// One JSON object per line, keyed by column name
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Csv => CoreOutputFormat::Csv,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Supported LLM providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    /// OpenAI chat completions
    Openai,
    /// Google Gemini generateContent
    Gemini,
    /// Anthropic messages
    Anthropic,
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::Openai => write!(f, "openai"),
            LlmProvider::Gemini => write!(f, "gemini"),
            LlmProvider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Reasoning effort requested from the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl From<ReasoningEffort> for CoreEffort {
    fn from(effort: ReasoningEffort) -> Self {
        match effort {
            ReasoningEffort::Low => CoreEffort::Low,
            ReasoningEffort::Medium => CoreEffort::Medium,
            ReasoningEffort::High => CoreEffort::High,
        }
    }
}
