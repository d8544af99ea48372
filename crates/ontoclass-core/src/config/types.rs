//! Sub-configuration structs with their defaults.

use crate::llm::anthropic::ANTHROPIC_MESSAGES_ENDPOINT;
use crate::llm::gemini::GEMINI_BASE_URL;
use crate::llm::openai::OPENAI_CHAT_ENDPOINT;
use crate::llm::{PricingTable, ReasoningEffort};
use serde::{Deserialize, Serialize};

/// Ontology service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// `load-sub-ontology` endpoint URL
    pub endpoint: String,

    /// Ontology application to search
    pub application_name: String,

    /// Restrict hits to this node type (omitted from the query when unset)
    pub node_type: Option<String>,

    /// Maximum hits per query; each task has its own default when unset
    pub search_limit: Option<u32>,

    /// Bearer token (supports ${ENV_VAR} syntax)
    pub api_key: Option<String>,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://1ontology.com/api/load-sub-ontology".to_string(),
            application_name: "final-hierarchy-with-o*net".to_string(),
            node_type: Some("activity".to_string()),
            search_limit: None,
            api_key: None,
        }
    }
}

/// Classification retry loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// LLM calls per record before giving up
    pub max_attempts: u32,

    /// Base delay before retrying a transient provider error
    pub retry_delay_ms: u64,

    /// Reasoning effort requested from the model
    pub reasoning_effort: ReasoningEffort,

    /// Cap on generated tokens (provider default when unset)
    pub max_output_tokens: Option<u32>,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 1000,
            reasoning_effort: ReasoningEffort::High,
            max_output_tokens: None,
        }
    }
}

/// Per-request timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// LLM call timeout in milliseconds
    pub llm_timeout_ms: u64,

    /// Ontology service timeout in milliseconds
    pub ontology_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            // high-effort reasoning calls routinely take minutes
            llm_timeout_ms: 300_000,
            ontology_timeout_ms: 60_000,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format ("csv" or "jsonl")
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "csv".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// LLM provider configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider to use: "openai", "gemini" or "anthropic".
    /// Each task has its own default when unset.
    pub provider: Option<String>,

    /// OpenAI configuration
    pub openai: Option<OpenAiConfig>,

    /// Google Gemini configuration
    pub gemini: Option<GeminiConfig>,

    /// Anthropic configuration
    pub anthropic: Option<AnthropicConfig>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            openai: Some(OpenAiConfig::default()),
            gemini: Some(GeminiConfig::default()),
            anthropic: Some(AnthropicConfig::default()),
        }
    }
}

/// OpenAI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Chat Completions URL
    pub endpoint: String,

    /// Rates for cost accounting
    pub pricing: PricingTable,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: "${OPENAI_API_KEY}".to_string(),
            model: "gpt-5".to_string(),
            endpoint: OPENAI_CHAT_ENDPOINT.to_string(),
            pricing: PricingTable::flat(1.25, 10.0),
        }
    }
}

/// Google Gemini configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// API base URL
    pub endpoint: String,

    /// Rates for cost accounting
    pub pricing: PricingTable,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GOOGLE_API_KEY}".to_string(),
            model: "gemini-2.5-pro".to_string(),
            endpoint: GEMINI_BASE_URL.to_string(),
            pricing: PricingTable::flat(1.25, 10.0).with_long_context(200_000, 2.5, 15.0),
        }
    }
}

/// Anthropic configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Model name
    pub model: String,

    /// Messages API URL
    pub endpoint: String,

    /// Default `max_tokens`; raised automatically above the thinking budget
    pub max_tokens: u32,

    /// Rates for cost accounting
    pub pricing: PricingTable,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: "${ANTHROPIC_API_KEY}".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            endpoint: ANTHROPIC_MESSAGES_ENDPOINT.to_string(),
            max_tokens: 8192,
            pricing: PricingTable::flat(3.0, 15.0),
        }
    }
}
