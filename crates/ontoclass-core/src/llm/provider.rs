//! LLM provider trait and request/response types.
//!
//! Defines the interface that all LLM providers implement, plus the
//! factory that creates the right provider from CLI flags and config.

use super::usage::{PricingTable, UsageTokens};
use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How much internal reasoning the model should spend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }

    /// Thinking-token budget for providers that take a budget instead of a level.
    pub fn thinking_budget(&self) -> u32 {
        match self {
            ReasoningEffort::Low => 1_024,
            ReasoningEffort::Medium => 8_192,
            ReasoningEffort::High => 24_576,
        }
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single-turn text completion request.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// Full prompt, sent as one user message
    pub prompt: String,
    /// Reasoning hint, mapped per provider
    pub reasoning_effort: Option<ReasoningEffort>,
    /// Cap on generated tokens (provider default when `None`)
    pub max_output_tokens: Option<u32>,
    /// Sampling temperature (provider default when `None`)
    pub temperature: Option<f32>,
}

impl LlmRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            reasoning_effort: None,
            max_output_tokens: None,
            temperature: None,
        }
    }

    pub fn with_reasoning_effort(mut self, effort: Option<ReasoningEffort>) -> Self {
        self.reasoning_effort = effort;
        self
    }
}

/// The response from one LLM call.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Generated text, trimmed
    pub text: String,
    /// Model identifier used
    pub model: String,
    /// Token buckets mapped from the provider's usage metadata
    pub usage: UsageTokens,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
}

/// Trait that all LLM providers implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (we need `Box<dyn LlmProvider>` for dynamic dispatch).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name for logging (e.g., "openai", "gemini").
    fn name(&self) -> &str;

    /// Generate a completion for the given request.
    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the appropriate provider from CLI flags and config.
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    /// Create an LLM provider based on provider name, config, and optional model override.
    ///
    /// # Arguments
    /// * `provider` - Provider identifier ("openai", "gemini", "anthropic")
    /// * `config` - The full LLM config section
    /// * `model_override` - Optional model name that overrides the config default
    pub fn create(
        provider: &str,
        config: &LlmConfig,
        model_override: Option<&str>,
    ) -> Result<Box<dyn LlmProvider>, LlmError> {
        match provider {
            "openai" => {
                let cfg = config.openai.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    LlmError::new("OpenAI API key not set. Set OPENAI_API_KEY env var.")
                })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(super::openai::OpenAiProvider::with_endpoint(
                    &api_key,
                    &model,
                    &cfg.endpoint,
                )))
            }
            "gemini" => {
                let cfg = config.gemini.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    LlmError::new("Gemini API key not set. Set GOOGLE_API_KEY env var.")
                })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(
                    super::gemini::GeminiProvider::new(&api_key, &model)
                        .with_base_url(&cfg.endpoint),
                ))
            }
            "anthropic" => {
                let cfg = config.anthropic.clone().unwrap_or_default();
                let api_key = resolve_env_var(&cfg.api_key).ok_or_else(|| {
                    LlmError::new("Anthropic API key not set. Set ANTHROPIC_API_KEY env var.")
                })?;
                let model = model_override.map(String::from).unwrap_or(cfg.model);
                Ok(Box::new(
                    super::anthropic::AnthropicProvider::new(&api_key, &model, cfg.max_tokens)
                        .with_endpoint(&cfg.endpoint),
                ))
            }
            other => Err(LlmError::new(format!("Unknown LLM provider: {other}"))),
        }
    }

    /// Pricing table configured for a provider.
    pub fn pricing(provider: &str, config: &LlmConfig) -> Result<PricingTable, LlmError> {
        match provider {
            "openai" => Ok(config.openai.clone().unwrap_or_default().pricing),
            "gemini" => Ok(config.gemini.clone().unwrap_or_default().pricing),
            "anthropic" => Ok(config.anthropic.clone().unwrap_or_default().pricing),
            other => Err(LlmError::new(format!("Unknown LLM provider: {other}"))),
        }
    }
}
