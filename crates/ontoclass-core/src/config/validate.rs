//! Configuration validation with range checks.

use crate::error::ConfigError;
use crate::llm::PricingTable;

use super::Config;

const KNOWN_PROVIDERS: &[&str] = &["openai", "gemini", "anthropic"];
const KNOWN_FORMATS: &[&str] = &["csv", "jsonl"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.ontology.endpoint.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ontology.endpoint must not be empty".into(),
            ));
        }
        if self.ontology.application_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ontology.application_name must not be empty".into(),
            ));
        }
        if self.ontology.search_limit == Some(0) {
            return Err(ConfigError::ValidationError(
                "ontology.search_limit must be > 0".into(),
            ));
        }
        if self.classify.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "classify.max_attempts must be > 0".into(),
            ));
        }
        if self.limits.llm_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.llm_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.ontology_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.ontology_timeout_ms must be > 0".into(),
            ));
        }
        if !KNOWN_FORMATS.contains(&self.output.format.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "output.format must be one of {}, got '{}'",
                KNOWN_FORMATS.join(", "),
                self.output.format
            )));
        }
        if let Some(provider) = &self.llm.provider {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "llm.provider must be one of {}, got '{provider}'",
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }
        if let Some(openai) = &self.llm.openai {
            validate_pricing("llm.openai.pricing", &openai.pricing)?;
        }
        if let Some(gemini) = &self.llm.gemini {
            validate_pricing("llm.gemini.pricing", &gemini.pricing)?;
        }
        if let Some(anthropic) = &self.llm.anthropic {
            if anthropic.max_tokens == 0 {
                return Err(ConfigError::ValidationError(
                    "llm.anthropic.max_tokens must be > 0".into(),
                ));
            }
            validate_pricing("llm.anthropic.pricing", &anthropic.pricing)?;
        }
        Ok(())
    }
}

fn validate_pricing(section: &str, pricing: &PricingTable) -> Result<(), ConfigError> {
    let negative = |rate: f64| rate.is_nan() || rate < 0.0;
    if negative(pricing.input_per_million) || negative(pricing.output_per_million) {
        return Err(ConfigError::ValidationError(format!(
            "{section} rates must be >= 0"
        )));
    }
    if let Some(tier) = &pricing.long_context {
        if tier.threshold_tokens == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{section}.long_context.threshold_tokens must be > 0"
            )));
        }
        if negative(tier.input_per_million) || negative(tier.output_per_million) {
            return Err(ConfigError::ValidationError(format!(
                "{section}.long_context rates must be >= 0"
            )));
        }
    }
    Ok(())
}
