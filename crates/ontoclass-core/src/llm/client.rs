//! One-shot LLM call: provider request, JSON extraction, usage and cost.

use super::extract::extract_object;
use super::provider::{LlmProvider, LlmRequest};
use super::usage::{CostEstimate, PricingTable, UsageTokens};
use crate::error::LlmError;
use serde_json::{Map, Value};
use std::time::{Duration, Instant};

/// Everything known about one successful provider call.
#[derive(Debug, Clone)]
pub struct LlmEnvelope {
    /// First balanced JSON object in the response, if any
    pub parsed_object: Option<Map<String, Value>>,
    /// Raw response text
    pub text: String,
    pub model: String,
    pub usage: UsageTokens,
    pub cost: CostEstimate,
    pub execution_time_ms: u64,
}

/// Sends prompts to a single configured provider.
///
/// Never retries; the classifier decides what a failure means.
pub struct RequestClient {
    provider: Box<dyn LlmProvider>,
    pricing: PricingTable,
    timeout: Duration,
}

impl RequestClient {
    pub fn new(provider: Box<dyn LlmProvider>, pricing: PricingTable, timeout_ms: u64) -> Self {
        Self {
            provider,
            pricing,
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Make exactly one provider call and account for it.
    pub async fn send_request(&self, request: &LlmRequest) -> Result<LlmEnvelope, LlmError> {
        let start = Instant::now();

        let response = match tokio::time::timeout(self.timeout, self.provider.generate(request))
            .await
        {
            Ok(result) => result?,
            Err(_) => return Err(LlmError::timeout(self.timeout.as_millis() as u64)),
        };

        let parsed_object = extract_object(&response.text);
        let cost = self.pricing.estimate(&response.usage);

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            input = response.usage.input,
            thinking = response.usage.thinking,
            output = response.usage.output,
            cost = %cost.total_cost,
            parsed = parsed_object.is_some(),
            "LLM call complete"
        );

        Ok(LlmEnvelope {
            parsed_object,
            text: response.text,
            model: response.model,
            usage: response.usage,
            cost,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
