//! Anthropic LLM provider using the Messages API.
//!
//! Extended thinking is enabled when the request carries a reasoning effort.
//! The Messages API folds thinking tokens into `output_tokens`, so the
//! thinking bucket stays zero and everything is billed as output.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use super::usage::UsageTokens;
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub(crate) const ANTHROPIC_MESSAGES_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic provider using the Messages API.
pub struct AnthropicProvider {
    api_key: String,
    model: String,
    max_tokens: u32,
    endpoint: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(api_key: &str, model: &str, max_tokens: u32) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            max_tokens,
            endpoint: ANTHROPIC_MESSAGES_ENDPOINT.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

// --- Request types ---

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<Thinking>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct Thinking {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

// --- Response types ---

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    model: String,
    usage: Usage,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(rename = "type")]
    kind: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        let thinking = request.reasoning_effort.map(|effort| Thinking {
            kind: "enabled",
            budget_tokens: effort.thinking_budget(),
        });
        // max_tokens must exceed the thinking budget
        let max_tokens = match &thinking {
            Some(t) => request
                .max_output_tokens
                .unwrap_or(self.max_tokens)
                .max(t.budget_tokens + 1024),
            None => request.max_output_tokens.unwrap_or(self.max_tokens),
        };
        // temperature is rejected alongside extended thinking
        let temperature = if thinking.is_some() {
            None
        } else {
            request.temperature
        };

        let body = MessagesRequest {
            model: self.model.clone(),
            max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            temperature,
            thinking,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::transport("Anthropic request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::http(
                status.as_u16(),
                format!("Anthropic HTTP {status}: {text}"),
            ));
        }

        let messages_resp: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::transport("Failed to parse Anthropic response", e))?;

        let text = messages_resp
            .content
            .into_iter()
            .filter(|c| c.kind == "text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        let text = text.trim().to_string();
        if text.is_empty() {
            tracing::debug!("Anthropic returned no text content");
        }

        Ok(LlmResponse {
            text,
            model: messages_resp.model,
            usage: UsageTokens::new(
                messages_resp.usage.input_tokens,
                0,
                messages_resp.usage.output_tokens,
            ),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
