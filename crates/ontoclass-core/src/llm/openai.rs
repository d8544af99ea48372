//! OpenAI LLM provider using the Chat Completions API.
//!
//! Reasoning models report their hidden reasoning inside
//! `completion_tokens_details.reasoning_tokens`, which is already included in
//! `completion_tokens`; the visible output bucket is the difference.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use super::usage::UsageTokens;
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub(crate) const OPENAI_CHAT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI provider using Chat Completions API.
pub struct OpenAiProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiProvider {
    /// Create against a Chat Completions endpoint (OpenAI or a compatible gateway).
    pub fn with_endpoint(api_key: &str, model: &str, endpoint: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: String,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    total_tokens: Option<u64>,
    completion_tokens_details: Option<CompletionDetails>,
}

#[derive(Deserialize)]
struct CompletionDetails {
    reasoning_tokens: Option<u64>,
}

impl ChatUsage {
    fn into_tokens(self) -> UsageTokens {
        let reasoning = self
            .completion_tokens_details
            .and_then(|d| d.reasoning_tokens)
            .unwrap_or(0);
        UsageTokens {
            input: self.prompt_tokens,
            thinking: reasoning,
            output: self.completion_tokens.saturating_sub(reasoning),
            reported_total: self.total_tokens,
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            reasoning_effort: request.reasoning_effort.map(|e| e.as_str().to_string()),
            max_completion_tokens: request.max_output_tokens,
            temperature: request.temperature,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::transport("OpenAI request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::http(
                status.as_u16(),
                format!("OpenAI HTTP {status}: {text}"),
            ));
        }

        let chat_resp: ChatResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::transport("Failed to parse OpenAI response", e))?;

        // no content is an unusable answer, not a failed call
        let text = chat_resp
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();
        if text.is_empty() {
            tracing::debug!("OpenAI returned no content");
        }

        Ok(LlmResponse {
            text: text.trim().to_string(),
            model: chat_resp.model,
            usage: chat_resp.usage.unwrap_or_default().into_tokens(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ReasoningEffort;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_maps_text_and_reasoning_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "gpt-5",
                "reasoning_effort": "high",
                "messages": [{"role": "user", "content": "hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-5-2025-08-07",
                "choices": [{"message": {"role": "assistant", "content": "  {\"a\": 1}  "}}],
                "usage": {
                    "prompt_tokens": 120,
                    "completion_tokens": 500,
                    "total_tokens": 620,
                    "completion_tokens_details": {"reasoning_tokens": 448}
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_endpoint(
            "test-key",
            "gpt-5",
            &format!("{}/v1/chat/completions", server.uri()),
        );
        let request = LlmRequest::new("hello").with_reasoning_effort(Some(ReasoningEffort::High));
        let response = provider.generate(&request).await.unwrap();

        assert_eq!(response.text, "{\"a\": 1}");
        assert_eq!(response.model, "gpt-5-2025-08-07");
        assert_eq!(response.usage.input, 120);
        assert_eq!(response.usage.thinking, 448);
        assert_eq!(response.usage.output, 52);
        assert_eq!(response.usage.total(), 620);
    }

    #[tokio::test]
    async fn test_generate_without_usage_defaults_to_zero() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-5",
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_endpoint("k", "gpt-5", &server.uri());
        let response = provider.generate(&LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.usage, UsageTokens::default());
    }

    #[tokio::test]
    async fn test_http_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_endpoint("k", "gpt-5", &server.uri());
        let err = provider.generate(&LlmRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.status_code, Some(429));
        assert!(err.message.contains("slow down"));
    }

    #[tokio::test]
    async fn test_empty_choices_yield_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"model": "gpt-5", "choices": []})),
            )
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_endpoint("k", "gpt-5", &server.uri());
        let response = provider.generate(&LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "");
    }

    #[tokio::test]
    async fn test_null_content_yields_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-5",
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::with_endpoint("k", "gpt-5", &server.uri());
        let response = provider.generate(&LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "");
    }

    #[tokio::test]
    async fn test_refused_connection_is_transient() {
        // nothing listens on the discard port
        let provider =
            OpenAiProvider::with_endpoint("k", "gpt-5", "http://127.0.0.1:9/v1/chat/completions");
        let err = provider.generate(&LlmRequest::new("hi")).await.unwrap_err();
        assert!(err.transient);
        assert_eq!(err.status_code, None);
    }
}
