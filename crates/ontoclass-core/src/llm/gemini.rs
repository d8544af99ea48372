//! Google Gemini provider using the `generateContent` endpoint.
//!
//! Gemini reports reasoning either as `thoughtsTokenCount` or only implicitly:
//! the grand total exceeds prompt + candidates by the thinking spend.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use super::usage::UsageTokens;
use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub(crate) const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider.
pub struct GeminiProvider {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn generate_url(&self) -> String {
        let model = self.model.trim();
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    /// Set on thought-summary parts, which are not part of the answer
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    thought: bool,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

// --- Response types ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
    total_token_count: Option<u64>,
    thoughts_token_count: Option<u64>,
}

impl UsageMetadata {
    fn into_tokens(self) -> UsageTokens {
        let thinking = self.thoughts_token_count.unwrap_or_else(|| {
            self.total_token_count
                .unwrap_or(0)
                .saturating_sub(self.prompt_token_count + self.candidates_token_count)
        });
        UsageTokens {
            input: self.prompt_token_count,
            thinking,
            output: self.candidates_token_count,
            reported_total: self.total_token_count,
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = Instant::now();

        let generation_config = GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_output_tokens,
            thinking_config: request.reasoning_effort.map(|effort| ThinkingConfig {
                thinking_budget: effort.thinking_budget(),
            }),
        };
        let has_generation_config = generation_config.temperature.is_some()
            || generation_config.max_output_tokens.is_some()
            || generation_config.thinking_config.is_some();

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt.clone()),
                    thought: false,
                }],
            }],
            generation_config: has_generation_config.then_some(generation_config),
        };

        let resp = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::transport("Gemini request failed", e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::http(
                status.as_u16(),
                format!("Gemini HTTP {status}: {text}"),
            ));
        }

        let gen_resp: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::transport("Failed to parse Gemini response", e))?;

        let text = gen_resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.is_empty() {
            tracing::debug!("Gemini returned no candidate text");
        }

        Ok(LlmResponse {
            text: text.trim().to_string(),
            model: gen_resp.model_version.unwrap_or_else(|| self.model.clone()),
            usage: gen_resp.usage_metadata.unwrap_or_default().into_tokens(),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::ReasoningEffort;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_derives_thinking_from_total() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-pro:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "classify"}]}],
                "generationConfig": {"thinkingConfig": {"thinkingBudget": 24576}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"ok\": true}\n"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {
                    "promptTokenCount": 1000,
                    "candidatesTokenCount": 200,
                    "totalTokenCount": 1800
                },
                "modelVersion": "gemini-2.5-pro"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("test-key", "models/gemini-2.5-pro")
            .with_base_url(&format!("{}/", server.uri()));
        let request =
            LlmRequest::new("classify").with_reasoning_effort(Some(ReasoningEffort::High));
        let response = provider.generate(&request).await.unwrap();

        assert_eq!(response.text, "{\"ok\": true}");
        assert_eq!(response.usage.input, 1000);
        assert_eq!(response.usage.output, 200);
        assert_eq!(response.usage.thinking, 600);
        assert_eq!(response.usage.total(), 1800);
    }

    #[tokio::test]
    async fn test_generate_prefers_reported_thoughts_and_skips_thought_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"text": "thinking out loud", "thought": true},
                        {"text": "answer"}
                    ]}
                }],
                "usageMetadata": {
                    "promptTokenCount": 10,
                    "candidatesTokenCount": 5,
                    "totalTokenCount": 40,
                    "thoughtsTokenCount": 25
                }
            })))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("k", "gemini-2.5-pro").with_base_url(&server.uri());
        let response = provider.generate(&LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "answer");
        assert_eq!(response.usage.thinking, 25);
        assert_eq!(response.model, "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_no_candidates_yield_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("k", "gemini-2.5-pro").with_base_url(&server.uri());
        let response = provider.generate(&LlmRequest::new("hi")).await.unwrap();
        assert_eq!(response.text, "");
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let provider = GeminiProvider::new("k", "gemini-2.5-pro").with_base_url(&server.uri());
        let err = provider.generate(&LlmRequest::new("hi")).await.unwrap_err();
        assert_eq!(err.status_code, Some(503));
    }

    #[test]
    fn test_usage_saturates_when_total_missing() {
        let usage = UsageMetadata {
            prompt_token_count: 10,
            candidates_token_count: 5,
            total_token_count: None,
            thoughts_token_count: None,
        }
        .into_tokens();
        assert_eq!(usage.thinking, 0);
        assert_eq!(usage.total(), 15);
    }
}
