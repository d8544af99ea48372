//! Scripted provider shared by unit tests.

use super::provider::{LlmProvider, LlmRequest, LlmResponse};
use super::usage::UsageTokens;
use crate::error::LlmError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

type ResponseFn = Box<dyn Fn(u32, &LlmRequest) -> Result<String, LlmError> + Send + Sync>;

/// A configurable mock LLM provider.
///
/// Each call to `generate()` invokes the response factory with the current
/// call index, allowing tests to return different results per attempt.
pub(crate) struct MockProvider {
    response_fn: ResponseFn,
    call_count: Arc<AtomicU32>,
    prompts: Arc<Mutex<Vec<String>>>,
    usage: UsageTokens,
}

impl MockProvider {
    pub(crate) fn new(
        response_fn: impl Fn(u32, &LlmRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            response_fn: Box::new(response_fn),
            call_count: Arc::new(AtomicU32::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
            usage: UsageTokens::new(1_000, 200, 100),
        }
    }

    /// Always answer with the same text.
    pub(crate) fn always(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// Answer with `texts[i]` on call `i`, repeating the last entry.
    pub(crate) fn sequence(texts: &[&str]) -> Self {
        let texts: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        Self::new(move |idx, _| {
            let i = (idx as usize).min(texts.len() - 1);
            Ok(texts[i].clone())
        })
    }

    /// Every call fails with this error.
    pub(crate) fn failing(error: LlmError) -> Self {
        Self::new(move |_, _| Err(error.clone()))
    }

    pub(crate) fn with_usage(mut self, usage: UsageTokens) -> Self {
        self.usage = usage;
        self
    }

    /// Shared handle to the call counter (clone before moving the provider).
    pub(crate) fn call_count_handle(&self) -> Arc<AtomicU32> {
        self.call_count.clone()
    }

    /// Shared handle to the prompts received so far.
    pub(crate) fn prompts_handle(&self) -> Arc<Mutex<Vec<String>>> {
        self.prompts.clone()
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt.clone());
        let text = (self.response_fn)(idx, request)?;
        Ok(LlmResponse {
            text,
            model: "mock-v1".to_string(),
            usage: self.usage,
            latency_ms: 1,
        })
    }
}
