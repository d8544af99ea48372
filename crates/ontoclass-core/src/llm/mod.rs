//! LLM integration for zero-shot classification.
//!
//! Provides a provider abstraction over OpenAI, Gemini and Anthropic, a
//! request client that turns one call into a parsed object plus usage and
//! cost, and the retry helpers the classifier uses between attempts.

pub(crate) mod anthropic;
pub mod client;
pub mod extract;
pub(crate) mod gemini;
#[cfg(test)]
pub(crate) mod mock;
pub(crate) mod openai;
pub mod provider;
pub(crate) mod retry;
pub mod usage;

pub use client::{LlmEnvelope, RequestClient};
pub use extract::extract_object;
pub use provider::{LlmProvider, LlmProviderFactory, LlmRequest, LlmResponse, ReasoningEffort};
pub use usage::{CostEstimate, Money, PricingTable, TierRates, UsageTokens};
