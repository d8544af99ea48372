//! Token usage and cost accounting.
//!
//! Providers report usage in their own shapes; each provider maps it into
//! [`UsageTokens`] before anything here runs. The pricing model is tiered:
//! prompts above a threshold switch both the input and the output rate.
//!
//! Amounts are kept as whole micro-units of the currency so the total is the
//! exact sum of its parts and formats without float artifacts.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::ops::Add;

/// Token counts for one LLM call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTokens {
    /// Prompt tokens
    pub input: u64,
    /// Reasoning tokens, billed at the output rate
    pub thinking: u64,
    /// Visible completion tokens
    pub output: u64,
    /// Grand total as reported by the provider, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_total: Option<u64>,
}

impl UsageTokens {
    pub fn new(input: u64, thinking: u64, output: u64) -> Self {
        Self {
            input,
            thinking,
            output,
            reported_total: None,
        }
    }

    /// Tokens billed at the output rate.
    pub fn billable_output(&self) -> u64 {
        self.thinking + self.output
    }

    /// Provider total when reported, otherwise the sum of the buckets.
    pub fn total(&self) -> u64 {
        self.reported_total
            .unwrap_or(self.input + self.thinking + self.output)
    }

    /// Multi-line summary used in the output table.
    pub fn summary(&self) -> String {
        format!(
            "- input: {}\n- thinking: {}\n- output: {}",
            self.input, self.thinking, self.output
        )
    }
}

impl Add for UsageTokens {
    type Output = UsageTokens;

    fn add(self, rhs: UsageTokens) -> UsageTokens {
        UsageTokens {
            input: self.input + rhs.input,
            thinking: self.thinking + rhs.thinking,
            output: self.output + rhs.output,
            reported_total: None,
        }
    }
}

/// A monetary amount in millionths of the currency unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub struct Money(pub u64);

impl Money {
    pub fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    pub fn micros(&self) -> u64 {
        self.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:06}", self.0 / 1_000_000, self.0 % 1_000_000)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Cost of one LLM call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostEstimate {
    pub input_cost: Money,
    pub output_cost: Money,
    pub total_cost: Money,
    pub currency: String,
}

impl CostEstimate {
    /// A zero cost in the given currency.
    pub fn zero(currency: &str) -> Self {
        Self {
            input_cost: Money::default(),
            output_cost: Money::default(),
            total_cost: Money::default(),
            currency: currency.to_string(),
        }
    }
}

/// Per-million-token rates for one pricing tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRates {
    /// Tokens above which this tier applies
    pub threshold_tokens: u64,
    pub input_per_million: f64,
    pub output_per_million: f64,
}

/// Provider pricing: base rates plus an optional long-context tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingTable {
    pub currency: String,
    pub input_per_million: f64,
    pub output_per_million: f64,
    /// Higher rates for prompts longer than `threshold_tokens`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_context: Option<TierRates>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::flat(1.25, 10.0)
    }
}

impl PricingTable {
    /// Single-tier USD pricing.
    pub fn flat(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            currency: "USD".to_string(),
            input_per_million,
            output_per_million,
            long_context: None,
        }
    }

    /// Add a long-context tier.
    pub fn with_long_context(
        mut self,
        threshold_tokens: u64,
        input_per_million: f64,
        output_per_million: f64,
    ) -> Self {
        self.long_context = Some(TierRates {
            threshold_tokens,
            input_per_million,
            output_per_million,
        });
        self
    }

    /// Rates `(input, output)` per million tokens for a prompt of this size.
    pub fn rates_for(&self, input_tokens: u64) -> (f64, f64) {
        match self.long_context {
            Some(tier) if input_tokens > tier.threshold_tokens => {
                (tier.input_per_million, tier.output_per_million)
            }
            _ => (self.input_per_million, self.output_per_million),
        }
    }

    /// Price a call from its token buckets.
    pub fn estimate(&self, usage: &UsageTokens) -> CostEstimate {
        let (input_rate, output_rate) = self.rates_for(usage.input);
        // tokens * (currency per million tokens) == micro-units of currency
        let input_cost = Money(to_micros(usage.input, input_rate));
        let output_cost = Money(to_micros(usage.billable_output(), output_rate));
        CostEstimate {
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
            currency: self.currency.clone(),
        }
    }
}

fn to_micros(tokens: u64, rate_per_million: f64) -> u64 {
    (tokens as f64 * rate_per_million).round().max(0.0) as u64
}
