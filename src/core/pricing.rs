//! Per-model pricing and cost calculation for tracked usage.
//!
//! Rates are USD per 1,000 tokens, keyed by (provider, model). Lookups never
//! fail: unknown combinations bill at a flat default rate.

use std::collections::HashMap;

use crate::core::provider::RequestType;

/// Flat rate (USD per 1K tokens) for unknown (provider, model) pairs.
pub const DEFAULT_RATE_PER_THOUSAND: f64 = 0.001;

/// Per-1K token pricing for a specific model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    /// Cost per thousand input tokens (USD).
    pub input_per_thousand: f64,
    /// Cost per thousand output tokens (USD).
    pub output_per_thousand: f64,
}

impl ModelRate {
    #[must_use]
    pub const fn new(input_per_thousand: f64, output_per_thousand: f64) -> Self {
        Self {
            input_per_thousand,
            output_per_thousand,
        }
    }

    /// Rate for the given billing direction.
    #[must_use]
    pub const fn rate_for(&self, request_type: RequestType) -> f64 {
        match request_type {
            RequestType::Input => self.input_per_thousand,
            RequestType::Output => self.output_per_thousand,
        }
    }
}

/// Collection of model rates.
#[derive(Debug, Clone)]
pub struct PricingTable {
    /// `(provider, model)` to rate, both keys normalized lowercase.
    models: HashMap<(String, String), ModelRate>,
    default_per_thousand: f64,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PricingTable {
    /// Table with the built-in OpenAI and Gemini rates.
    #[must_use]
    pub fn builtin() -> Self {
        let mut table = Self {
            models: HashMap::new(),
            default_per_thousand: DEFAULT_RATE_PER_THOUSAND,
        };

        // OpenAI
        table.insert("openai", "gpt-3.5-turbo", ModelRate::new(0.0015, 0.002));
        table.insert("openai", "gpt-4", ModelRate::new(0.03, 0.06));

        // Google Gemini
        table.insert("gemini", "gemini-pro", ModelRate::new(0.000_125, 0.000_375));
        table.insert(
            "gemini",
            "gemini-pro-vision",
            ModelRate::new(0.000_25, 0.000_75),
        );

        table
    }

    /// Add or replace a model rate.
    pub fn insert(&mut self, provider: &str, model: &str, rate: ModelRate) {
        self.models
            .insert((provider.to_lowercase(), model.to_lowercase()), rate);
    }

    /// Override the fallback rate for unknown models.
    #[must_use]
    pub const fn with_default_rate(mut self, per_thousand: f64) -> Self {
        self.default_per_thousand = per_thousand;
        self
    }

    /// Fallback rate for unknown models.
    #[must_use]
    pub const fn default_rate(&self) -> f64 {
        self.default_per_thousand
    }

    /// Look up a model rate (case-insensitive).
    #[must_use]
    pub fn get(&self, provider: &str, model: &str) -> Option<&ModelRate> {
        self.models
            .get(&(provider.to_lowercase(), model.to_lowercase()))
    }

    /// Cost in USD of `tokens` tokens.
    ///
    /// Unknown (provider, model) pairs bill at the default rate regardless of
    /// request type.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cost(&self, provider: &str, model: &str, tokens: u64, request_type: RequestType) -> f64 {
        let rate = self
            .get(provider, model)
            .map_or(self.default_per_thousand, |r| r.rate_for(request_type));
        (tokens as f64 / 1000.0) * rate
    }

    /// Number of known (provider, model) pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
