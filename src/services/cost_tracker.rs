//! Per-model cost estimation.

use std::collections::HashMap;

use crate::domain::models::TokenUsage;

/// Pricing per thousand tokens for a model family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    /// Cost per 1K prompt tokens (USD).
    pub input: f64,
    /// Cost per 1K completion tokens (USD).
    pub output: f64,
}

/// Known model pricing, most specific name first.
const PRICING_TABLE: &[(&str, ModelPricing)] = &[
    ("gpt-4o-mini", ModelPricing { input: 0.000_15, output: 0.000_6 }),
    ("gpt-4o", ModelPricing { input: 0.002_5, output: 0.01 }),
    ("gpt-4-turbo", ModelPricing { input: 0.01, output: 0.03 }),
    ("gpt-4", ModelPricing { input: 0.03, output: 0.06 }),
    ("gpt-3.5-turbo", ModelPricing { input: 0.000_5, output: 0.001_5 }),
];

/// Get pricing for a model by name.
///
/// Matches known name substrings, so `gpt-4o-2024-08-06` is priced as `gpt-4o`.
pub fn get_model_pricing(model: &str) -> Option<ModelPricing> {
    let model_lower = model.to_lowercase();
    PRICING_TABLE
        .iter()
        .find(|(name, _)| model_lower.contains(name))
        .map(|(_, pricing)| *pricing)
}

/// Estimate cost in USD; `None` for models without pricing.
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> Option<f64> {
    let pricing = get_model_pricing(model)?;
    Some(
        (usage.prompt as f64 * pricing.input + usage.completion as f64 * pricing.output) / 1000.0,
    )
}

/// Accumulated cost of several calls.
#[derive(Debug, Clone, Default)]
pub struct CostSummary {
    /// Total cost in USD of priced calls.
    pub total_usd: f64,
    pub by_model: HashMap<String, f64>,
    pub usage: TokenUsage,
    /// Calls whose model has no known pricing.
    pub unpriced_calls: u32,
}

impl CostSummary {
    pub fn record(&mut self, model: &str, usage: &TokenUsage) {
        self.usage = self.usage + *usage;
        match estimate_cost(model, usage) {
            Some(cost) => {
                self.total_usd += cost;
                *self.by_model.entry(model.to_string()).or_insert(0.0) += cost;
            }
            None => self.unpriced_calls += 1,
        }
    }
}
