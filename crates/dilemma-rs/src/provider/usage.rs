//! Token usage and cost accounting across gateway calls.
//!
//! Every successful completion records its vendor-reported token counts
//! against the calling family and model. Costs are rough estimates for
//! keeping an eye on long benchmark runs, not billing.

use super::TokenUsage;
use crate::catalog::ProviderFamily;
use std::collections::BTreeMap;

/// Per-model pricing for cost estimation (USD per 1M tokens).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub fn estimate_cost(&self, prompt_tokens: u32, completion_tokens: u32) -> f64 {
        (prompt_tokens as f64 / 1_000_000.0) * self.input_per_million
            + (completion_tokens as f64 / 1_000_000.0) * self.output_per_million
    }
}

impl Default for ModelPricing {
    fn default() -> Self {
        Self {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }
    }
}

const fn pricing(input_per_million: f64, output_per_million: f64) -> ModelPricing {
    ModelPricing {
        input_per_million,
        output_per_million,
    }
}

/// Approximate list pricing for a model id.
///
/// More specific names are checked first (`gpt-4o-mini` before `gpt-4o`,
/// `flash-lite` before `flash`).
pub fn pricing_for_model(model: &str) -> ModelPricing {
    let name = model.rsplit('/').next().unwrap_or(model).to_lowercase();

    if name.contains("opus-4-5") {
        pricing(5.0, 25.0)
    } else if name.contains("opus") {
        pricing(15.0, 75.0)
    } else if name.contains("sonnet") {
        pricing(3.0, 15.0)
    } else if name.contains("haiku-4") {
        pricing(1.0, 5.0)
    } else if name.contains("haiku") {
        pricing(0.8, 4.0)
    } else if name.contains("4o-mini") {
        pricing(0.15, 0.60)
    } else if name.contains("gpt-4.1") {
        pricing(2.0, 8.0)
    } else if name.contains("gpt-4o") {
        pricing(2.50, 10.0)
    } else if name.contains("gpt-4-turbo") {
        pricing(10.0, 30.0)
    } else if name.contains("gpt-4") {
        pricing(30.0, 60.0)
    } else if name.contains("gpt-3.5") {
        pricing(0.50, 1.50)
    } else if name.starts_with("o1-mini") {
        pricing(1.10, 4.40)
    } else if name.starts_with("o1") {
        pricing(15.0, 60.0)
    } else if name.starts_with("o3") {
        pricing(2.0, 8.0)
    } else if name.contains("gemini") && name.contains("flash-lite") {
        pricing(0.10, 0.40)
    } else if name.contains("gemini-2.5-flash") {
        pricing(0.30, 2.50)
    } else if name.contains("gemini") && name.contains("flash") {
        pricing(0.10, 0.40)
    } else if name.contains("gemini") {
        pricing(1.25, 10.0)
    } else {
        ModelPricing::default()
    }
}

/// Totals for one provider family.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FamilyUsage {
    pub requests: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub estimated_cost_usd: f64,
}

impl FamilyUsage {
    pub fn total_tokens(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Cumulative usage, keyed by family and then model id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsageTracker {
    models: BTreeMap<(ProviderFamily, String), FamilyUsage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, family: ProviderFamily, model_id: &str, usage: TokenUsage) {
        let entry = self
            .models
            .entry((family, model_id.to_string()))
            .or_default();
        entry.requests += 1;
        entry.prompt_tokens += u64::from(usage.prompt_tokens);
        entry.completion_tokens += u64::from(usage.completion_tokens);
        entry.estimated_cost_usd += pricing_for_model(model_id)
            .estimate_cost(usage.prompt_tokens, usage.completion_tokens);
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Per-model totals in family then model order.
    pub fn models(&self) -> impl Iterator<Item = (ProviderFamily, &str, &FamilyUsage)> {
        self.models
            .iter()
            .map(|((family, model), usage)| (*family, model.as_str(), usage))
    }

    /// Totals for one family across all of its models.
    pub fn family(&self, family: ProviderFamily) -> FamilyUsage {
        self.models()
            .filter(|(f, _, _)| *f == family)
            .fold(FamilyUsage::default(), |mut acc, (_, _, u)| {
                acc.requests += u.requests;
                acc.prompt_tokens += u.prompt_tokens;
                acc.completion_tokens += u.completion_tokens;
                acc.estimated_cost_usd += u.estimated_cost_usd;
                acc
            })
    }

    pub fn total(&self) -> FamilyUsage {
        ProviderFamily::PRIORITY
            .into_iter()
            .map(|f| self.family(f))
            .fold(FamilyUsage::default(), |mut acc, u| {
                acc.requests += u.requests;
                acc.prompt_tokens += u.prompt_tokens;
                acc.completion_tokens += u.completion_tokens;
                acc.estimated_cost_usd += u.estimated_cost_usd;
                acc
            })
    }

    /// Format as a short summary string.
    pub fn summary(&self) -> String {
        let total = self.total();
        format!(
            "requests: {}, tokens: {} prompt + {} completion = {} total, est. cost: ${:.4}",
            total.requests,
            total.prompt_tokens,
            total.completion_tokens,
            total.total_tokens(),
            total.estimated_cost_usd,
        )
    }
}
