use tiktoken_rs::{get_bpe_from_model, CoreBPE};

use crate::error::{AppError, Result};

/// Per-1K-token prices used for cost estimates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        // gpt-4o list prices
        Self {
            input_per_1k: 0.005,
            output_per_1k: 0.015,
        }
    }
}

/// Token counts and cost estimates for one model's tokenizer.
pub struct TokenAccountant {
    model: String,
    bpe: CoreBPE,
    pricing: Pricing,
}

impl TokenAccountant {
    /// Loads the tokenizer for `model`. Fails if tiktoken has no encoding for it.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = get_bpe_from_model(model)
            .map_err(|e| AppError::Tokenizer(format!("{}: {}", model, e)))?;
        Ok(Self {
            model: model.to_string(),
            bpe,
            pricing: Pricing::default(),
        })
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn count_tokens(&self, text: &str) -> u64 {
        self.bpe.encode_with_special_tokens(text).len() as u64
    }

    pub fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        estimate_cost(&self.pricing, input_tokens, output_tokens)
    }
}

impl std::fmt::Debug for TokenAccountant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAccountant")
            .field("model", &self.model)
            .field("pricing", &self.pricing)
            .finish()
    }
}

/// `(in * rate_in + out * rate_out) / 1000`, rounded to four decimal places.
pub fn estimate_cost(pricing: &Pricing, input_tokens: u64, output_tokens: u64) -> f64 {
    let raw = (input_tokens as f64 * pricing.input_per_1k
        + output_tokens as f64 * pricing.output_per_1k)
        / 1000.0;
    (raw * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_is_deterministic() {
        let accountant = TokenAccountant::for_model("gpt-4o").unwrap();
        let text = "The Reserve Bank kept the repo rate unchanged at 6.5%.";
        let first = accountant.count_tokens(text);
        assert!(first > 0);
        for _ in 0..3 {
            assert_eq!(accountant.count_tokens(text), first);
        }
        assert_eq!(accountant.count_tokens(""), 0);
    }

    #[test]
    fn test_unknown_model_is_rejected() {
        assert!(matches!(
            TokenAccountant::for_model("not-a-model"),
            Err(AppError::Tokenizer(_))
        ));
    }

    #[test]
    fn test_cost_of_nothing_is_zero() {
        assert_eq!(estimate_cost(&Pricing::default(), 0, 0), 0.0);
    }

    #[test]
    fn test_cost_matches_rates() {
        // 1000 * 0.005 / 1000 + 2000 * 0.015 / 1000
        assert_eq!(estimate_cost(&Pricing::default(), 1000, 2000), 0.035);
        // (123 * 0.005 + 400 * 0.015) / 1000 = 0.006615
        assert_eq!(estimate_cost(&Pricing::default(), 123, 400), 0.0066);
    }

    #[test]
    fn test_cost_is_monotonic_in_each_argument() {
        let pricing = Pricing::default();
        for fixed in [0u64, 17, 900, 12_000] {
            let mut last_in = 0.0;
            let mut last_out = 0.0;
            for n in (0..5_000u64).step_by(37) {
                let by_input = estimate_cost(&pricing, n, fixed);
                let by_output = estimate_cost(&pricing, fixed, n);
                assert!(by_input >= last_in);
                assert!(by_output >= last_out);
                last_in = by_input;
                last_out = by_output;
            }
        }
    }
}
