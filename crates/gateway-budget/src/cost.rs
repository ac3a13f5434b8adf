//! Deterministic Decimal cost computation (C6).
//!
//! `cost = prompt_tokens * input_price / 1e6
//!       + cached_prompt_tokens * cached_input_price / 1e6
//!       + completion_tokens * output_price / 1e6`
//!
//! All arithmetic is [`Decimal`], never floating-point, so two gateway
//! instances pricing the same usage always agree to the last digit.

use gateway_core::domain::ModelPricing;
use rust_decimal::Decimal;
use tracing::warn;

/// Token counts to price. `cached_prompt_tokens` is a subset accounting
/// split of `prompt_tokens`, not an addition to it — callers must not
/// double count.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageTokens {
    /// Total prompt tokens billed at `input_price`, minus any cached
    /// portion already billed at `cached_input_price`.
    pub prompt_tokens: i64,
    /// Prompt tokens served from the provider's own cache, billed at
    /// `cached_input_price`.
    pub cached_prompt_tokens: i64,
    /// Completion tokens billed at `output_price`.
    pub completion_tokens: i64,
}

impl UsageTokens {
    /// Clamp any negative token count (a malformed upstream response) to
    /// zero rather than let it discount the bill.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            prompt_tokens: self.prompt_tokens.max(0),
            cached_prompt_tokens: self.cached_prompt_tokens.max(0),
            completion_tokens: self.completion_tokens.max(0),
        }
    }
}

const PER_MILLION: i64 = 1_000_000;

/// Price `usage` against `pricing`. Returns `Decimal::ZERO` and logs a
/// warning if `pricing` is `None` (model unknown to the pricing table);
/// never errors, per the cost model's "unknown model never blocks a
/// response" rule — an unpriced call is accounted as free and flagged for
/// operator follow-up rather than failing the request.
#[must_use]
pub fn compute_cost(model: &str, usage: UsageTokens, pricing: Option<&ModelPricing>) -> Decimal {
    let Some(pricing) = pricing else {
        warn!(%model, "no pricing row for model, billing as zero cost");
        return Decimal::ZERO;
    };

    let usage = usage.clamped();
    let million = Decimal::from(PER_MILLION);

    let prompt_cost = Decimal::from(usage.prompt_tokens) * pricing.input_price / million;
    let cached_cost =
        Decimal::from(usage.cached_prompt_tokens) * pricing.cached_input_price / million;
    let completion_cost = Decimal::from(usage.completion_tokens) * pricing.output_price / million;

    prompt_cost + cached_cost + completion_cost
}
