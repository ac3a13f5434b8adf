//! The admission/accounting data model: tenants, budgets, tags, sessions,
//! and the usage ledger. These are the row types the cache facade, budget
//! resolver, and accounting worker all speak in.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Billing period a [`Budget`] or [`TagBudget`] recurs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Resets every UTC calendar day.
    Daily,
    /// Resets every UTC calendar month.
    Monthly,
    /// Explicit `(start, end]` window, does not recur.
    Custom,
}

/// How a [`TagBudget`] participates in an ancestor's budget resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InheritanceMode {
    /// Consulted for both denial and accounting.
    Strict,
    /// Consulted for accounting only, never denies.
    Lenient,
    /// Not consulted by descendants at all.
    None,
}

/// The principal every other row belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    /// Stable numeric id.
    pub id: i64,
    /// Unique tenant name.
    pub name: String,
    /// Request ceiling for the fixed-window rate limiter; `None` disables
    /// rate limiting for this tenant.
    pub rate_limit_per_minute: Option<u32>,
    /// Fallback session budget applied when a session has no explicit
    /// override.
    pub default_session_budget: Option<Decimal>,
}

/// Bearer credential, unique on `secret`.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Opaque bearer secret. Never logged.
    pub secret: String,
    /// Owning tenant.
    pub tenant_id: i64,
    /// Whether this key currently authenticates.
    pub is_active: bool,
    /// When the key was issued.
    pub created_at: DateTime<Utc>,
    /// Last time this key successfully authenticated a request.
    pub last_used_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("secret", &"<redacted>")
            .field("tenant_id", &self.tenant_id)
            .field("is_active", &self.is_active)
            .finish()
    }
}

/// A monetary ceiling over a tenant's total spend in a given period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    /// Owning tenant.
    pub tenant_id: i64,
    /// Which period this budget recurs on.
    pub period: Period,
    /// Ceiling amount, USD.
    pub amount_usd: Decimal,
    /// Required and only meaningful when `period == Custom`.
    pub start_date: Option<DateTime<Utc>>,
    /// Required and only meaningful when `period == Custom`.
    pub end_date: Option<DateTime<Utc>>,
}

impl Budget {
    /// Validate the daily/monthly/custom date invariants from the data
    /// model: `daily`/`monthly` must not carry dates, `custom` requires
    /// both with `start < end`.
    ///
    /// # Errors
    /// Returns a message describing the violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        match self.period {
            Period::Daily | Period::Monthly => {
                if self.start_date.is_some() || self.end_date.is_some() {
                    return Err(format!(
                        "{:?} budgets must not carry start/end dates",
                        self.period
                    ));
                }
            }
            Period::Custom => match (self.start_date, self.end_date) {
                (Some(start), Some(end)) if start < end => {}
                (Some(_), Some(_)) => return Err("custom budget requires start < end".into()),
                _ => return Err("custom budget requires both start_date and end_date".into()),
            },
        }
        if self.amount_usd < Decimal::ZERO {
            return Err("amount_usd must be non-negative".into());
        }
        Ok(())
    }
}

/// A node in a tenant's per-tenant tag tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    /// Stable id, unique across all tenants.
    pub id: i64,
    /// Owning tenant.
    pub tenant_id: i64,
    /// Display name, unique among siblings under a case-insensitive,
    /// Unicode-folded comparison.
    pub name: String,
    /// Parent tag, or `None` for a root.
    pub parent_id: Option<i64>,
    /// Materialized root-to-leaf path, slash-joined names.
    pub path: String,
    /// Whether this tag currently accepts new traffic.
    pub is_active: bool,
    /// Optional display color.
    pub color: Option<String>,
    /// Optional free-text description.
    pub description: Option<String>,
}

/// A monetary ceiling attached to a [`Tag`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagBudget {
    /// Owning tag.
    pub tag_id: i64,
    /// Which period this budget recurs on.
    pub period: Period,
    /// Ceiling amount, USD.
    pub amount_usd: Decimal,
    /// Multiplier applied to cost when decrementing this budget. Clamped
    /// to `[0.1, 3.0]` by [`TagBudget::validate`].
    pub weight: Decimal,
    /// How descendants consult this budget.
    pub inheritance_mode: InheritanceMode,
    /// Whether this budget is currently enforced.
    pub is_active: bool,
    /// Required and only meaningful when `period == Custom`.
    pub start_date: Option<DateTime<Utc>>,
    /// Required and only meaningful when `period == Custom`.
    pub end_date: Option<DateTime<Utc>>,
}

impl TagBudget {
    /// Validate the weight range and the daily/monthly/custom date
    /// invariants shared with [`Budget`].
    ///
    /// # Errors
    /// Returns a message describing the violated invariant.
    pub fn validate(&self) -> Result<(), String> {
        let min = Decimal::new(1, 1); // 0.1
        let max = Decimal::new(3, 0); // 3.0
        if self.weight < min || self.weight > max {
            return Err(format!("weight must be within [{min}, {max}]"));
        }
        let as_budget = Budget {
            tenant_id: 0,
            period: self.period,
            amount_usd: self.amount_usd,
            start_date: self.start_date,
            end_date: self.end_date,
        };
        as_budget.validate()
    }
}

/// Immutable-by-version pricing row for a single upstream model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Canonical model id, unique.
    pub model: String,
    /// Pricing revision tag, for audit trails only; cost computation
    /// always uses the current row.
    pub version_tag: String,
    /// Price per 1,000,000 input tokens, USD.
    pub input_price: Decimal,
    /// Price per 1,000,000 cached-input tokens, USD.
    pub cached_input_price: Decimal,
    /// Price per 1,000,000 output tokens, USD.
    pub output_price: Decimal,
    /// Serving provider.
    pub provider: String,
}

/// Lifecycle status of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting further requests.
    Active,
    /// `current_cost_usd >= effective_budget_usd`; further requests denied
    /// until an explicit admin reset.
    BudgetExceeded,
    /// Closed normally.
    Completed,
    /// Closed due to an unrecoverable error.
    Error,
}

/// A client-chosen correlation scope for a sequence of inference requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Client-chosen session id.
    pub session_id: String,
    /// Owning tenant.
    pub tenant_id: i64,
    /// Optional display name.
    pub name: Option<String>,
    /// Per-session ceiling; `None` means unbounded (tenant default still
    /// applies if configured — see [`crate::domain::Session::effective_budget`]
    /// equivalent resolution logic in the budget resolver).
    pub effective_budget_usd: Option<Decimal>,
    /// Cumulative cost incurred so far. Always `>= 0`.
    pub current_cost_usd: Decimal,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// When the session was first observed.
    pub created_at: DateTime<Utc>,
    /// Monotonically increasing last-activity timestamp.
    pub last_active_at: DateTime<Utc>,
    /// Total requests attributed to this session.
    pub request_count: u64,
}

impl Session {
    /// Recompute [`SessionStatus`] from `current_cost_usd` against
    /// `effective_budget_usd`, per the data model's invariant.
    #[must_use]
    pub fn recompute_status(&self) -> SessionStatus {
        match (self.status, self.effective_budget_usd) {
            (SessionStatus::Completed | SessionStatus::Error, _) => self.status,
            (_, Some(budget)) if self.current_cost_usd >= budget => SessionStatus::BudgetExceeded,
            // Once exceeded, stays exceeded until an explicit admin reset
            // (monotonicity invariant); this function only ever escalates.
            (SessionStatus::BudgetExceeded, _) => SessionStatus::BudgetExceeded,
            _ => SessionStatus::Active,
        }
    }
}

/// Outcome recorded for a single admission-pipeline pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageOutcome {
    /// Dispatched and priced normally.
    Success,
    /// Denied by the policy engine.
    Blocked,
    /// Upstream or internal failure after authentication.
    Failed,
}

/// An append-only record of a priced (or denied/failed) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageLedgerEntry {
    /// Stable id, used by the accounting worker to dedup re-delivery.
    pub record_id: Uuid,
    /// When the request was admitted.
    pub ts: DateTime<Utc>,
    /// Owning tenant.
    pub tenant_id: i64,
    /// Route the request hit (e.g. `/v1/chat/completions`).
    pub route: String,
    /// Model requested.
    pub model: String,
    /// Prompt tokens, 0 when the request never reached dispatch.
    pub prompt_tokens: u32,
    /// Completion tokens, 0 when the request never reached dispatch.
    pub completion_tokens: u32,
    /// Priced cost, USD; 0 for `blocked`/`failed` outcomes.
    pub usd: Decimal,
    /// Session this request was attributed to, when any.
    pub session_id: Option<String>,
    /// Request outcome.
    pub outcome: UsageOutcome,
    /// Tag ids attached to this request, with their effective weight
    /// (tag-own weight × tag-use weight) at the time of pricing.
    pub tag_weights: HashMap<i64, Decimal>,
}

/// A running monetary total for one `(scope, period, window)` triple.
/// Counters are monotonic increment-only in steady state; decrement is an
/// administrative rollback path invoked outside the admission pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Counter {
    /// Current total, USD.
    pub total_usd: Decimal,
}

impl Counter {
    /// A zeroed counter.
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            total_usd: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_budget_rejects_explicit_dates() {
        let budget = Budget {
            tenant_id: 1,
            period: Period::Daily,
            amount_usd: Decimal::new(100, 0),
            start_date: Some(Utc::now()),
            end_date: None,
        };
        assert!(budget.validate().is_err());
    }

    #[test]
    fn custom_budget_requires_start_before_end() {
        let now = Utc::now();
        let budget = Budget {
            tenant_id: 1,
            period: Period::Custom,
            amount_usd: Decimal::new(100, 0),
            start_date: Some(now),
            end_date: Some(now),
        };
        assert!(budget.validate().is_err());
    }

    #[test]
    fn tag_budget_weight_out_of_range_is_rejected() {
        let tag_budget = TagBudget {
            tag_id: 1,
            period: Period::Monthly,
            amount_usd: Decimal::new(50, 0),
            weight: Decimal::new(5, 0),
            inheritance_mode: InheritanceMode::Strict,
            is_active: true,
            start_date: None,
            end_date: None,
        };
        assert!(tag_budget.validate().is_err());
    }

    #[test]
    fn session_status_is_sticky_once_exceeded() {
        let session = Session {
            session_id: "s1".into(),
            tenant_id: 1,
            name: None,
            effective_budget_usd: Some(Decimal::new(10, 0)),
            current_cost_usd: Decimal::new(1, 0),
            status: SessionStatus::BudgetExceeded,
            created_at: Utc::now(),
            last_active_at: Utc::now(),
            request_count: 3,
        };
        assert_eq!(session.recompute_status(), SessionStatus::BudgetExceeded);
    }
}
