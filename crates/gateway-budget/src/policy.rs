//! Policy evaluation (C5).
//!
//! A pure function over already-resolved state: no I/O, no cache, no
//! database. Denies on the tenant budget, the session budget, any `STRICT`
//! tag budget, or the rate limiter; `LENIENT` tags are accounted but never
//! deny; `NONE` tags are ignored entirely. An [`UsageResolution::Undefined`]
//! on a *configured* budget denies — the stricter resolution of the
//! partial-resolution-policy open question. Any single failure denies the
//! whole request; there is no partial admission.

use crate::rate_limit::RateLimitDecision;
use crate::resolver::{ResolvedBudgets, UsageResolution};
use gateway_core::domain::InheritanceMode;

/// Outcome of policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Request may proceed to dispatch.
    Allow,
    /// Request is denied, with a terse operator-safe reason.
    Deny {
        /// Why the request was denied.
        reason: String,
    },
}

impl Decision {
    /// Convenience check.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Evaluate policy for one admission check.
///
/// `estimated_cost` is the pre-dispatch cost estimate (or zero, if the
/// gateway only prices after the fact and evaluates purely on prior usage
/// against the ceiling) used to decide whether *this* request would push a
/// budget over its ceiling.
#[must_use]
pub fn evaluate(
    budgets: &ResolvedBudgets,
    rate_limit: RateLimitDecision,
    estimated_cost: rust_decimal::Decimal,
) -> Decision {
    if let RateLimitDecision::Deny { limit, .. } = rate_limit {
        return Decision::Deny {
            reason: format!("rate limit of {limit} requests/window exceeded"),
        };
    }

    if let Some(tenant) = &budgets.tenant {
        match &tenant.usage {
            UsageResolution::Undefined => {
                return Decision::Deny {
                    reason: "tenant budget usage could not be resolved".to_string(),
                };
            }
            UsageResolution::Known(used) => {
                if *used + estimated_cost >= tenant.limit_usd {
                    return Decision::Deny {
                        reason: "tenant budget exceeded".to_string(),
                    };
                }
            }
        }
    }

    if let Some(session) = &budgets.session {
        match &session.usage {
            UsageResolution::Undefined => {
                return Decision::Deny {
                    reason: "session budget usage could not be resolved".to_string(),
                };
            }
            UsageResolution::Known(used) => {
                if *used + estimated_cost >= session.limit_usd {
                    return Decision::Deny {
                        reason: "session budget exceeded".to_string(),
                    };
                }
            }
        }
    }

    for tag in &budgets.tag_budgets {
        if tag.inheritance_mode == InheritanceMode::None {
            continue;
        }
        let weighted_cost = estimated_cost * tag.weight;
        let over_ceiling = match &tag.usage {
            UsageResolution::Undefined => true,
            UsageResolution::Known(used) => *used + weighted_cost >= tag.limit_usd,
        };

        if over_ceiling && tag.inheritance_mode == InheritanceMode::Strict {
            return Decision::Deny {
                reason: format!("tag {} budget exceeded", tag.tag_id),
            };
        }
        // Lenient: accounted for by the caller's cost split, never denies.
    }

    Decision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{SessionBudgetStatus, TagBudgetStatus, TenantBudgetStatus};
    use gateway_core::domain::Period;
    use rust_decimal_macros::dec;

    fn allow_rate() -> RateLimitDecision {
        RateLimitDecision::Allow { count: 1 }
    }

    #[test]
    fn allows_when_nothing_configured() {
        let budgets = ResolvedBudgets::default();
        let decision = evaluate(&budgets, allow_rate(), dec!(0));
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn denies_on_rate_limit() {
        let budgets = ResolvedBudgets::default();
        let rate = RateLimitDecision::Deny { retry_after_secs: 10, limit: 60 };
        assert!(!evaluate(&budgets, rate, dec!(0)).is_allowed());
    }

    #[test]
    fn denies_when_tenant_budget_would_be_exceeded() {
        let mut budgets = ResolvedBudgets::default();
        budgets.tenant = Some(TenantBudgetStatus {
            limit_usd: dec!(10),
            period: Period::Daily,
            usage: UsageResolution::Known(dec!(9.5)),
        });
        let decision = evaluate(&budgets, allow_rate(), dec!(1));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn denies_when_tenant_usage_is_undefined() {
        let mut budgets = ResolvedBudgets::default();
        budgets.tenant = Some(TenantBudgetStatus {
            limit_usd: dec!(10),
            period: Period::Daily,
            usage: UsageResolution::Undefined,
        });
        let decision = evaluate(&budgets, allow_rate(), dec!(0));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn denies_when_session_budget_would_be_exceeded() {
        let mut budgets = ResolvedBudgets::default();
        budgets.session = Some(SessionBudgetStatus {
            limit_usd: dec!(5),
            usage: UsageResolution::Known(dec!(5)),
        });
        let decision = evaluate(&budgets, allow_rate(), dec!(0.01));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn strict_tag_over_budget_denies() {
        let mut budgets = ResolvedBudgets::default();
        budgets.tag_budgets.push(TagBudgetStatus {
            tag_id: 1,
            inheritance_mode: InheritanceMode::Strict,
            weight: dec!(1.0),
            limit_usd: dec!(1),
            period: Period::Daily,
            usage: UsageResolution::Known(dec!(1)),
        });
        let decision = evaluate(&budgets, allow_rate(), dec!(0.01));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn lenient_tag_over_budget_never_denies() {
        let mut budgets = ResolvedBudgets::default();
        budgets.tag_budgets.push(TagBudgetStatus {
            tag_id: 2,
            inheritance_mode: InheritanceMode::Lenient,
            weight: dec!(1.0),
            limit_usd: dec!(1),
            period: Period::Daily,
            usage: UsageResolution::Known(dec!(5)),
        });
        let decision = evaluate(&budgets, allow_rate(), dec!(0.01));
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn none_mode_tag_is_ignored_entirely() {
        let mut budgets = ResolvedBudgets::default();
        budgets.tag_budgets.push(TagBudgetStatus {
            tag_id: 3,
            inheritance_mode: InheritanceMode::None,
            weight: dec!(1.0),
            limit_usd: dec!(1),
            period: Period::Daily,
            usage: UsageResolution::Undefined,
        });
        let decision = evaluate(&budgets, allow_rate(), dec!(0.01));
        assert_eq!(decision, Decision::Allow);
    }
}
