//! # Gateway Budget
//!
//! Hierarchical budget resolution, policy evaluation, deterministic cost
//! computation, and the usage event stream/accounting worker pipeline for
//! the LLM Inference Gateway.
//!
//! - [`ledger_key`] — C2: daily/monthly/custom ledger key construction
//! - [`rate_limit`] — C4: fixed-window per-tenant rate limiting
//! - [`resolver`] — C3: hierarchical budget resolution over cache + DB
//! - [`policy`] — C5: pure admission decision function
//! - [`cost`] — C6: Decimal cost computation
//! - [`events`] — C9: the durable, at-least-once usage event stream
//! - [`accounting`] — C10: the idempotent accounting worker
//!
//! Counter mutation lives exclusively in [`accounting`]; nothing upstream
//! (the admission pipeline in `gateway-server`) touches a counter
//! directly — it only calls [`events::EventEmitter::emit`]. This is the
//! resolved answer to the double-counting open question: one writer,
//! reached only after at-least-once delivery and idempotent dedup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod accounting;
pub mod cost;
pub mod events;
pub mod ledger_key;
pub mod policy;
pub mod rate_limit;
pub mod resolver;

pub use accounting::AccountingWorker;
pub use cost::{compute_cost, UsageTokens};
pub use events::{EventEmitter, EventReceiver};
pub use ledger_key::{resolve_key, LedgerKey};
pub use policy::Decision;
pub use rate_limit::{check as check_rate_limit, RateLimitDecision};
pub use resolver::{
    resolve as resolve_budgets, ResolvedBudgets, SessionBudgetStatus, TagBudgetStatus,
    TenantBudgetStatus, UsageResolution,
};
