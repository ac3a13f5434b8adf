//! Fixed-window per-tenant rate limiting (C4).
//!
//! Deliberately a fixed window, not a token bucket: one counter per
//! `(tenant, window-start)`, incremented atomically and TTL'd to the window
//! length so a stale window key simply expires rather than needing active
//! cleanup. A `None` ceiling disables rate limiting for that tenant.

use gateway_resilience::DistributedCache;
use std::time::Duration;

/// Window length for the fixed-window counter.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    /// Request admitted; running count for the window included for
    /// observability.
    Allow {
        /// Requests counted in the current window, including this one.
        count: u32,
    },
    /// Ceiling exceeded for the current window.
    Deny {
        /// Seconds remaining until the window resets.
        retry_after_secs: u64,
        /// The ceiling that was exceeded.
        limit: u32,
    },
}

fn window_key(tenant_id: i64, now_unix: u64) -> (String, u64) {
    let window_start = now_unix - (now_unix % WINDOW.as_secs());
    (format!("ratelimit:tenant:{tenant_id}:{window_start}"), window_start)
}

/// Check and increment the fixed window counter for `tenant_id`. `limit ==
/// None` always allows. Caching backend errors degrade to allow — a rate
/// limiter that fails closed on infrastructure hiccups would turn a cache
/// outage into a full outage, which the resolver's graceful-degradation
/// policy explicitly avoids.
pub async fn check(
    cache: &DistributedCache,
    tenant_id: i64,
    limit: Option<u32>,
    now_unix: u64,
) -> RateLimitDecision {
    let Some(limit) = limit else {
        return RateLimitDecision::Allow { count: 0 };
    };

    let (key, window_start) = window_key(tenant_id, now_unix);
    let current: gateway_resilience::CacheLookup<u32> = cache.get_typed(&key).await;
    let count = match current {
        gateway_resilience::CacheLookup::Hit(n) => n,
        _ => 0,
    };

    let next = count + 1;
    if next > limit {
        let window_end = window_start + WINDOW.as_secs();
        return RateLimitDecision::Deny {
            retry_after_secs: window_end.saturating_sub(now_unix),
            limit,
        };
    }

    cache.set_typed(&key, &next, WINDOW).await;
    RateLimitDecision::Allow { count: next }
}
