//! Hierarchical budget resolution (C3).
//!
//! One [`DistributedCache::multi_get`] batch covers everything whose cache
//! key is knowable from the caller's inputs alone: the tenant's budget and
//! both its daily/monthly counters, the session row, the tenant's default
//! session budget, the tenant's full tag list, and the directly-tagged
//! (leaf) tags' own budget configs and counters. The tag list lets the
//! ancestor walk run entirely in memory against that single batch instead
//! of one cache round trip per hop. Ancestors beyond the leaves — rare, and
//! bounded by [`MAX_TAG_DEPTH`] — resolve straight from the database rather
//! than issuing a second batch; the database write-back still warms the
//! cache for the next request. A configured budget whose usage could not
//! be resolved after a cache miss and DB timeout comes back
//! [`UsageResolution::Undefined`] rather than silently defaulting to zero
//! usage — see the partial-resolution-policy decision in this crate's
//! design notes.

use gateway_core::domain::{Budget, InheritanceMode, Period, Session, Tag, TagBudget};
use gateway_resilience::{CacheLookup, DistributedCache};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::any::AnyPool;
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::warn;

use crate::ledger_key::{resolve_key, LedgerKey};

/// Ancestor walks never exceed this many hops, guarding against a cyclic
/// or pathologically deep tag tree.
pub const MAX_TAG_DEPTH: usize = 32;

/// Deadline for a database fallback read on a resolver cache miss.
pub const DB_READ_TIMEOUT: Duration = Duration::from_secs(5);

/// TTL applied to freshly resolved budget/counter rows written back to
/// cache.
const WRITE_BACK_TTL: Duration = Duration::from_secs(30);

/// TTL for the per-tenant tag list family.
const TAG_LIST_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for the tenant default session budget family.
const TENANT_SESSION_BUDGET_TTL: Duration = Duration::from_secs(60 * 60);

/// Every shape of value this resolver round-trips through the cache,
/// wrapped so a single batch [`DistributedCache::multi_get`] can span all
/// of them. Writes always go through this wrapper too, so a later batch
/// read can deserialize whatever an earlier call wrote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
enum CachedEntry {
    Budget(Budget),
    Session(Session),
    Amount(Decimal),
    TagList(Vec<Tag>),
    TagBudget(TagBudget),
}

fn narrow<T>(
    lookup: CacheLookup<CachedEntry>,
    unwrap: impl Fn(CachedEntry) -> Option<T>,
) -> CacheLookup<T> {
    match lookup {
        CacheLookup::Hit(entry) => unwrap(entry).map_or(CacheLookup::Miss, CacheLookup::Hit),
        CacheLookup::Absent => CacheLookup::Absent,
        CacheLookup::Miss => CacheLookup::Miss,
    }
}

fn as_budget(e: CachedEntry) -> Option<Budget> {
    match e {
        CachedEntry::Budget(b) => Some(b),
        _ => None,
    }
}

fn as_session(e: CachedEntry) -> Option<Session> {
    match e {
        CachedEntry::Session(s) => Some(s),
        _ => None,
    }
}

fn as_amount(e: CachedEntry) -> Option<Decimal> {
    match e {
        CachedEntry::Amount(d) => Some(d),
        _ => None,
    }
}

fn as_tag_list(e: CachedEntry) -> Option<Vec<Tag>> {
    match e {
        CachedEntry::TagList(t) => Some(t),
        _ => None,
    }
}

fn as_tag_budget(e: CachedEntry) -> Option<TagBudget> {
    match e {
        CachedEntry::TagBudget(b) => Some(b),
        _ => None,
    }
}

/// A ceiling paired with its resolved usage, or an explicit statement that
/// usage could not be determined this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageResolution {
    /// Usage was resolved (from cache or DB) to an exact amount.
    Known(Decimal),
    /// Could not be resolved (cache miss followed by DB timeout/error).
    Undefined,
}

/// Resolved state for the tenant-level budget, if one is configured.
#[derive(Debug, Clone)]
pub struct TenantBudgetStatus {
    /// Ceiling amount, USD.
    pub limit_usd: Decimal,
    /// Which period this ceiling recurs on.
    pub period: Period,
    /// Resolved usage for the current window.
    pub usage: UsageResolution,
}

/// Resolved state for the session-level budget, if one is configured.
#[derive(Debug, Clone)]
pub struct SessionBudgetStatus {
    /// Ceiling amount, USD.
    pub limit_usd: Decimal,
    /// Cumulative cost so far; sessions do not expire on a fixed window.
    pub usage: UsageResolution,
}

/// Resolved state for a single tag budget consulted up the ancestor chain.
#[derive(Debug, Clone)]
pub struct TagBudgetStatus {
    /// Tag this budget is attached to.
    pub tag_id: i64,
    /// How this budget participates in denial vs. accounting-only.
    pub inheritance_mode: InheritanceMode,
    /// Weight applied to cost when decrementing this budget.
    pub weight: Decimal,
    /// Ceiling amount, USD.
    pub limit_usd: Decimal,
    /// Which period this ceiling recurs on.
    pub period: Period,
    /// Resolved usage for the current window.
    pub usage: UsageResolution,
}

/// Everything the policy engine (C5) needs to make an admission decision.
#[derive(Debug, Clone, Default)]
pub struct ResolvedBudgets {
    /// Tenant-level budget, `None` if the tenant has none configured.
    pub tenant: Option<TenantBudgetStatus>,
    /// Session-level budget, `None` if the session has no override and the
    /// tenant has no default session budget.
    pub session: Option<SessionBudgetStatus>,
    /// Every active tag budget found walking from the request's leaf tags
    /// up to their roots, capped at [`MAX_TAG_DEPTH`] hops per leaf.
    pub tag_budgets: Vec<TagBudgetStatus>,
}

/// One slot in the initial batch, tagging what a result index represents.
#[derive(Clone)]
enum Slot {
    TenantBudget,
    TenantCounter(Period),
    Session,
    TenantDefaultSessionBudget,
    TagList,
    LeafTagBudget(i64),
    LeafTagCounter(i64, Period),
}

/// Resolve all applicable budgets for an admission check.
///
/// `now` is the instant to resolve ledger windows against. `leaf_tag_ids`
/// are the tags attached directly to the request (via `X-Tag`); the
/// resolver walks each one's ancestor chain itself.
pub async fn resolve(
    cache: &DistributedCache,
    pool: &AnyPool,
    tenant_id: i64,
    session_id: Option<&str>,
    leaf_tag_ids: &[i64],
    now: chrono::DateTime<chrono::Utc>,
) -> ResolvedBudgets {
    let tenant_budget_key = format!("tenant:{tenant_id}:budget");
    let session_key = session_id.map(|sid| format!("session:{sid}"));
    let tenant_default_session_budget_key = format!("tenant_session_budget:{tenant_id}");
    let tag_list_key = format!("tags:tenant:{tenant_id}");

    let mut keys = Vec::new();
    let mut plan = Vec::new();

    keys.push(tenant_budget_key.clone());
    plan.push(Slot::TenantBudget);

    for period in [Period::Daily, Period::Monthly] {
        keys.push(format!(
            "tenant:{tenant_id}:counter:{}",
            resolve_key(period, now, None).as_suffix()
        ));
        plan.push(Slot::TenantCounter(period));
    }

    if let Some(ref key) = session_key {
        keys.push(key.clone());
        plan.push(Slot::Session);
    }

    keys.push(tenant_default_session_budget_key.clone());
    plan.push(Slot::TenantDefaultSessionBudget);

    keys.push(tag_list_key.clone());
    plan.push(Slot::TagList);

    for &tag_id in leaf_tag_ids {
        keys.push(format!("tag:{tag_id}:budget"));
        plan.push(Slot::LeafTagBudget(tag_id));
        for period in [Period::Daily, Period::Monthly] {
            keys.push(format!(
                "tag:{tag_id}:counter:{}",
                resolve_key(period, now, None).as_suffix()
            ));
            plan.push(Slot::LeafTagCounter(tag_id, period));
        }
    }

    let hits: Vec<CacheLookup<CachedEntry>> = cache.multi_get(&keys).await;

    let mut tenant_budget_lookup = CacheLookup::Miss;
    let mut tenant_counter_lookups: HashMap<Period, CacheLookup<Decimal>> = HashMap::new();
    let mut session_lookup = CacheLookup::Miss;
    let mut tenant_default_lookup = CacheLookup::Miss;
    let mut tag_list_lookup = CacheLookup::Miss;
    let mut leaf_budget_lookups: HashMap<i64, CacheLookup<TagBudget>> = HashMap::new();
    let mut leaf_counter_lookups: HashMap<(i64, Period), CacheLookup<Decimal>> = HashMap::new();

    for (slot, hit) in plan.into_iter().zip(hits) {
        match slot {
            Slot::TenantBudget => tenant_budget_lookup = narrow(hit, as_budget),
            Slot::TenantCounter(period) => {
                tenant_counter_lookups.insert(period, narrow(hit, as_amount));
            }
            Slot::Session => session_lookup = narrow(hit, as_session),
            Slot::TenantDefaultSessionBudget => tenant_default_lookup = narrow(hit, as_amount),
            Slot::TagList => tag_list_lookup = narrow(hit, as_tag_list),
            Slot::LeafTagBudget(tag_id) => {
                leaf_budget_lookups.insert(tag_id, narrow(hit, as_tag_budget));
            }
            Slot::LeafTagCounter(tag_id, period) => {
                leaf_counter_lookups.insert((tag_id, period), narrow(hit, as_amount));
            }
        }
    }

    let tenant = resolve_tenant_budget(
        cache,
        pool,
        tenant_id,
        now,
        &tenant_budget_key,
        tenant_budget_lookup,
        &mut tenant_counter_lookups,
    )
    .await;

    let tenant_default_session_budget = match tenant_default_lookup {
        CacheLookup::Hit(v) => Some(v),
        CacheLookup::Absent => None,
        CacheLookup::Miss => {
            let fetched = with_db_timeout(fetch_tenant_default_session_budget(pool, tenant_id)).await;
            match &fetched {
                Some(Some(v)) => {
                    cache
                        .set_typed(
                            &tenant_default_session_budget_key,
                            &CachedEntry::Amount(*v),
                            TENANT_SESSION_BUDGET_TTL,
                        )
                        .await;
                }
                Some(None) => {
                    cache
                        .set_absent(&tenant_default_session_budget_key, TENANT_SESSION_BUDGET_TTL)
                        .await;
                }
                None => warn!(tenant_id, "tenant default session budget lookup timed out"),
            }
            fetched.flatten()
        }
    };

    let session = match (session_id, session_key) {
        (Some(sid), Some(key)) => {
            let fetched_session = match session_lookup {
                CacheLookup::Hit(s) => Some(s),
                CacheLookup::Absent => None,
                CacheLookup::Miss => {
                    let fetched = with_db_timeout(fetch_session(pool, sid)).await;
                    match &fetched {
                        Some(Some(s)) => {
                            cache.set_typed(&key, &CachedEntry::Session(s.clone()), WRITE_BACK_TTL).await;
                        }
                        Some(None) => cache.set_absent(&key, WRITE_BACK_TTL).await,
                        None => warn!(%sid, "session lookup timed out"),
                    }
                    fetched.flatten()
                }
            };
            fetched_session.filter(|s| {
                if s.tenant_id != tenant_id {
                    warn!(%sid, tenant_id, "session does not belong to this tenant, ignoring");
                    false
                } else {
                    true
                }
            })
        }
        _ => None,
    };

    // Explicit per-session override, else the tenant's configured default,
    // else unbounded.
    let session_budget = session.as_ref().and_then(|s| {
        let limit = s.effective_budget_usd.or(tenant_default_session_budget)?;
        Some(SessionBudgetStatus {
            limit_usd: limit,
            usage: UsageResolution::Known(s.current_cost_usd),
        })
    });

    let tag_list: Vec<Tag> = match tag_list_lookup {
        CacheLookup::Hit(list) => list,
        CacheLookup::Absent => Vec::new(),
        CacheLookup::Miss => {
            let fetched = with_db_timeout(fetch_all_tags(pool, tenant_id)).await;
            match &fetched {
                Some(list) => {
                    cache.set_typed(&tag_list_key, &CachedEntry::TagList(list.clone()), TAG_LIST_TTL).await;
                }
                None => warn!(tenant_id, "tag list lookup timed out"),
            }
            fetched.unwrap_or_default()
        }
    };
    let by_id: HashMap<i64, &Tag> = tag_list.iter().map(|t| (t.id, t)).collect();
    let tag_ids = expand_ancestors(&by_id, tenant_id, leaf_tag_ids);

    let leaf_set: HashSet<i64> = leaf_tag_ids.iter().copied().collect();
    let mut tag_budgets = Vec::with_capacity(tag_ids.len());
    for tag_id in tag_ids {
        let budget_lookup = if leaf_set.contains(&tag_id) {
            leaf_budget_lookups.remove(&tag_id).unwrap_or(CacheLookup::Miss)
        } else {
            CacheLookup::Miss
        };
        if let Some(status) =
            resolve_tag_budget(cache, pool, tag_id, now, budget_lookup, &mut leaf_counter_lookups).await
        {
            tag_budgets.push(status);
        }
    }

    ResolvedBudgets {
        tenant,
        session: session_budget,
        tag_budgets,
    }
}

#[allow(clippy::too_many_arguments)]
async fn resolve_tenant_budget(
    cache: &DistributedCache,
    pool: &AnyPool,
    tenant_id: i64,
    now: chrono::DateTime<chrono::Utc>,
    config_key: &str,
    lookup: CacheLookup<Budget>,
    counter_lookups: &mut HashMap<Period, CacheLookup<Decimal>>,
) -> Option<TenantBudgetStatus> {
    let budget = match lookup {
        CacheLookup::Hit(b) => Some(b),
        CacheLookup::Absent => None,
        CacheLookup::Miss => {
            let fetched = with_db_timeout(fetch_tenant_budget(pool, tenant_id)).await;
            match &fetched {
                Some(Some(b)) => {
                    cache.set_typed(config_key, &CachedEntry::Budget(b.clone()), WRITE_BACK_TTL).await;
                }
                Some(None) => cache.set_absent(config_key, WRITE_BACK_TTL).await,
                None => warn!(tenant_id, "tenant budget config lookup timed out"),
            }
            fetched.flatten()
        }
    }?;

    let window = match budget.period {
        Period::Custom => budget.start_date.zip(budget.end_date),
        _ => None,
    };
    let ledger_key = resolve_key(budget.period, now, window);
    let counter_key = format!("tenant:{tenant_id}:counter:{}", ledger_key.as_suffix());
    let counter_lookup = match budget.period {
        Period::Custom => CacheLookup::Miss,
        _ => counter_lookups.remove(&budget.period).unwrap_or(CacheLookup::Miss),
    };
    let usage = settle_counter(cache, pool, &counter_key, tenant_id, &ledger_key, counter_lookup).await;

    Some(TenantBudgetStatus {
        limit_usd: budget.amount_usd,
        period: budget.period,
        usage,
    })
}

async fn resolve_tag_budget(
    cache: &DistributedCache,
    pool: &AnyPool,
    tag_id: i64,
    now: chrono::DateTime<chrono::Utc>,
    lookup: CacheLookup<TagBudget>,
    counter_lookups: &mut HashMap<(i64, Period), CacheLookup<Decimal>>,
) -> Option<TagBudgetStatus> {
    let key = format!("tag:{tag_id}:budget");
    let tag_budget = match lookup {
        CacheLookup::Hit(b) => Some(b),
        CacheLookup::Absent => None,
        CacheLookup::Miss => {
            let fetched = with_db_timeout(fetch_tag_budget(pool, tag_id)).await;
            match &fetched {
                Some(Some(b)) => cache.set_typed(&key, &CachedEntry::TagBudget(b.clone()), WRITE_BACK_TTL).await,
                Some(None) => cache.set_absent(&key, WRITE_BACK_TTL).await,
                None => warn!(tag_id, "tag budget lookup timed out"),
            }
            fetched.flatten()
        }
    };

    let tag_budget = tag_budget.filter(|b| b.is_active)?;
    let window = match tag_budget.period {
        Period::Custom => tag_budget.start_date.zip(tag_budget.end_date),
        _ => None,
    };
    let ledger_key = resolve_key(tag_budget.period, now, window);
    let counter_key = format!("tag:{tag_id}:counter:{}", ledger_key.as_suffix());
    let counter_lookup = match tag_budget.period {
        Period::Custom => CacheLookup::Miss,
        period => counter_lookups.remove(&(tag_id, period)).unwrap_or(CacheLookup::Miss),
    };
    let usage = settle_counter(cache, pool, &counter_key, tag_id, &ledger_key, counter_lookup).await;

    Some(TagBudgetStatus {
        tag_id,
        inheritance_mode: tag_budget.inheritance_mode,
        weight: tag_budget.weight,
        limit_usd: tag_budget.amount_usd,
        period: tag_budget.period,
        usage,
    })
}

async fn settle_counter(
    cache: &DistributedCache,
    pool: &AnyPool,
    counter_key: &str,
    scope_id: i64,
    ledger_key: &LedgerKey,
    lookup: CacheLookup<Decimal>,
) -> UsageResolution {
    match lookup {
        CacheLookup::Hit(total) => UsageResolution::Known(total),
        CacheLookup::Absent => UsageResolution::Known(Decimal::ZERO),
        CacheLookup::Miss => {
            let fetched = with_db_timeout(fetch_counter(pool, scope_id, ledger_key)).await;
            match fetched {
                Some(total) => {
                    cache.set_typed(counter_key, &CachedEntry::Amount(total), WRITE_BACK_TTL).await;
                    UsageResolution::Known(total)
                }
                None => {
                    warn!(counter_key, "counter lookup timed out, usage undefined");
                    UsageResolution::Undefined
                }
            }
        }
    }
}

/// Walk from each leaf tag up through `parent_id` to the root, capped at
/// [`MAX_TAG_DEPTH`] hops, deduplicating tags reached by more than one
/// leaf. Tags with `inheritance_mode == None` are still included in the
/// walk (they may still gate a deeper ancestor) but filtered out by the
/// policy engine, which ignores `None` budgets. Pure in-memory traversal
/// over the tenant's already-fetched tag list; no I/O.
fn expand_ancestors(by_id: &HashMap<i64, &Tag>, tenant_id: i64, leaf_tag_ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();

    for &leaf in leaf_tag_ids {
        let mut current = Some(leaf);
        let mut depth = 0;
        while let Some(tag_id) = current {
            if depth >= MAX_TAG_DEPTH {
                warn!(tag_id, tenant_id, "tag ancestor walk exceeded max depth, truncating");
                break;
            }
            if !seen.insert(tag_id) {
                break;
            }
            ordered.push(tag_id);

            current = by_id.get(&tag_id).and_then(|t| t.parent_id);
            depth += 1;
        }
    }

    ordered
}

async fn with_db_timeout<F, T>(fut: F) -> Option<T>
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(DB_READ_TIMEOUT, fut).await.ok()
}

async fn fetch_tenant_budget(pool: &AnyPool, tenant_id: i64) -> Option<Budget> {
    sqlx::query("SELECT tenant_id, period, amount_usd, start_date, end_date FROM budgets WHERE tenant_id = $1 LIMIT 1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten()
        .map(|row| Budget {
            tenant_id: row.get("tenant_id"),
            period: period_from_str(row.get("period")),
            amount_usd: row.get("amount_usd"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
        })
}

async fn fetch_tenant_default_session_budget(pool: &AnyPool, tenant_id: i64) -> Option<Decimal> {
    sqlx::query("SELECT default_session_budget FROM tenants WHERE id = $1")
        .bind(tenant_id)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten()
        .and_then(|row| row.get::<Option<Decimal>, _>("default_session_budget"))
}

async fn fetch_session(pool: &AnyPool, session_id: &str) -> Option<Session> {
    sqlx::query(
        "SELECT session_id, tenant_id, name, effective_budget_usd, current_cost_usd, status, \
         created_at, last_active_at, request_count FROM sessions WHERE session_id = $1",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await
    .ok()
    .flatten()
    .map(|row| Session {
        session_id: row.get("session_id"),
        tenant_id: row.get("tenant_id"),
        name: row.get("name"),
        effective_budget_usd: row.get("effective_budget_usd"),
        current_cost_usd: row.get("current_cost_usd"),
        status: status_from_str(row.get("status")),
        created_at: row.get("created_at"),
        last_active_at: row.get("last_active_at"),
        request_count: row.get::<i64, _>("request_count").max(0) as u64,
    })
}

async fn fetch_tag_budget(pool: &AnyPool, tag_id: i64) -> Option<TagBudget> {
    sqlx::query(
        "SELECT tag_id, period, amount_usd, weight, inheritance_mode, is_active, start_date, \
         end_date FROM tag_budgets WHERE tag_id = $1 AND is_active = true LIMIT 1",
    )
    .bind(tag_id)
    .fetch_optional(pool)
    .await
    .ok()
    .flatten()
    .map(|row| TagBudget {
        tag_id: row.get("tag_id"),
        period: period_from_str(row.get("period")),
        amount_usd: row.get("amount_usd"),
        weight: row.get("weight"),
        inheritance_mode: inheritance_from_str(row.get("inheritance_mode")),
        is_active: row.get("is_active"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
    })
}

async fn fetch_all_tags(pool: &AnyPool, tenant_id: i64) -> Vec<Tag> {
    sqlx::query(
        "SELECT id, tenant_id, name, parent_id, path, is_active, color, description FROM tags \
         WHERE tenant_id = $1",
    )
    .bind(tenant_id)
    .fetch_all(pool)
    .await
    .unwrap_or_default()
    .into_iter()
    .map(|row| Tag {
        id: row.get("id"),
        tenant_id: row.get("tenant_id"),
        name: row.get("name"),
        parent_id: row.get("parent_id"),
        path: row.get("path"),
        is_active: row.get("is_active"),
        color: row.get("color"),
        description: row.get("description"),
    })
    .collect()
}

/// Current total for `(scope_id, ledger_key)`; a missing row means no
/// usage has been recorded yet, i.e. zero, not "unresolved".
async fn fetch_counter(pool: &AnyPool, scope_id: i64, ledger_key: &LedgerKey) -> Decimal {
    let suffix = ledger_key.as_suffix();
    sqlx::query("SELECT total_usd FROM counters WHERE scope_id = $1 AND bucket = $2")
        .bind(scope_id)
        .bind(suffix)
        .fetch_optional(pool)
        .await
        .ok()
        .flatten()
        .map_or(Decimal::ZERO, |row| row.get::<Decimal, _>("total_usd"))
}

fn period_from_str(s: String) -> Period {
    match s.as_str() {
        "monthly" => Period::Monthly,
        "custom" => Period::Custom,
        _ => Period::Daily,
    }
}

fn status_from_str(s: String) -> gateway_core::domain::SessionStatus {
    use gateway_core::domain::SessionStatus;
    match s.as_str() {
        "budget_exceeded" => SessionStatus::BudgetExceeded,
        "completed" => SessionStatus::Completed,
        "error" => SessionStatus::Error,
        _ => SessionStatus::Active,
    }
}

fn inheritance_from_str(s: String) -> InheritanceMode {
    match s.as_str() {
        "LENIENT" => InheritanceMode::Lenient,
        "NONE" => InheritanceMode::None,
        _ => InheritanceMode::Strict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_resolution_equality() {
        assert_eq!(UsageResolution::Known(Decimal::ZERO), UsageResolution::Known(Decimal::ZERO));
        assert_ne!(UsageResolution::Undefined, UsageResolution::Known(Decimal::ZERO));
    }

    #[test]
    fn period_round_trips_through_str() {
        assert_eq!(period_from_str("monthly".to_string()), Period::Monthly);
        assert_eq!(period_from_str("daily".to_string()), Period::Daily);
        assert_eq!(period_from_str("custom".to_string()), Period::Custom);
    }

    #[test]
    fn inheritance_round_trips_through_str() {
        assert_eq!(inheritance_from_str("STRICT".to_string()), InheritanceMode::Strict);
        assert_eq!(inheritance_from_str("LENIENT".to_string()), InheritanceMode::Lenient);
        assert_eq!(inheritance_from_str("NONE".to_string()), InheritanceMode::None);
    }

    fn tag(id: i64, parent_id: Option<i64>) -> Tag {
        Tag {
            id,
            tenant_id: 1,
            name: format!("tag-{id}"),
            parent_id,
            path: String::new(),
            is_active: true,
            color: None,
            description: None,
        }
    }

    #[test]
    fn expand_ancestors_walks_parent_chain_from_in_memory_tag_list() {
        let root = tag(1, None);
        let mid = tag(2, Some(1));
        let leaf = tag(3, Some(2));
        let by_id: HashMap<i64, &Tag> = [(1, &root), (2, &mid), (3, &leaf)].into_iter().collect();

        let ids = expand_ancestors(&by_id, 1, &[3]);
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn expand_ancestors_dedups_across_leaves_sharing_an_ancestor() {
        let root = tag(1, None);
        let a = tag(2, Some(1));
        let b = tag(3, Some(1));
        let by_id: HashMap<i64, &Tag> = [(1, &root), (2, &a), (3, &b)].into_iter().collect();

        let ids = expand_ancestors(&by_id, 1, &[2, 3]);
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn expand_ancestors_caps_at_max_depth_on_a_cycle() {
        let a = tag(1, Some(2));
        let b = tag(2, Some(1));
        let by_id: HashMap<i64, &Tag> = [(1, &a), (2, &b)].into_iter().collect();

        let ids = expand_ancestors(&by_id, 1, &[1]);
        assert!(ids.len() <= MAX_TAG_DEPTH);
    }
}
