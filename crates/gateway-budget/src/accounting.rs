//! The accounting worker (C10).
//!
//! Sole consumer of the usage event stream and the only code path allowed
//! to mutate a [`Counter`]. Drains [`EventReceiver`], coalesces same-bucket
//! increments within a batching window, and writes them through to the
//! `counters` table (and the session row's `current_cost_usd`) in one pass
//! per batch. Idempotent per `record_id`: a re-delivered entry after a
//! crash is a no-op because `usage_ledger_entries.processed` is flipped in
//! the same transaction as the counter increment.
//!
//! [`Counter`]: gateway_core::Counter

use crate::ledger_key::resolve_key;
use gateway_core::domain::{Period, Session, SessionStatus, UsageLedgerEntry, UsageOutcome};
use rust_decimal::Decimal;
use sqlx::any::AnyPool;
use sqlx::Row;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::events::EventReceiver;

/// Maximum entries coalesced into a single batch before it is flushed.
pub const MAX_BATCH_SIZE: usize = 256;

/// Maximum time a partial batch waits for more entries before flushing.
pub const BATCH_WINDOW: Duration = Duration::from_millis(250);

/// Drives the drain→coalesce→write-through loop until the channel closes.
pub struct AccountingWorker {
    receiver: EventReceiver,
    pool: AnyPool,
}

impl AccountingWorker {
    /// Build a worker over an event receiver and the durable pool it
    /// writes counters and ledger status through to.
    #[must_use]
    pub const fn new(receiver: EventReceiver, pool: AnyPool) -> Self {
        Self { receiver, pool }
    }

    /// Run until the emitter side of the channel is dropped (process
    /// shutdown). Each iteration collects up to [`MAX_BATCH_SIZE`] entries
    /// or waits at most [`BATCH_WINDOW`] for the first entry of a new
    /// batch, then flushes.
    pub async fn run(mut self) {
        loop {
            let Some(first) = self.receiver.recv().await else {
                info!("accounting worker channel closed, shutting down");
                return;
            };

            let mut batch = vec![first];
            let deadline = tokio::time::Instant::now() + BATCH_WINDOW;
            while batch.len() < MAX_BATCH_SIZE {
                match tokio::time::timeout_at(deadline, self.receiver.recv()).await {
                    Ok(Some(entry)) => batch.push(entry),
                    Ok(None) => break,
                    Err(_) => break,
                }
            }

            if let Err(e) = self.flush(batch).await {
                error!(error = %e, "failed to flush accounting batch");
            }
        }
    }

    async fn flush(&self, batch: Vec<UsageLedgerEntry>) -> Result<(), sqlx::Error> {
        let coalesced = coalesce(&batch);
        debug!(entries = batch.len(), buckets = coalesced.len(), "flushing accounting batch");

        let mut tx = self.pool.begin().await?;

        for (key, delta) in &coalesced {
            sqlx::query(
                "INSERT INTO counters (scope_id, bucket, total_usd) VALUES ($1, $2, $3) \
                 ON CONFLICT (scope_id, bucket) \
                 DO UPDATE SET total_usd = counters.total_usd + EXCLUDED.total_usd",
            )
            .bind(key.scope_id)
            .bind(&key.bucket)
            .bind(*delta)
            .execute(&mut *tx)
            .await?;
        }

        for entry in &batch {
            if let Some(session_id) = &entry.session_id {
                if entry.outcome == UsageOutcome::Success {
                    let row = sqlx::query(
                        "SELECT session_id, tenant_id, name, effective_budget_usd, \
                         current_cost_usd, status, created_at, last_active_at, request_count \
                         FROM sessions WHERE session_id = $1",
                    )
                    .bind(session_id)
                    .fetch_optional(&mut *tx)
                    .await?;

                    if let Some(row) = row {
                        let tenant_id: i64 = row.get("tenant_id");
                        let mut session = Session {
                            session_id: row.get("session_id"),
                            tenant_id,
                            name: row.get("name"),
                            effective_budget_usd: row.get("effective_budget_usd"),
                            current_cost_usd: row.get("current_cost_usd"),
                            status: status_from_str(row.get("status")),
                            created_at: row.get("created_at"),
                            last_active_at: row.get("last_active_at"),
                            request_count: row.get::<i64, _>("request_count").max(0) as u64,
                        };

                        if session.effective_budget_usd.is_none() {
                            session.effective_budget_usd =
                                sqlx::query("SELECT default_session_budget FROM tenants WHERE id = $1")
                                    .bind(tenant_id)
                                    .fetch_optional(&mut *tx)
                                    .await?
                                    .and_then(|r| r.get("default_session_budget"));
                        }

                        session.current_cost_usd += entry.usd;
                        let new_status = session.recompute_status();

                        sqlx::query(
                            "UPDATE sessions SET current_cost_usd = $1, last_active_at = $2, \
                             request_count = request_count + 1, status = $3 \
                             WHERE session_id = $4",
                        )
                        .bind(session.current_cost_usd)
                        .bind(entry.ts)
                        .bind(status_str(new_status))
                        .bind(session_id)
                        .execute(&mut *tx)
                        .await?;
                    }
                }
            }

            sqlx::query("UPDATE usage_ledger_entries SET processed = true WHERE record_id = $1")
                .bind(entry.record_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await
    }
}

fn status_from_str(s: String) -> SessionStatus {
    match s.as_str() {
        "budget_exceeded" => SessionStatus::BudgetExceeded,
        "completed" => SessionStatus::Completed,
        "error" => SessionStatus::Error,
        _ => SessionStatus::Active,
    }
}

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Active => "active",
        SessionStatus::BudgetExceeded => "budget_exceeded",
        SessionStatus::Completed => "completed",
        SessionStatus::Error => "error",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CounterKey {
    scope_id: i64,
    bucket: String,
}

/// Sum per-`(tenant, bucket)` and per-`(tag, bucket)` deltas across a batch
/// so a flush issues one upsert per distinct bucket rather than one per
/// entry.
fn coalesce(batch: &[UsageLedgerEntry]) -> HashMap<CounterKey, Decimal> {
    let mut totals: HashMap<CounterKey, Decimal> = HashMap::new();

    for entry in batch {
        if entry.outcome != UsageOutcome::Success {
            continue;
        }

        let daily = resolve_key(Period::Daily, entry.ts, None);
        let monthly = resolve_key(Period::Monthly, entry.ts, None);

        for bucket in [daily, monthly] {
            let key = CounterKey {
                scope_id: entry.tenant_id,
                bucket: bucket.as_suffix(),
            };
            *totals.entry(key).or_insert(Decimal::ZERO) += entry.usd;
        }

        for (&tag_id, weight) in &entry.tag_weights {
            let weighted = entry.usd * weight;
            let daily = resolve_key(Period::Daily, entry.ts, None);
            let key = CounterKey {
                scope_id: tag_id,
                bucket: daily.as_suffix(),
            };
            *totals.entry(key).or_insert(Decimal::ZERO) += weighted;
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn entry(tenant_id: i64, usd: Decimal, tags: &[(i64, Decimal)]) -> UsageLedgerEntry {
        UsageLedgerEntry {
            record_id: Uuid::new_v4(),
            ts: Utc::now(),
            tenant_id,
            route: "/v1/chat/completions".to_string(),
            model: "gpt-4o".to_string(),
            prompt_tokens: 100,
            completion_tokens: 50,
            usd,
            session_id: None,
            outcome: UsageOutcome::Success,
            tag_weights: tags.iter().copied().collect(),
        }
    }

    #[test]
    fn coalesces_same_tenant_into_one_bucket() {
        let batch = vec![entry(1, dec!(1.00), &[]), entry(1, dec!(2.00), &[])];
        let totals = coalesce(&batch);
        let daily_key = CounterKey {
            scope_id: 1,
            bucket: resolve_key(Period::Daily, batch[0].ts, None).as_suffix(),
        };
        assert_eq!(totals[&daily_key], dec!(3.00));
    }

    #[test]
    fn blocked_outcome_is_not_counted() {
        let mut e = entry(1, dec!(5.00), &[]);
        e.outcome = UsageOutcome::Blocked;
        let totals = coalesce(&[e]);
        assert!(totals.is_empty());
    }

    #[test]
    fn session_status_round_trips_through_str() {
        for status in [
            SessionStatus::Active,
            SessionStatus::BudgetExceeded,
            SessionStatus::Completed,
            SessionStatus::Error,
        ] {
            assert_eq!(status_from_str(status_str(status).to_string()), status);
        }
    }

    #[test]
    fn tag_weights_apply_a_multiplier() {
        let batch = vec![entry(1, dec!(10.00), &[(42, dec!(0.5))])];
        let totals = coalesce(&batch);
        let tag_key = CounterKey {
            scope_id: 42,
            bucket: resolve_key(Period::Daily, batch[0].ts, None).as_suffix(),
        };
        assert_eq!(totals[&tag_key], dec!(5.00));
    }
}
