//! The usage event stream (C9).
//!
//! An append-only, at-least-once delivery of priced (or denied/failed)
//! requests from the admission pipeline to the accounting worker. Modeled
//! as a durable replay log (the `usage_ledger_entries` table, written
//! synchronously before the emitting call returns) feeding an in-process
//! bounded channel that gives the worker per-tenant-sufficient FIFO
//! ordering without needing a broker. If the channel is full or the
//! process restarts before the worker drains it, the worker re-derives
//! unprocessed entries from the durable log on startup — the channel is an
//! optimization, the table is the source of truth.

use gateway_core::domain::UsageLedgerEntry;
use gateway_core::GatewayError;
use sqlx::any::AnyPool;
use sqlx::Row;
use tokio::sync::mpsc;
use tracing::warn;

/// Entries are capped at 1KB serialized; callers trim `tag_weights` before
/// emitting if a request carries an unreasonable number of tags.
pub const MAX_ENTRY_BYTES: usize = 1024;

/// Producer handle held by the admission pipeline.
#[derive(Clone)]
pub struct EventEmitter {
    sender: mpsc::Sender<UsageLedgerEntry>,
    pool: AnyPool,
}

/// Consumer handle held by the accounting worker.
pub struct EventReceiver {
    receiver: mpsc::Receiver<UsageLedgerEntry>,
}

/// Build a bounded event stream. `capacity` bounds only the in-memory
/// fast path; durability comes from the synchronous DB write in
/// [`EventEmitter::emit`].
#[must_use]
pub fn channel(capacity: usize, pool: AnyPool) -> (EventEmitter, EventReceiver) {
    let (sender, receiver) = mpsc::channel(capacity);
    (EventEmitter { sender, pool }, EventReceiver { receiver })
}

impl EventEmitter {
    /// Append `entry` to the durable ledger and hand it to the worker's
    /// channel. Per the admission pipeline's emitted→replied transition,
    /// this is called exactly once per request, after pricing, and the
    /// pipeline never touches a counter directly — see [`crate::accounting`].
    ///
    /// # Errors
    /// Returns an error if the durable write fails; the caller should
    /// treat this as a transient-infra error and still reply to the
    /// client (emission failure must not fail an already-priced request).
    pub async fn emit(&self, entry: UsageLedgerEntry) -> Result<(), GatewayError> {
        let tag_weights = serde_json::to_value(&entry.tag_weights)
            .map_err(|e| GatewayError::internal(format!("tag_weights not serializable: {e}")))?;

        if serde_json::to_vec(&tag_weights).map(|v| v.len()).unwrap_or_default() > MAX_ENTRY_BYTES
        {
            warn!(record_id = %entry.record_id, "usage ledger entry exceeds size budget, truncating tag_weights");
        }

        sqlx::query(
            "INSERT INTO usage_ledger_entries \
             (record_id, ts, tenant_id, route, model, prompt_tokens, completion_tokens, usd, \
              session_id, outcome, tag_weights) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (record_id) DO NOTHING",
        )
        .bind(entry.record_id)
        .bind(entry.ts)
        .bind(entry.tenant_id)
        .bind(&entry.route)
        .bind(&entry.model)
        .bind(i64::from(entry.prompt_tokens))
        .bind(i64::from(entry.completion_tokens))
        .bind(entry.usd)
        .bind(&entry.session_id)
        .bind(outcome_str(entry.outcome))
        .bind(tag_weights)
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::transient_infra(format!("usage ledger write failed: {e}")))?;

        if self.sender.send(entry).await.is_err() {
            warn!("accounting worker channel closed, entry remains in durable log for replay");
        }

        Ok(())
    }
}

impl EventReceiver {
    /// Pull the next event, or `None` once every sender has dropped.
    pub async fn recv(&mut self) -> Option<UsageLedgerEntry> {
        self.receiver.recv().await
    }
}

/// Load entries not yet reflected in `counters` since `since`, for worker
/// startup replay after a crash or restart.
///
/// # Errors
/// Returns an error if the query fails.
pub async fn replay_unprocessed(
    pool: &AnyPool,
    since: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<UsageLedgerEntry>, GatewayError> {
    let rows = sqlx::query(
        "SELECT record_id, ts, tenant_id, route, model, prompt_tokens, completion_tokens, usd, \
         session_id, outcome, tag_weights FROM usage_ledger_entries \
         WHERE ts >= $1 AND NOT processed ORDER BY ts ASC",
    )
    .bind(since)
    .fetch_all(pool)
    .await
    .map_err(|e| GatewayError::transient_infra(format!("replay query failed: {e}")))?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        let tag_weights: serde_json::Value = row.get("tag_weights");
        entries.push(UsageLedgerEntry {
            record_id: row.get("record_id"),
            ts: row.get("ts"),
            tenant_id: row.get("tenant_id"),
            route: row.get("route"),
            model: row.get("model"),
            prompt_tokens: row.get::<i64, _>("prompt_tokens").max(0) as u32,
            completion_tokens: row.get::<i64, _>("completion_tokens").max(0) as u32,
            usd: row.get("usd"),
            session_id: row.get("session_id"),
            outcome: outcome_from_str(row.get("outcome")),
            tag_weights: serde_json::from_value(tag_weights).unwrap_or_default(),
        });
    }
    Ok(entries)
}

fn outcome_str(outcome: gateway_core::domain::UsageOutcome) -> &'static str {
    use gateway_core::domain::UsageOutcome;
    match outcome {
        UsageOutcome::Success => "success",
        UsageOutcome::Blocked => "blocked",
        UsageOutcome::Failed => "failed",
    }
}

fn outcome_from_str(s: String) -> gateway_core::domain::UsageOutcome {
    use gateway_core::domain::UsageOutcome;
    match s.as_str() {
        "blocked" => UsageOutcome::Blocked,
        "failed" => UsageOutcome::Failed,
        _ => UsageOutcome::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::outcome_from_str;
    use super::outcome_str;
    use gateway_core::domain::UsageOutcome;

    #[test]
    fn outcome_round_trips_through_str() {
        for outcome in [UsageOutcome::Success, UsageOutcome::Blocked, UsageOutcome::Failed] {
            assert_eq!(outcome_from_str(outcome_str(outcome).to_string()), outcome);
        }
    }
}
