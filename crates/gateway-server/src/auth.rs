//! Bearer credential authentication (admission pipeline's
//! received → authenticated transition).
//!
//! Callers present `Authorization: Bearer <key>` or `X-Api-Key: <key>`;
//! the gateway looks the key up by a SHA-256 digest rather than a salted
//! hash, since this is an equality lookup on every authenticated request,
//! not a password check — see the api_keys migration for the full
//! rationale.

use gateway_core::GatewayError;
use sha2::{Digest, Sha256};
use sqlx::any::AnyPool;
use sqlx::Row;

/// The tenant an API key authenticated to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedTenant {
    /// Owning tenant id.
    pub tenant_id: i64,
}

/// Deterministic digest stored in and looked up against `api_keys.secret`.
#[must_use]
pub fn digest(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Look up `raw_key` and return its owning tenant if active.
///
/// # Errors
/// Returns [`GatewayError::Authentication`] for an unknown, inactive, or
/// empty key. Returns [`GatewayError::TransientInfra`] only if the
/// database itself is unreachable, since that's recoverable and distinct
/// from "this key doesn't exist".
pub async fn authenticate(pool: &AnyPool, raw_key: &str) -> Result<AuthenticatedTenant, GatewayError> {
    if raw_key.is_empty() {
        return Err(GatewayError::authentication("empty credential"));
    }

    let key_digest = digest(raw_key);
    let row = sqlx::query("SELECT tenant_id, is_active FROM api_keys WHERE secret = $1")
        .bind(&key_digest)
        .fetch_optional(pool)
        .await
        .map_err(|e| GatewayError::transient_infra(format!("api key lookup failed: {e}")))?;

    let Some(row) = row else {
        return Err(GatewayError::authentication("unknown credential"));
    };

    let is_active: bool = row.get("is_active");
    if !is_active {
        return Err(GatewayError::authentication("credential is inactive"));
    }

    let _ = sqlx::query("UPDATE api_keys SET last_used_at = $1 WHERE secret = $2")
        .bind(chrono::Utc::now())
        .bind(&key_digest)
        .execute(pool)
        .await;

    Ok(AuthenticatedTenant {
        tenant_id: row.get("tenant_id"),
    })
}

/// Comparison for the admin surface: the admin key is compared directly
/// (not hashed) since it is a single operator secret configured out of
/// band, not a per-row lookup key.
#[must_use]
pub fn is_admin_key(presented: &str, configured: &str) -> bool {
    presented == configured
}
