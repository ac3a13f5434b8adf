//! Database schema migrations.
//!
//! This module contains all the SQL migrations for the gateway database:
//! tenants, bearer credentials, hierarchical budgets, the tag tree, model
//! pricing, sessions, the usage ledger, and accounting counters.

use crate::migration::Migration;

/// Get all migrations in order.
#[must_use]
pub fn all_migrations() -> Vec<Migration> {
    vec![
        v001_create_tenants(),
        v002_create_api_keys(),
        v003_create_budgets(),
        v004_create_tags(),
        v005_create_tag_budgets(),
        v006_create_model_pricing(),
        v007_create_sessions(),
        v008_create_usage_ledger_entries(),
        v009_create_counters(),
    ]
}

/// V001: Create tenants table.
#[must_use]
pub fn v001_create_tenants() -> Migration {
    Migration::builder(20240101000001, "create_tenants")
        .up(r#"
            CREATE TABLE IF NOT EXISTS tenants (
                id BIGSERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                rate_limit_per_minute INTEGER,
                default_session_budget DECIMAL(20, 8)
            );
        "#)
        .down(r#"
            DROP TABLE IF EXISTS tenants CASCADE;
        "#)
        .tag("core")
        .tag("tenants")
        .build()
}

/// V002: Create API keys table.
///
/// `secret` is unique per the data model's bearer-credential invariant;
/// callers store a SHA-256 digest of the bearer credential here, never the
/// raw credential. A keyed digest (rather than `argon2`) is deliberate: it
/// is the primary-key lookup path for every authenticated request, and
/// `argon2`'s per-hash salt would make that an O(n) scan instead of an
/// index hit. High-entropy generated bearer tokens don't need per-row
/// salting the way user passwords do.
#[must_use]
pub fn v002_create_api_keys() -> Migration {
    Migration::builder(20240101000002, "create_api_keys")
        .up(r#"
            CREATE TABLE IF NOT EXISTS api_keys (
                secret VARCHAR(255) PRIMARY KEY,
                tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_used_at TIMESTAMPTZ
            );

            CREATE INDEX idx_api_keys_tenant_id ON api_keys(tenant_id);
            CREATE INDEX idx_api_keys_is_active ON api_keys(is_active);
        "#)
        .down(r#"
            DROP TABLE IF EXISTS api_keys CASCADE;
        "#)
        .tag("core")
        .tag("auth")
        .build()
}

/// V003: Create budgets table (tenant-level monetary ceilings).
#[must_use]
pub fn v003_create_budgets() -> Migration {
    Migration::builder(20240101000003, "create_budgets")
        .up(r#"
            CREATE TABLE IF NOT EXISTS budgets (
                tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                period VARCHAR(10) NOT NULL,
                amount_usd DECIMAL(20, 8) NOT NULL CHECK (amount_usd >= 0),
                start_date TIMESTAMPTZ,
                end_date TIMESTAMPTZ,
                PRIMARY KEY (tenant_id, period)
            );

            CREATE INDEX idx_budgets_tenant_id ON budgets(tenant_id);
        "#)
        .down(r#"
            DROP TABLE IF EXISTS budgets CASCADE;
        "#)
        .tag("core")
        .tag("budgets")
        .build()
}

/// V004: Create tags table (the per-tenant hierarchical tag tree).
///
/// `(tenant_id, name)` is unique among siblings at the application layer
/// (case-insensitive/Unicode-folded), enforced here as a plain unique
/// index on the pair since siblings share a `parent_id`.
#[must_use]
pub fn v004_create_tags() -> Migration {
    Migration::builder(20240101000004, "create_tags")
        .up(r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGSERIAL PRIMARY KEY,
                tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                name VARCHAR(255) NOT NULL,
                parent_id BIGINT REFERENCES tags(id) ON DELETE CASCADE,
                path TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                color VARCHAR(20),
                description TEXT
            );

            CREATE UNIQUE INDEX idx_tags_tenant_name ON tags(tenant_id, name);
            CREATE INDEX idx_tags_tenant_id ON tags(tenant_id);
            CREATE INDEX idx_tags_parent_id ON tags(parent_id);
        "#)
        .down(r#"
            DROP TABLE IF EXISTS tags CASCADE;
        "#)
        .tag("core")
        .tag("tags")
        .build()
}

/// V005: Create tag_budgets table.
///
/// `(tag_id, period)` is unique among *active* rows — a tag can have at
/// most one active daily, one active monthly, and any number of
/// non-overlapping custom-window budgets; enforced at the application
/// layer for the custom case since a partial unique index over a date
/// range is backend-specific.
#[must_use]
pub fn v005_create_tag_budgets() -> Migration {
    Migration::builder(20240101000005, "create_tag_budgets")
        .up(r#"
            CREATE TABLE IF NOT EXISTS tag_budgets (
                tag_id BIGINT NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                period VARCHAR(10) NOT NULL,
                amount_usd DECIMAL(20, 8) NOT NULL CHECK (amount_usd >= 0),
                weight DECIMAL(4, 2) NOT NULL DEFAULT 1.0 CHECK (weight >= 0.1 AND weight <= 3.0),
                inheritance_mode VARCHAR(10) NOT NULL DEFAULT 'STRICT',
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                start_date TIMESTAMPTZ,
                end_date TIMESTAMPTZ,
                PRIMARY KEY (tag_id, period)
            );

            CREATE UNIQUE INDEX idx_tag_budgets_active
                ON tag_budgets(tag_id, period) WHERE is_active;
            CREATE INDEX idx_tag_budgets_tag_id ON tag_budgets(tag_id);
        "#)
        .down(r#"
            DROP TABLE IF EXISTS tag_budgets CASCADE;
        "#)
        .tag("core")
        .tag("budgets")
        .build()
}

/// V006: Create model_pricing table.
#[must_use]
pub fn v006_create_model_pricing() -> Migration {
    Migration::builder(20240101000006, "create_model_pricing")
        .up(r#"
            CREATE TABLE IF NOT EXISTS model_pricing (
                model VARCHAR(255) PRIMARY KEY,
                version_tag VARCHAR(50) NOT NULL,
                input_price DECIMAL(20, 8) NOT NULL,
                cached_input_price DECIMAL(20, 8) NOT NULL,
                output_price DECIMAL(20, 8) NOT NULL,
                provider VARCHAR(50) NOT NULL
            );

            CREATE INDEX idx_model_pricing_provider ON model_pricing(provider);
        "#)
        .down(r#"
            DROP TABLE IF EXISTS model_pricing CASCADE;
        "#)
        .tag("core")
        .tag("pricing")
        .build()
}

/// V007: Create sessions table.
#[must_use]
pub fn v007_create_sessions() -> Migration {
    Migration::builder(20240101000007, "create_sessions")
        .up(r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id VARCHAR(255) PRIMARY KEY,
                tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                name VARCHAR(255),
                effective_budget_usd DECIMAL(20, 8),
                current_cost_usd DECIMAL(20, 8) NOT NULL DEFAULT 0 CHECK (current_cost_usd >= 0),
                status VARCHAR(20) NOT NULL DEFAULT 'active',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                last_active_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                request_count BIGINT NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_sessions_tenant_id ON sessions(tenant_id);
            CREATE INDEX idx_sessions_status ON sessions(status);
        "#)
        .down(r#"
            DROP TABLE IF EXISTS sessions CASCADE;
        "#)
        .tag("core")
        .tag("sessions")
        .build()
}

/// V008: Create usage_ledger_entries table.
///
/// `record_id` is the at-least-once dedup key the accounting worker keys
/// off of; `processed` flips to `true` in the same transaction as the
/// counter increment it produced, making replay idempotent.
#[must_use]
pub fn v008_create_usage_ledger_entries() -> Migration {
    Migration::builder(20240101000008, "create_usage_ledger_entries")
        .up(r#"
            CREATE TABLE IF NOT EXISTS usage_ledger_entries (
                record_id UUID PRIMARY KEY,
                ts TIMESTAMPTZ NOT NULL,
                tenant_id BIGINT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                route VARCHAR(100) NOT NULL,
                model VARCHAR(255) NOT NULL,
                prompt_tokens INTEGER NOT NULL DEFAULT 0,
                completion_tokens INTEGER NOT NULL DEFAULT 0,
                usd DECIMAL(20, 8) NOT NULL DEFAULT 0,
                session_id VARCHAR(255) REFERENCES sessions(session_id) ON DELETE SET NULL,
                outcome VARCHAR(20) NOT NULL,
                tag_weights JSONB NOT NULL DEFAULT '{}',
                processed BOOLEAN NOT NULL DEFAULT FALSE
            );

            CREATE INDEX idx_usage_ledger_tenant_ts ON usage_ledger_entries(tenant_id, ts);
            CREATE INDEX idx_usage_ledger_unprocessed
                ON usage_ledger_entries(ts) WHERE NOT processed;
        "#)
        .down(r#"
            DROP TABLE IF EXISTS usage_ledger_entries CASCADE;
        "#)
        .tag("core")
        .tag("usage")
        .build()
}

/// V009: Create counters table.
///
/// One row per `(scope_id, bucket)`, where `scope_id` is either a
/// tenant id or a tag id and `bucket` is a [`crate::...`]-style ledger key
/// suffix (`daily:YYYY-MM-DD`, `monthly:YYYY-MM`, `custom:<start>:<end>`).
/// Scope kind is not stored in this table; callers never mix tenant and
/// tag id spaces in a single query because the bucket prefix
/// (`tenant:`/`tag:`) lives in the cache key, not here — the accounting
/// worker is the only writer and always knows which space it's in.
#[must_use]
pub fn v009_create_counters() -> Migration {
    Migration::builder(20240101000009, "create_counters")
        .up(r#"
            CREATE TABLE IF NOT EXISTS counters (
                scope_id BIGINT NOT NULL,
                bucket VARCHAR(64) NOT NULL,
                total_usd DECIMAL(20, 8) NOT NULL DEFAULT 0,
                PRIMARY KEY (scope_id, bucket)
            );
        "#)
        .down(r#"
            DROP TABLE IF EXISTS counters CASCADE;
        "#)
        .tag("core")
        .tag("accounting")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_migrations_have_unique_versions() {
        let migrations = all_migrations();
        let mut versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        versions.sort_unstable();
        let mut deduped = versions.clone();
        deduped.dedup();
        assert_eq!(versions, deduped);
    }

    #[test]
    fn all_migrations_carry_down_sql() {
        for migration in all_migrations() {
            assert!(migration.down_sql.is_some(), "{} has no down migration", migration.name);
        }
    }

    #[test]
    fn migrations_are_ordered_by_version() {
        let migrations = all_migrations();
        for pair in migrations.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }
}
