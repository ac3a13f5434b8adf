//! Typed configuration structs.

use gateway_core::domain::Period;
use gateway_core::ProviderType;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// A single configured upstream provider adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Adapter instance id (an operator may run two `openai` adapters
    /// against different base URLs, each with its own id).
    pub id: String,
    /// Which upstream API family this adapter speaks.
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Base URL override; empty string means "use the adapter's default".
    #[serde(default)]
    pub endpoint: String,
    /// Credential supplied directly in the config file. Prefer
    /// `api_key_env` for anything checked into version control.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Name of an environment variable to read the credential from.
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Whether this entry is consulted at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Dispatch priority; lower wins when a model is served by more than
    /// one configured provider.
    #[serde(default = "default_priority")]
    pub priority: u32,
    /// Relative weight among same-priority providers.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

const fn default_true() -> bool {
    true
}

const fn default_priority() -> u32 {
    100
}

const fn default_weight() -> u32 {
    100
}

impl ProviderConfig {
    /// Validate the `endpoint` override, when set, is a well-formed URL.
    ///
    /// # Errors
    /// Returns the offending string when `endpoint` is non-empty and not
    /// a parseable URL.
    pub fn validate_endpoint(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Ok(());
        }
        url::Url::parse(&self.endpoint)
            .map(|_| ())
            .map_err(|e| format!("invalid endpoint {:?}: {e}", self.endpoint))
    }
}

/// Fallback budget ceilings applied when a tenant has no row of its own
/// for that period — see `BUDGET_DAILY_USD`/`BUDGET_MONTHLY_USD` in the
/// environment inputs table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BudgetDefaults {
    /// Ceiling applied when neither a daily nor monthly override is set.
    pub default_budget_usd: Option<rust_decimal::Decimal>,
    /// Fallback daily ceiling.
    pub daily_usd: Option<rust_decimal::Decimal>,
    /// Fallback monthly ceiling.
    pub monthly_usd: Option<rust_decimal::Decimal>,
    /// Which periods are enforced when a tenant has no configured budget
    /// row at all.
    pub enforced_periods: Vec<Period>,
}

/// Remote cache connection settings, layered onto
/// [`gateway_resilience::DistributedCacheConfig`] at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheSettings {
    /// `redis://` connection string. Absence disables the L2 cache
    /// entirely — every lookup falls through to the database.
    pub redis_url: Option<String>,
}

/// Database connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `AnyPool`-compatible connection string (`postgres://...` or
    /// `sqlite://...`).
    pub url: String,
    /// Maximum pool connections.
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 10,
        }
    }
}

/// Bearer credential for the administrative surface. Stored as a
/// [`SecretString`] so it never appears in a `{:?}` dump of
/// [`crate::GatewayConfig`].
#[derive(Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AdminSettings {
    /// The admin bearer credential, when configured.
    pub api_key: Option<SecretString>,
}

impl std::fmt::Debug for AdminSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Top-level configuration, assembled by [`crate::load_config`] from
/// defaults, an optional file, and environment overrides, in that order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Configured upstream providers.
    pub providers: Vec<ProviderConfig>,
    /// Budget fallback ceilings.
    pub budget: BudgetDefaults,
    /// Remote cache settings.
    pub cache: CacheSettings,
    /// Database connection settings.
    pub database: DatabaseSettings,
    /// Admin surface settings.
    pub admin: AdminSettings,
}
