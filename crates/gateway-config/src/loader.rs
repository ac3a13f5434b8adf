//! Layered configuration loading: built-in defaults, an optional file,
//! then environment variable overrides — each layer wins over the last.

use crate::error::ConfigError;
use crate::settings::{GatewayConfig, ProviderConfig};
use gateway_core::ProviderType;
use secrecy::SecretString;
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load configuration from `GATEWAY_CONFIG_PATH` (if set) and the process
/// environment, falling back to [`GatewayConfig::default`] for anything
/// neither layer sets.
///
/// # Errors
/// Returns [`ConfigError`] if a configured file can't be read/parsed, or
/// if an environment variable holds a value that can't be parsed into its
/// target type (e.g. a non-numeric `GATEWAY_PORT`).
pub async fn load_config() -> Result<GatewayConfig, ConfigError> {
    let mut config = match env::var("GATEWAY_CONFIG_PATH") {
        Ok(path) => load_file(&path).await?,
        Err(_) => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    Ok(config)
}

/// Read and parse a config file, dispatching on its extension.
async fn load_file(path: &str) -> Result<GatewayConfig, ConfigError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Io {
            path: path.to_string(),
            source,
        })?;

    let extension = Path::new(path).extension().and_then(|e| e.to_str());
    let config = match extension {
        Some("toml") => toml::from_str(&contents)?,
        Some("yaml" | "yml") => serde_yaml::from_str(&contents)?,
        _ => {
            return Err(ConfigError::UnknownFormat {
                path: path.to_string(),
            })
        }
    };

    info!(path, "loaded configuration file");
    Ok(config)
}

/// Overlay the environment variable table from the external-interfaces
/// section onto an already-loaded config. Each variable's absence leaves
/// the prior layer's value untouched.
fn apply_env_overrides(config: &mut GatewayConfig) -> Result<(), ConfigError> {
    if let Ok(host) = env::var("GATEWAY_HOST") {
        config.server.host = host;
    }
    if let Ok(port) = env::var("GATEWAY_PORT") {
        config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
            field: "GATEWAY_PORT".to_string(),
            message: "not a valid port number".to_string(),
        })?;
    }
    if let Ok(url) = env::var("DATABASE_URL") {
        config.database.url = url;
    }
    if let Ok(url) = env::var("REDIS_URL") {
        config.cache.redis_url = Some(url);
    } else {
        debug!("REDIS_URL not set, cache facade will degrade to database-only reads");
    }

    if let Ok(raw) = env::var("DEFAULT_BUDGET_USD") {
        config.budget.default_budget_usd = Some(parse_decimal("DEFAULT_BUDGET_USD", &raw)?);
    }
    if let Ok(raw) = env::var("BUDGET_DAILY_USD") {
        config.budget.daily_usd = Some(parse_decimal("BUDGET_DAILY_USD", &raw)?);
    }
    if let Ok(raw) = env::var("BUDGET_MONTHLY_USD") {
        config.budget.monthly_usd = Some(parse_decimal("BUDGET_MONTHLY_USD", &raw)?);
    }
    if let Ok(raw) = env::var("BUDGET_PERIODS") {
        config.budget.enforced_periods = parse_periods(&raw)?;
    }

    if let Ok(key) = env::var("ADMIN_API_KEY") {
        config.admin.api_key = Some(SecretString::from(key));
    }

    apply_provider_env_credential(config, "OPENAI_KEY", "openai", ProviderType::OpenAi);
    apply_provider_env_credential(config, "ANTHROPIC_KEY", "anthropic", ProviderType::Anthropic);
    apply_provider_env_credential(config, "GOOGLE_KEY", "google", ProviderType::Google);

    Ok(())
}

/// `OPENAI_KEY`/`ANTHROPIC_KEY`/`GOOGLE_KEY`: synthesize a default
/// [`ProviderConfig`] entry for a family with no file-configured entry,
/// or fill in the credential of an existing one that's missing it.
fn apply_provider_env_credential(
    config: &mut GatewayConfig,
    env_var: &str,
    default_id: &str,
    provider_type: ProviderType,
) {
    let Ok(key) = env::var(env_var) else {
        return;
    };

    if let Some(existing) = config
        .providers
        .iter_mut()
        .find(|p| p.provider_type == provider_type && p.api_key.is_none())
    {
        existing.api_key = Some(key);
        return;
    }

    if config.providers.iter().any(|p| p.provider_type == provider_type) {
        return;
    }

    config.providers.push(ProviderConfig {
        id: default_id.to_string(),
        provider_type,
        endpoint: String::new(),
        api_key: Some(key),
        api_key_env: None,
        enabled: true,
        priority: 100,
        weight: 100,
    });
}

fn parse_decimal(field: &str, raw: &str) -> Result<rust_decimal::Decimal, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("{raw:?} is not a valid decimal"),
    })
}

fn parse_periods(raw: &str) -> Result<Vec<gateway_core::domain::Period>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.to_ascii_lowercase().as_str() {
            "daily" => Ok(gateway_core::domain::Period::Daily),
            "monthly" => Ok(gateway_core::domain::Period::Monthly),
            other => {
                warn!(period = other, "unrecognized entry in BUDGET_PERIODS, ignoring");
                Err(ConfigError::InvalidValue {
                    field: "BUDGET_PERIODS".to_string(),
                    message: format!("{other:?} is not one of daily, monthly"),
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_periods_accepts_comma_separated_list() {
        let periods = parse_periods("daily, monthly").unwrap();
        assert_eq!(periods.len(), 2);
    }

    #[test]
    fn parse_periods_rejects_unknown_entry() {
        assert!(parse_periods("daily,yearly").is_err());
    }

    #[test]
    fn provider_env_credential_creates_default_entry_when_absent() {
        let mut config = GatewayConfig::default();
        env::set_var("OPENAI_KEY_TEST_SCOPE_UNUSED", "x");
        apply_provider_env_credential(&mut config, "OPENAI_KEY_TEST_SCOPE_UNUSED", "openai", ProviderType::OpenAi);
        assert_eq!(config.providers.len(), 1);
        assert_eq!(config.providers[0].id, "openai");
        env::remove_var("OPENAI_KEY_TEST_SCOPE_UNUSED");
    }
}
