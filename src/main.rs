//! # LLM Inference Gateway
//!
//! Policy-enforcing reverse proxy for third-party LLM inference APIs.
//!
//! ## Features
//!
//! - Multi-provider support (OpenAI, Anthropic, Google)
//! - Hierarchical per-tenant/session/tag budget enforcement
//! - Fixed-window rate limiting
//! - Circuit breaker and retry patterns
//! - Prometheus metrics and hot configuration reload
//! - At-least-once usage accounting
//!
//! ## Usage
//!
//! ```bash
//! # Start with default configuration
//! llm-inference-gateway
//!
//! # Start with custom config file
//! llm-inference-gateway --config /path/to/config.yaml
//!
//! # Start with environment overrides
//! GATEWAY_PORT=9000 llm-inference-gateway
//! ```

use gateway_budget::AccountingWorker;
use gateway_config::{load_config, GatewayConfig};
use gateway_core::ProviderType;
use gateway_migrations::{schema, MigrationConfig, Migrator};
use gateway_providers::{AnthropicProvider, GoogleProvider, OpenAiProvider, ProviderRegistry};
use gateway_resilience::{DistributedCache, DistributedCacheConfig, RetryPolicy};
use gateway_routing::{Router, RouterConfig};
use gateway_server::{AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LoggingConfig, Metrics, MetricsConfig};
use std::env;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = init_logging(&LoggingConfig::new().with_level("info")) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting LLM Inference Gateway"
    );

    if let Err(e) = run().await {
        error!(error = %e, "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config().await?;

    info!(
        host = %config.server.host,
        port = config.server.port,
        "Configuration loaded"
    );

    let db_pool = run_migrations(&config).await?;
    info!("Database migrations applied");

    let metrics = Metrics::new(&MetricsConfig::default())?;

    let registry = Arc::new(create_provider_registry(&config)?);
    info!(providers = registry.len(), "Provider registry initialized");

    let router_config = RouterConfig::new();
    let router = Arc::new(Router::new(Arc::clone(&registry), router_config));

    let retry_policy = RetryPolicy::with_defaults();

    let cache = build_cache(&config);

    let (events, receiver) = gateway_budget::events::channel(1024, db_pool.clone());
    let accounting = AccountingWorker::new(receiver, db_pool.clone());
    tokio::spawn(async move {
        accounting.run().await;
    });

    let state = AppState::builder()
        .config(config.clone())
        .providers(registry)
        .router(router)
        .retry_policy(retry_policy)
        .metrics(metrics)
        .cache(cache)
        .db_pool(db_pool)
        .events(events)
        .build();

    let server_config = ServerConfig::new()
        .with_host(config.server.host.clone())
        .with_port(config.server.port);

    let server = Server::new(server_config, state);
    server.run().await?;

    Ok(())
}

/// Apply every outstanding schema migration against the configured
/// database before accepting traffic.
async fn run_migrations(
    config: &GatewayConfig,
) -> Result<sqlx::any::AnyPool, Box<dyn std::error::Error>> {
    let migration_config = MigrationConfig::builder()
        .database_url(config.database.url.clone())
        .build()?;

    let mut migrator = Migrator::new(migration_config).await?;
    migrator.add_migrations(schema::all_migrations());
    migrator.init().await?;
    migrator.run_pending().await?;

    Ok(migrator.pool().inner().clone())
}

/// Wire the distributed cache facade (C1) to Redis if configured, or an
/// in-memory-only facade otherwise. Absence of `REDIS_URL` is a valid
/// single-node deployment, not a misconfiguration.
fn build_cache(config: &GatewayConfig) -> DistributedCache {
    match &config.cache.redis_url {
        Some(url) => {
            let cache_config = DistributedCacheConfig {
                redis_url: Some(url.clone()),
                ..DistributedCacheConfig::default()
            };
            DistributedCache::new(cache_config)
        }
        None => {
            warn!("no redis_url configured, running with local cache only");
            DistributedCache::with_defaults()
        }
    }
}

/// Create provider registry from configuration
fn create_provider_registry(
    config: &GatewayConfig,
) -> Result<ProviderRegistry, Box<dyn std::error::Error>> {
    let registry = ProviderRegistry::new();

    if let Ok(api_key) = env::var("OPENAI_KEY") {
        info!("Registering OpenAI provider from environment");
        let openai_config = gateway_providers::openai::OpenAiConfig::new("openai", api_key);
        let provider = OpenAiProvider::new(openai_config)?;
        registry.register(Arc::new(provider), 100, 100)?;
    } else {
        warn!("OPENAI_KEY not set, OpenAI provider not available");
    }

    if let Ok(api_key) = env::var("ANTHROPIC_KEY") {
        info!("Registering Anthropic provider from environment");
        let anthropic_config = gateway_providers::anthropic::AnthropicConfig::new(api_key);
        let provider = AnthropicProvider::new(anthropic_config)?;
        registry.register(Arc::new(provider), 100, 100)?;
    } else {
        warn!("ANTHROPIC_KEY not set, Anthropic provider not available");
    }

    if let Ok(api_key) = env::var("GOOGLE_KEY") {
        info!("Registering Google provider from environment");
        let google_config = gateway_providers::google::GoogleConfig::google_ai("google", api_key);
        let provider = GoogleProvider::new(google_config)?;
        registry.register(Arc::new(provider), 100, 100)?;
    } else {
        warn!("GOOGLE_KEY not set, Google provider not available");
    }

    for provider_config in &config.providers {
        if !provider_config.enabled {
            continue;
        }

        let api_key = provider_config
            .api_key
            .clone()
            .or_else(|| provider_config.api_key_env.as_ref().and_then(|var| env::var(var).ok()));

        let Some(api_key) = api_key else {
            warn!(
                provider = %provider_config.id,
                "Provider has no API key configured, skipping"
            );
            continue;
        };

        match provider_config.provider_type {
            ProviderType::OpenAi => {
                if registry.get(&provider_config.id).is_none() {
                    let mut openai_config =
                        gateway_providers::openai::OpenAiConfig::new(&provider_config.id, &api_key);
                    if !provider_config.endpoint.is_empty() {
                        openai_config = openai_config.with_base_url(&provider_config.endpoint);
                    }
                    let provider = OpenAiProvider::new(openai_config)?;
                    registry.register(Arc::new(provider), provider_config.priority, provider_config.weight)?;
                }
            }
            ProviderType::Anthropic => {
                if registry.get(&provider_config.id).is_none() {
                    let mut anthropic_config = gateway_providers::anthropic::AnthropicConfig::new(&api_key);
                    if !provider_config.endpoint.is_empty() {
                        anthropic_config = anthropic_config.with_base_url(&provider_config.endpoint);
                    }
                    let provider = AnthropicProvider::with_id(&provider_config.id, anthropic_config)?;
                    registry.register(Arc::new(provider), provider_config.priority, provider_config.weight)?;
                }
            }
            ProviderType::Google => {
                if registry.get(&provider_config.id).is_none() {
                    let google_config =
                        gateway_providers::google::GoogleConfig::google_ai(&provider_config.id, &api_key);
                    let provider = GoogleProvider::new(google_config)?;
                    registry.register(Arc::new(provider), provider_config.priority, provider_config.weight)?;
                }
            }
        }
    }

    Ok(registry)
}
