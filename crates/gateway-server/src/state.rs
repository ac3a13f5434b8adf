//! Shared application state handed to every handler through Axum's
//! `State` extractor.

use dashmap::DashMap;
use gateway_budget::EventEmitter;
use gateway_config::{ConfigHandle, GatewayConfig};
use gateway_providers::ProviderRegistry;
use gateway_resilience::{CircuitBreaker, CircuitBreakerConfig, DistributedCache, RetryPolicy};
use gateway_routing::Router;
use gateway_telemetry::{Metrics, MetricsConfig, RequestTracker};
use sqlx::any::AnyPool;
use std::sync::Arc;

use crate::health::HealthChecker;

/// Lazily creates and caches one [`CircuitBreaker`] per provider id.
#[derive(Default)]
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl CircuitBreakerRegistry {
    /// Fetch the breaker for `provider_id`, creating it with defaults on
    /// first use.
    #[must_use]
    pub fn get_or_create(&self, provider_id: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(provider_id.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(provider_id, CircuitBreakerConfig::default()))
            })
            .clone()
    }
}

/// Everything a handler needs to serve a request: routing, resilience,
/// budget/event plumbing, and observability, all cheaply `Clone`-able.
#[derive(Clone)]
pub struct AppState {
    /// Hot-reloadable configuration.
    pub config: ConfigHandle,
    /// Configured upstream providers.
    pub providers: Arc<ProviderRegistry>,
    /// Model-to-provider dispatcher.
    pub router: Arc<Router>,
    /// Upstream call retry policy.
    pub retry_policy: Arc<RetryPolicy>,
    /// Per-provider circuit breakers.
    pub circuit_breakers: Arc<CircuitBreakerRegistry>,
    /// Prometheus metrics registry.
    pub metrics: Arc<Metrics>,
    /// In-flight/recent request tracker for `/admin/stats`.
    pub tracker: Arc<RequestTracker>,
    /// L1/L2 cache facade (C1).
    pub cache: Arc<DistributedCache>,
    /// Relational database pool.
    pub db_pool: AnyPool,
    /// Usage event stream producer handle (C9).
    pub events: EventEmitter,
    /// Liveness/readiness/startup probe state.
    pub health: Arc<HealthChecker>,
}

impl AppState {
    /// Start building state from scratch.
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }
}

/// Fluent builder for [`AppState`], primarily so tests can construct a
/// minimal instance without wiring every collaborator by hand.
pub struct AppStateBuilder {
    config: GatewayConfig,
    providers: Arc<ProviderRegistry>,
    router: Option<Arc<Router>>,
    retry_policy: Arc<RetryPolicy>,
    metrics: Arc<Metrics>,
    cache: Arc<DistributedCache>,
    db_pool: Option<AnyPool>,
    events: Option<EventEmitter>,
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self {
            config: GatewayConfig::default(),
            providers: Arc::new(ProviderRegistry::new()),
            router: None,
            retry_policy: Arc::new(RetryPolicy::with_defaults()),
            metrics: Arc::new(
                Metrics::new(&MetricsConfig::default()).expect("metrics registration is infallible for a fresh registry"),
            ),
            cache: Arc::new(DistributedCache::disabled()),
            db_pool: None,
            events: None,
        }
    }
}

impl AppStateBuilder {
    /// Set the initial configuration.
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the provider registry.
    #[must_use]
    pub fn providers(mut self, providers: Arc<ProviderRegistry>) -> Self {
        self.providers = providers;
        self
    }

    /// Set the router.
    #[must_use]
    pub fn router(mut self, router: Arc<Router>) -> Self {
        self.router = Some(router);
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = Arc::new(retry_policy);
        self
    }

    /// Set the metrics registry.
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    /// Set the cache facade.
    #[must_use]
    pub fn cache(mut self, cache: DistributedCache) -> Self {
        self.cache = Arc::new(cache);
        self
    }

    /// Set the database pool.
    #[must_use]
    pub fn db_pool(mut self, db_pool: AnyPool) -> Self {
        self.db_pool = Some(db_pool);
        self
    }

    /// Set the usage event emitter.
    #[must_use]
    pub fn events(mut self, events: EventEmitter) -> Self {
        self.events = Some(events);
        self
    }

    /// Finish building. Panics if `db_pool` or `events` was never set and
    /// this isn't a test build — every real deployment wires both at
    /// startup; a handler with neither can't do anything useful.
    #[must_use]
    pub fn build(self) -> AppState {
        let db_pool = self
            .db_pool
            .unwrap_or_else(|| sqlx::any::AnyPoolOptions::new().connect_lazy("sqlite::memory:").expect("lazy connect never fails"));
        let events = self.events.unwrap_or_else(|| gateway_budget::events::channel(1, db_pool.clone()).0);
        let router = self
            .router
            .unwrap_or_else(|| Arc::new(Router::new(Arc::clone(&self.providers), gateway_routing::RouterConfig::new())));

        AppState {
            config: ConfigHandle::new(self.config),
            providers: self.providers,
            router,
            retry_policy: self.retry_policy,
            circuit_breakers: Arc::new(CircuitBreakerRegistry::default()),
            metrics: self.metrics,
            tracker: RequestTracker::new(),
            cache: self.cache,
            db_pool,
            events,
            health: Arc::new(HealthChecker::with_defaults()),
        }
    }
}
