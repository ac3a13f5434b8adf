//! Prometheus metrics for the gateway's request path.

use prometheus::{
    Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

/// Metrics configuration. Currently just a namespace prefix; kept as a
/// struct (rather than a bare string argument) so new knobs don't break
/// callers.
#[derive(Debug, Clone, Default)]
pub struct MetricsConfig {
    /// Prefix applied to every metric name, e.g. `gateway`.
    pub namespace: String,
}

/// The gateway's Prometheus registry plus the handles to every metric it
/// exposes. Cheap to clone (all handles are internally `Arc`-based).
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    tokens_total: IntCounterVec,
    cost_usd_total: IntCounterVec,
}

impl Metrics {
    /// Build a fresh registry and register every metric.
    ///
    /// # Errors
    /// Returns an error if a metric with a duplicate name is already
    /// registered (can't happen with a fresh [`Registry`], but the
    /// `prometheus` API is fallible).
    pub fn new(config: &MetricsConfig) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let ns = config.namespace.as_str();

        let requests_total = IntCounterVec::new(
            Opts::new("requests_total", "Total requests handled").namespace(ns),
            &["route", "model", "provider", "outcome"],
        )?;
        let request_duration_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "request_duration_seconds",
                "Request handling latency, seconds",
            )
            .namespace(ns),
            &["route", "provider"],
        )?;
        let requests_in_flight = IntGauge::with_opts(
            Opts::new("requests_in_flight", "Requests currently being handled").namespace(ns),
        )?;
        let tokens_total = IntCounterVec::new(
            Opts::new("tokens_total", "Tokens consumed").namespace(ns),
            &["model", "kind"],
        )?;
        let cost_usd_total = IntCounterVec::new(
            Opts::new(
                "cost_usd_micros_total",
                "Priced cost in micro-USD (USD * 1_000_000, integer Prometheus counters can't hold Decimal)",
            )
            .namespace(ns),
            &["tenant_id"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(requests_in_flight.clone()))?;
        registry.register(Box::new(tokens_total.clone()))?;
        registry.register(Box::new(cost_usd_total.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration_seconds,
            requests_in_flight,
            tokens_total,
            cost_usd_total,
        })
    }

    /// Record a completed request.
    pub fn record_request(&self, route: &str, model: &str, provider: &str, outcome: &str, duration_secs: f64) {
        self.requests_total
            .with_label_values(&[route, model, provider, outcome])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[route, provider])
            .observe(duration_secs);
    }

    /// Increment the in-flight gauge; pair with [`Metrics::request_finished`].
    pub fn request_started(&self) {
        self.requests_in_flight.inc();
    }

    /// Decrement the in-flight gauge.
    pub fn request_finished(&self) {
        self.requests_in_flight.dec();
    }

    /// Record token usage for a completed request.
    pub fn record_tokens(&self, model: &str, prompt_tokens: u64, completion_tokens: u64) {
        self.tokens_total
            .with_label_values(&[model, "prompt"])
            .inc_by(prompt_tokens);
        self.tokens_total
            .with_label_values(&[model, "completion"])
            .inc_by(completion_tokens);
    }

    /// Record priced cost for a tenant, in micro-USD.
    pub fn record_cost_micros(&self, tenant_id: i64, micros: u64) {
        self.cost_usd_total
            .with_label_values(&[&tenant_id.to_string()])
            .inc_by(micros);
    }

    /// Render the registry in Prometheus text exposition format.
    #[must_use]
    pub fn gather(&self) -> String {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        if TextEncoder::new().encode(&metric_families, &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Per-request metric labels, threaded through the admission pipeline so
/// the final [`Metrics::record_request`] call has everything it needs
/// without re-deriving it from the request/response.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    /// Route the request hit.
    pub route: String,
    /// Model requested.
    pub model: String,
    /// Provider id that served (or would have served) the request.
    pub provider: String,
}
