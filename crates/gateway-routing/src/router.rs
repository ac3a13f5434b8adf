//! Model-to-provider dispatch (C7's selection half): given a request,
//! narrow the configured provider set down to the one that will serve
//! it — by model support, declarative rule overrides, observed health,
//! and load-balancing among what's left.

use crate::load_balancer::{LoadBalancer, LoadBalancerConfig};
use crate::rules::{RoutingRule, RuleMatcher};
use crate::selector::{ProviderCandidate, SelectionCriteria};
use crate::strategy::LoadBalancingStrategy;
use dashmap::DashMap;
use gateway_core::{GatewayError, GatewayRequest, HealthStatus, LLMProvider};
use gateway_providers::ProviderRegistry;
use std::sync::Arc;

/// Router construction options.
pub struct RouterConfig {
    rules: Vec<RoutingRule>,
    strategy: LoadBalancingStrategy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            strategy: LoadBalancingStrategy::Weighted,
        }
    }
}

impl RouterConfig {
    /// Start from the default config (no rules, weighted balancing).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach declarative routing rules, consulted in order before
    /// load-balanced selection.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<RoutingRule>) -> Self {
        self.rules = rules;
        self
    }

    /// Override the load-balancing strategy among same-eligibility
    /// candidates.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: LoadBalancingStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}

/// Why the router picked the provider it did; surfaced to callers for
/// logging/audit, not acted on further.
#[derive(Debug, Clone)]
pub struct RouteDecision {
    /// Provider id selected.
    pub provider_id: String,
    /// Number of candidates considered before narrowing to one.
    pub candidates_considered: usize,
    /// Whether a [`RoutingRule`] altered the candidate set for this
    /// request.
    pub rule_applied: bool,
}

/// Dispatches a [`GatewayRequest`] to the right configured
/// [`LLMProvider`].
pub struct Router {
    registry: Arc<ProviderRegistry>,
    rules: Vec<RoutingRule>,
    load_balancer: LoadBalancer,
    health: DashMap<String, HealthStatus>,
}

impl Router {
    /// Build a router over an already-populated provider registry.
    #[must_use]
    pub fn new(registry: Arc<ProviderRegistry>, config: RouterConfig) -> Self {
        Self {
            registry,
            rules: config.rules,
            load_balancer: LoadBalancer::new(LoadBalancerConfig {
                strategy: config.strategy,
            }),
            health: DashMap::new(),
        }
    }

    /// Record the last observed health for a provider id. Defaults to
    /// [`HealthStatus::Healthy`] for a provider never recorded.
    pub fn update_health(&self, provider_id: &str, status: HealthStatus) {
        self.health.insert(provider_id.to_string(), status);
    }

    fn health_of(&self, provider_id: &str) -> HealthStatus {
        self.health
            .get(provider_id)
            .map_or(HealthStatus::Healthy, |entry| *entry)
    }

    /// Select a provider for `request`, returning the adapter plus the
    /// decision trail.
    ///
    /// # Errors
    /// Returns [`GatewayError::ModelNotFound`] if no configured,
    /// healthy, rule-eligible provider serves `request.model`.
    pub fn route(&self, request: &GatewayRequest) -> Result<(Arc<dyn LLMProvider>, RouteDecision), GatewayError> {
        let criteria = SelectionCriteria::for_model(&request.model);
        let candidates = crate::selector::ProviderSelector::candidates(&self.registry, &criteria, |id| {
            self.health_of(id)
        });

        if candidates.is_empty() {
            return Err(GatewayError::model_not_found(format!(
                "no healthy provider serves model {:?}",
                request.model
            )));
        }

        let considered = candidates.len();
        let before: Vec<String> = candidates.iter().map(|c| c.provider_id.clone()).collect();
        let eligible_ids = RuleMatcher::apply(&self.rules, &request.model, before.clone());
        let rule_applied = eligible_ids != before;

        let eligible: Vec<ProviderCandidate> = candidates
            .into_iter()
            .filter(|c| eligible_ids.iter().any(|id| id == &c.provider_id))
            .collect();

        let picked = self.load_balancer.pick(&eligible).ok_or_else(|| {
            GatewayError::model_not_found(format!(
                "routing rules excluded every provider for model {:?}",
                request.model
            ))
        })?;

        let provider = self.registry.get(&picked.provider_id).ok_or_else(|| {
            GatewayError::internal(format!(
                "router selected unknown provider id {:?}",
                picked.provider_id
            ))
        })?;

        Ok((
            provider,
            RouteDecision {
                provider_id: picked.provider_id.clone(),
                candidates_considered: considered,
                rule_applied,
            },
        ))
    }
}
