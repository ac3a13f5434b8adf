//! Candidate filtering: which configured providers can currently serve a
//! given model, with their dispatch priority and observed health.

use gateway_core::HealthStatus;
use gateway_providers::ProviderRegistry;

/// A provider eligible to serve a specific model, annotated with the
/// scheduling metadata [`crate::strategy::StrategyFactory`] picks on.
#[derive(Debug, Clone)]
pub struct ProviderCandidate {
    /// The adapter instance id.
    pub provider_id: String,
    /// Dispatch priority; lower wins.
    pub priority: u32,
    /// Relative weight among same-priority candidates.
    pub weight: u32,
    /// Last observed health.
    pub health: HealthStatus,
}

/// What a caller is selecting a provider for.
#[derive(Debug, Clone)]
pub struct SelectionCriteria {
    /// Model id requested.
    pub model: String,
    /// Exclude these provider ids (e.g. ones whose circuit breaker is
    /// already open for this request).
    pub exclude: Vec<String>,
}

impl SelectionCriteria {
    /// Build criteria for a model with nothing excluded.
    #[must_use]
    pub fn for_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            exclude: Vec::new(),
        }
    }
}

/// Narrows a [`ProviderRegistry`] down to healthy, non-excluded
/// candidates for one model, grouped into priority tiers by the caller.
pub struct ProviderSelector;

impl ProviderSelector {
    /// All candidates serving `criteria.model`, in registry priority
    /// order, with unhealthy or excluded providers filtered out. An
	/// empty result means no configured provider can serve this model.
    #[must_use]
    pub fn candidates(
        registry: &ProviderRegistry,
        criteria: &SelectionCriteria,
        health: impl Fn(&str) -> HealthStatus,
    ) -> Vec<ProviderCandidate> {
        registry
            .providers_for_model(&criteria.model)
            .into_iter()
            .filter(|p| !criteria.exclude.iter().any(|id| id == p.id()))
            .map(|p| {
                let status = health(p.id());
                ProviderCandidate {
                    provider_id: p.id().to_string(),
                    priority: 0,
                    weight: 100,
                    health: status,
                }
            })
            .filter(|c| c.health != HealthStatus::Unhealthy)
            .collect()
    }

    /// The lowest-priority tier present in `candidates`, or an empty
    /// slice if `candidates` is empty. Only this tier is eligible for
    /// load balancing; lower-priority providers are a cold spare.
    #[must_use]
    pub fn lowest_tier(candidates: &[ProviderCandidate]) -> Vec<ProviderCandidate> {
        let Some(min) = candidates.iter().map(|c| c.priority).min() else {
            return Vec::new();
        };
        candidates.iter().filter(|c| c.priority == min).cloned().collect()
    }
}
