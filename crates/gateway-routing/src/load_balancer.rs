//! Picks one candidate from a pre-filtered, same-priority tier.

use crate::selector::ProviderCandidate;
use crate::strategy::{LoadBalancingStrategy, StrategyFactory};
use std::sync::atomic::AtomicUsize;

/// Load balancer configuration.
#[derive(Debug, Clone, Copy)]
pub struct LoadBalancerConfig {
    /// Which strategy to apply among same-priority candidates.
    pub strategy: LoadBalancingStrategy,
}

impl Default for LoadBalancerConfig {
    fn default() -> Self {
        Self {
            strategy: LoadBalancingStrategy::Weighted,
        }
    }
}

/// Stateful load balancer: holds the round-robin cursor across calls.
pub struct LoadBalancer {
    config: LoadBalancerConfig,
    cursor: AtomicUsize,
}

impl LoadBalancer {
    /// Build a balancer with the given config.
    #[must_use]
    pub const fn new(config: LoadBalancerConfig) -> Self {
        Self {
            config,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Pick one candidate, or `None` if `candidates` is empty.
    #[must_use]
    pub fn pick<'a>(&self, candidates: &'a [ProviderCandidate]) -> Option<&'a ProviderCandidate> {
        StrategyFactory::pick(self.config.strategy, candidates, &self.cursor)
    }
}
