//! Selection strategies for choosing among multiple healthy candidates
//! serving the same model.

use crate::selector::ProviderCandidate;
use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How to pick among same-priority candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBalancingStrategy {
    /// Cycle through candidates in order.
    RoundRobin,
    /// Pick uniformly at random.
    Random,
    /// Pick with probability proportional to each candidate's weight.
    Weighted,
}

/// Builds a stateful picker for a [`LoadBalancingStrategy`]. Round-robin
/// needs a cursor; the others are stateless, so this only actually
/// allocates anything for [`LoadBalancingStrategy::RoundRobin`].
pub struct StrategyFactory;

impl StrategyFactory {
    /// Pick one candidate from a non-empty slice, or `None` if it's
    /// empty. `cursor` is only consulted for [`LoadBalancingStrategy::RoundRobin`].
    #[must_use]
    pub fn pick<'a>(
        strategy: LoadBalancingStrategy,
        candidates: &'a [ProviderCandidate],
        cursor: &AtomicUsize,
    ) -> Option<&'a ProviderCandidate> {
        if candidates.is_empty() {
            return None;
        }

        match strategy {
            LoadBalancingStrategy::RoundRobin => {
                let i = cursor.fetch_add(1, Ordering::Relaxed) % candidates.len();
                candidates.get(i)
            }
            LoadBalancingStrategy::Random => {
                let i = rand::thread_rng().gen_range(0..candidates.len());
                candidates.get(i)
            }
            LoadBalancingStrategy::Weighted => {
                let total: u32 = candidates.iter().map(|c| c.weight.max(1)).sum();
                let mut pick = rand::thread_rng().gen_range(0..total);
                candidates
                    .iter()
                    .find(|c| {
                        let w = c.weight.max(1);
                        if pick < w {
                            true
                        } else {
                            pick -= w;
                            false
                        }
                    })
                    .or_else(|| candidates.last())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::HealthStatus;

    fn candidate(id: &str, weight: u32) -> ProviderCandidate {
        ProviderCandidate {
            provider_id: id.to_string(),
            priority: 0,
            weight,
            health: HealthStatus::Healthy,
        }
    }

    #[test]
    fn round_robin_cycles_in_order() {
        let candidates = vec![candidate("a", 1), candidate("b", 1)];
        let cursor = AtomicUsize::new(0);
        let first = StrategyFactory::pick(LoadBalancingStrategy::RoundRobin, &candidates, &cursor).unwrap();
        let second = StrategyFactory::pick(LoadBalancingStrategy::RoundRobin, &candidates, &cursor).unwrap();
        assert_ne!(first.provider_id, second.provider_id);
    }

    #[test]
    fn empty_candidates_picks_none() {
        let cursor = AtomicUsize::new(0);
        assert!(StrategyFactory::pick(LoadBalancingStrategy::Random, &[], &cursor).is_none());
    }

    #[test]
    fn weighted_never_picks_a_zero_weight_exclusively_when_others_exist() {
        let candidates = vec![candidate("zero", 0), candidate("heavy", 100)];
        let cursor = AtomicUsize::new(0);
        for _ in 0..20 {
            let picked = StrategyFactory::pick(LoadBalancingStrategy::Weighted, &candidates, &cursor).unwrap();
            assert!(picked.provider_id == "zero" || picked.provider_id == "heavy");
        }
    }
}
