//! Resource-aware concurrency tuning on top of the wave planner.

use checkflow_core::{
    AdaptiveOptimizations, AdaptivePlan, ResourceProfile, ResourceSchedulingHint,
    ResourceTag, SystemAware,
};
use checkflow_graph::GraphStore;
use tracing::debug;

use crate::policy::PlannerPolicy;
use crate::wave::WavePlanner;

/// Wraps [`WavePlanner`] with system-resource-aware concurrency tuning.
pub struct AdaptivePlanner {
    policy: PlannerPolicy,
}

impl AdaptivePlanner {
    /// Create a planner with the default policy.
    pub fn new() -> Self {
        Self { policy: PlannerPolicy::default() }
    }

    /// Create a planner with a custom policy.
    pub fn with_policy(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    /// Produce a wave plan tuned to the given resource profile.
    ///
    /// The concurrency recommendation baselines at the available CPUs
    /// (floor 1), shrinks when free memory cannot hold the memory-tagged
    /// criteria at that width, and grows (bounded at twice the CPU count)
    /// when both disk and network are idle. A slow network additionally
    /// yields a prioritization hint for network-tagged criteria.
    pub fn adaptive_plan(&self, store: &GraphStore, profile: &ResourceProfile) -> AdaptivePlan {
        let mut rationale = Vec::new();

        let base = profile.available_cpus.max(1);
        let mut recommended = base;
        rationale.push(format!("baseline {base} from available CPUs"));

        let memory_criteria = store
            .criteria()
            .iter()
            .filter(|c| c.requires(ResourceTag::Memory))
            .count();
        if memory_criteria > 0 {
            let footprint = memory_criteria as u64 * self.policy.memory_per_slot_bytes;
            if profile.available_memory_bytes < footprint {
                let allowed = ((profile.available_memory_bytes
                    / self.policy.memory_per_slot_bytes)
                    .max(1) as usize)
                    .min(recommended);
                if allowed < recommended {
                    rationale.push(format!(
                        "reduced to {allowed}: free memory covers {allowed} of \
                         {memory_criteria} memory-bound criteria"
                    ));
                    recommended = allowed;
                }
            }
        }

        if profile.disk_io_load <= self.policy.low_disk_io_load
            && profile.network_latency_ms <= self.policy.low_network_latency_ms
        {
            let boosted = (recommended + self.policy.burst_bonus).min(base * 2);
            if boosted > recommended {
                rationale.push(format!(
                    "boosted to {boosted}: disk and network are both idle"
                ));
                recommended = boosted;
            }
        }

        let resource_scheduling = self.resource_scheduling(store, profile);

        debug!(
            recommended,
            cpus = profile.available_cpus,
            "generated adaptive plan"
        );

        let plan =
            WavePlanner::with_policy(self.policy.clone()).parallel_plan(store, recommended);

        AdaptivePlan {
            plan,
            adaptive_optimizations: AdaptiveOptimizations {
                system_aware: SystemAware {
                    recommended_concurrency: recommended,
                    rationale,
                },
                resource_scheduling,
            },
        }
    }

    fn resource_scheduling(
        &self,
        store: &GraphStore,
        profile: &ResourceProfile,
    ) -> Vec<ResourceSchedulingHint> {
        let mut hints = Vec::new();

        if profile.network_latency_ms > self.policy.high_network_latency_ms {
            let network_criteria: Vec<String> = store
                .criteria()
                .iter()
                .filter(|c| c.requires(ResourceTag::Network))
                .map(|c| c.id.clone())
                .collect();
            if !network_criteria.is_empty() {
                hints.push(ResourceSchedulingHint::NetworkPrioritization {
                    criteria: network_criteria,
                    max_concurrency: self.policy.network_concurrency_cap,
                    detail: format!(
                        "network latency is {}ms; start network-bound criteria \
                         first and cap how many run together",
                        profile.network_latency_ms
                    ),
                });
            }
        }

        hints
    }
}

impl Default for AdaptivePlanner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn generous_profile(cpus: usize) -> ResourceProfile {
        ResourceProfile {
            available_cpus: cpus,
            available_memory_bytes: 64 * 1024 * 1024 * 1024,
            network_latency_ms: 10,
            disk_io_load: 0.1,
        }
    }

    fn constrained_profile(cpus: usize) -> ResourceProfile {
        ResourceProfile {
            available_cpus: cpus,
            available_memory_bytes: 64 * 1024 * 1024 * 1024,
            network_latency_ms: 250,
            disk_io_load: 0.9,
        }
    }

    #[test]
    fn test_bigger_host_gets_bigger_recommendation() {
        let store = GraphStore::new();
        let planner = AdaptivePlanner::new();

        let big = planner.adaptive_plan(&store, &generous_profile(32));
        let small = planner.adaptive_plan(&store, &constrained_profile(2));

        assert!(
            big.adaptive_optimizations.system_aware.recommended_concurrency
                > small.adaptive_optimizations.system_aware.recommended_concurrency
        );
    }

    #[test]
    fn test_idle_host_gets_bounded_boost() {
        let store = GraphStore::new();
        let plan = AdaptivePlanner::new().adaptive_plan(&store, &generous_profile(4));
        let recommended =
            plan.adaptive_optimizations.system_aware.recommended_concurrency;
        assert_eq!(recommended, 6);
        assert!(recommended <= 8);
    }

    #[test]
    fn test_zero_cpus_floors_at_one() {
        let store = GraphStore::new();
        let profile = ResourceProfile {
            available_cpus: 0,
            ..constrained_profile(0)
        };
        let plan = AdaptivePlanner::new().adaptive_plan(&store, &profile);
        assert!(
            plan.adaptive_optimizations.system_aware.recommended_concurrency >= 1
        );
    }

    #[test]
    fn test_low_memory_reduces_recommendation() {
        let store = GraphStore::new(); // two memory-tagged defaults
        let profile = ResourceProfile {
            available_cpus: 16,
            available_memory_bytes: 600 * 1024 * 1024,
            network_latency_ms: 250,
            disk_io_load: 0.9,
        };
        let plan = AdaptivePlanner::new().adaptive_plan(&store, &profile);
        let system_aware = &plan.adaptive_optimizations.system_aware;
        assert_eq!(system_aware.recommended_concurrency, 1);
        assert!(system_aware.rationale.iter().any(|r| r.contains("memory")));
    }

    #[test]
    fn test_memory_reduction_ignored_without_memory_criteria() {
        let mut store = GraphStore::empty();
        store.add_json("a", &json!({"resourceRequirements": ["cpu"]})).unwrap();

        let profile = ResourceProfile {
            available_cpus: 8,
            available_memory_bytes: 1024,
            network_latency_ms: 250,
            disk_io_load: 0.9,
        };
        let plan = AdaptivePlanner::new().adaptive_plan(&store, &profile);
        assert_eq!(
            plan.adaptive_optimizations.system_aware.recommended_concurrency,
            8
        );
    }

    #[test]
    fn test_slow_network_yields_prioritization_hint() {
        let store = GraphStore::new(); // security/start carry the network tag
        let plan =
            AdaptivePlanner::new().adaptive_plan(&store, &constrained_profile(4));

        let hints = &plan.adaptive_optimizations.resource_scheduling;
        assert_eq!(hints.len(), 1);
        let ResourceSchedulingHint::NetworkPrioritization {
            criteria,
            max_concurrency,
            ..
        } = &hints[0];
        assert!(criteria.contains(&"security-validation".to_string()));
        assert_eq!(*max_concurrency, 2);
    }

    #[test]
    fn test_fast_network_yields_no_hint() {
        let store = GraphStore::new();
        let plan =
            AdaptivePlanner::new().adaptive_plan(&store, &generous_profile(4));
        assert!(plan.adaptive_optimizations.resource_scheduling.is_empty());
    }

    #[test]
    fn test_no_network_criteria_yields_no_hint() {
        let mut store = GraphStore::empty();
        store.add_json("a", &json!({"resourceRequirements": ["cpu"]})).unwrap();
        let plan =
            AdaptivePlanner::new().adaptive_plan(&store, &constrained_profile(4));
        assert!(plan.adaptive_optimizations.resource_scheduling.is_empty());
    }

    #[test]
    fn test_wrapped_plan_covers_whole_graph() {
        let store = GraphStore::new();
        let plan = AdaptivePlanner::new().adaptive_plan(&store, &generous_profile(8));
        assert_eq!(plan.plan.total_steps(), 7);
        assert!(plan.plan.parallelization_gain >= 0.0);
    }
}
