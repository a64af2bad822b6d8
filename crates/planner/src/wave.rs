//! Greedy wave packing under concurrency and resource constraints.

use checkflow_core::{
    ExecutionPlan, ExecutionStep, Recommendation, RecommendationKind, ResourceTag, Wave,
};
use checkflow_graph::GraphStore;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::order::OrderPlanner;
use crate::policy::PlannerPolicy;

/// Groups the linear execution order into concurrency-bounded,
/// resource-aware waves.
pub struct WavePlanner {
    policy: PlannerPolicy,
}

impl WavePlanner {
    /// Create a planner with the default policy.
    pub fn new() -> Self {
        Self { policy: PlannerPolicy::default() }
    }

    /// Create a planner with a custom policy.
    pub fn with_policy(policy: PlannerPolicy) -> Self {
        Self { policy }
    }

    /// Pack the execution order into waves of at most `max_concurrency`
    /// criteria.
    ///
    /// Each wave admits remaining criteria, scanned in execution order,
    /// whose strict prerequisites are already placed in earlier waves. A
    /// non-parallelizable criterion always occupies a wave alone. Admission
    /// also respects the per-resource-class caps of the policy. The result
    /// carries the parallelization gain over sequential execution plus any
    /// contention or load-balance advice derived while packing.
    pub fn parallel_plan(&self, store: &GraphStore, max_concurrency: usize) -> ExecutionPlan {
        let max_concurrency = max_concurrency.max(1);
        let order = OrderPlanner::new().execution_order(store);
        let position: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(idx, step)| (step.criterion.as_str(), idx))
            .collect();

        let mut remaining: Vec<ExecutionStep> = order.clone();
        let mut scheduled: HashSet<String> = HashSet::new();
        let mut waves: Vec<Wave> = Vec::new();
        let mut cap_constrained_waves = 0usize;

        while !remaining.is_empty() {
            let mut admitted: Vec<usize> = Vec::new();
            let mut tag_counts: HashMap<ResourceTag, usize> = HashMap::new();
            let mut cap_blocked = false;
            let mut closed_by_solo = false;

            for (idx, step) in remaining.iter().enumerate() {
                if admitted.len() >= max_concurrency || closed_by_solo {
                    break;
                }
                let Some(criterion) = store.get(&step.criterion) else {
                    continue;
                };

                if !self.prerequisites_met(store, &step.criterion, &position, &scheduled) {
                    continue;
                }

                if !criterion.parallelizable {
                    // Occupies a wave alone; wait for a fresh one otherwise
                    if admitted.is_empty() {
                        admitted.push(idx);
                        closed_by_solo = true;
                    }
                    continue;
                }

                if let Some(over_cap) = self.resource_cap_hit(criterion, &tag_counts) {
                    debug!(
                        criterion = step.criterion.as_str(),
                        resource = %over_cap,
                        "deferred to a later wave by resource cap"
                    );
                    cap_blocked = true;
                    continue;
                }

                for tag in &criterion.resource_requirements {
                    *tag_counts.entry(*tag).or_default() += 1;
                }
                admitted.push(idx);
            }

            // The earliest remaining criterion is always admissible to an
            // empty wave; this keeps pathological policies from stalling.
            if admitted.is_empty() {
                admitted.push(0);
            }

            if cap_blocked {
                cap_constrained_waves += 1;
            }

            let mut criteria = Vec::with_capacity(admitted.len());
            for idx in admitted.iter().rev() {
                criteria.push(remaining.remove(*idx));
            }
            criteria.reverse();
            for step in &criteria {
                scheduled.insert(step.criterion.clone());
            }
            let concurrency = criteria.len();
            waves.push(Wave { criteria, concurrency });
        }

        let parallelization_gain = self.parallelization_gain(store, &waves);
        let recommendations =
            self.recommendations(store, &waves, cap_constrained_waves);

        debug!(
            waves = waves.len(),
            gain = parallelization_gain,
            "generated parallel plan"
        );

        ExecutionPlan { waves, parallelization_gain, recommendations }
    }

    /// Strict prerequisites that exist and precede the candidate in the
    /// linear order must already sit in an earlier wave. Prerequisites that
    /// follow the candidate in the order were cycle-broken by forcing and
    /// do not gate.
    fn prerequisites_met(
        &self,
        store: &GraphStore,
        id: &str,
        position: &HashMap<&str, usize>,
        scheduled: &HashSet<String>,
    ) -> bool {
        let own_position = position[id];
        store
            .blocking_edges(id)
            .filter(|dep| dep.kind == checkflow_core::DependencyKind::Strict)
            .all(|dep| {
                match position.get(dep.criterion.as_str()) {
                    Some(pos) if *pos < own_position => scheduled.contains(&dep.criterion),
                    // Later in the order (forced cycle break) or missing
                    _ => true,
                }
            })
    }

    /// First resource class whose in-wave cap the candidate would exceed.
    fn resource_cap_hit(
        &self,
        criterion: &checkflow_core::Criterion,
        tag_counts: &HashMap<ResourceTag, usize>,
    ) -> Option<ResourceTag> {
        criterion.resource_requirements.iter().copied().find(|tag| {
            match self.policy.cap_for(*tag) {
                Some(cap) => tag_counts.get(tag).copied().unwrap_or(0) >= cap,
                None => false,
            }
        })
    }

    /// 100 × (1 − Σ(max duration per wave) / Σ(all durations)).
    fn parallelization_gain(&self, store: &GraphStore, waves: &[Wave]) -> f64 {
        let sequential: u64 = store
            .criteria()
            .iter()
            .map(|c| c.estimated_duration_ms)
            .sum();
        if sequential == 0 {
            return 0.0;
        }
        let waved: u64 = waves.iter().map(|w| self.wave_duration(store, w)).sum();
        100.0 * (1.0 - waved as f64 / sequential as f64)
    }

    fn wave_duration(&self, store: &GraphStore, wave: &Wave) -> u64 {
        wave.criteria
            .iter()
            .filter_map(|step| store.get(&step.criterion))
            .map(|c| c.estimated_duration_ms)
            .max()
            .unwrap_or(0)
    }

    fn recommendations(
        &self,
        store: &GraphStore,
        waves: &[Wave],
        cap_constrained_waves: usize,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if cap_constrained_waves >= 2 {
            recommendations.push(Recommendation {
                kind: RecommendationKind::ResourceContention,
                detail: format!(
                    "{cap_constrained_waves} waves were narrowed by per-resource \
                     concurrency caps; consider splitting exclusive resource \
                     requirements across criteria"
                ),
            });
        }

        // A serialized criterion far heavier than the rest of the schedule
        // is the critical path; flag it.
        if waves.len() >= 2 {
            for (idx, wave) in waves.iter().enumerate() {
                let [step] = wave.criteria.as_slice() else {
                    continue;
                };
                let Some(criterion) = store.get(&step.criterion) else {
                    continue;
                };
                if criterion.parallelizable {
                    continue;
                }

                let other_total: u64 = waves
                    .iter()
                    .enumerate()
                    .filter(|(other_idx, _)| *other_idx != idx)
                    .map(|(_, other)| self.wave_duration(store, other))
                    .sum();
                let other_mean = other_total as f64 / (waves.len() - 1) as f64;

                if other_mean > 0.0
                    && criterion.estimated_duration_ms as f64
                        > self.policy.load_balance_factor * other_mean
                {
                    recommendations.push(Recommendation {
                        kind: RecommendationKind::LoadBalance,
                        detail: format!(
                            "'{}' runs alone for {}ms and dominates the schedule; \
                             splitting it would shorten the critical path",
                            criterion.id, criterion.estimated_duration_ms
                        ),
                    });
                }
            }
        }

        recommendations
    }
}

impl Default for WavePlanner {
    fn default() -> Self {
        Self::new()
    }
}
