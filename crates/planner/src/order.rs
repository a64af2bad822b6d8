//! Linear execution ordering, tolerant of cycles.

use checkflow_core::ExecutionStep;
use checkflow_graph::GraphStore;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Generates a correctness-preserving linear execution order.
///
/// Kahn's-style topological sort over strict/weak edges with a forced
/// fallback: on a cyclic graph every criterion is still scheduled exactly
/// once, with the cycle-breaking steps marked `forced`.
pub struct OrderPlanner;

impl OrderPlanner {
    /// Create a new planner.
    pub fn new() -> Self {
        Self
    }

    /// Order every criterion exactly once.
    ///
    /// Ties between simultaneously ready criteria break by ascending
    /// insertion order, so the result is deterministic. Prerequisites that
    /// are absent from the store never block (the validator reports them);
    /// optional edges never block. On deadlock the unscheduled criterion
    /// with the fewest unresolved prerequisites (ties by id) is
    /// force-scheduled and its unresolved strict prerequisites are treated
    /// as satisfied thereafter.
    pub fn execution_order(&self, store: &GraphStore) -> Vec<ExecutionStep> {
        let ids = store.ids();
        let mut steps: Vec<ExecutionStep> = Vec::with_capacity(ids.len());
        let mut scheduled: HashSet<&str> = HashSet::new();
        // Strict prerequisites forgiven when a dependent was force-scheduled
        let mut assumed: HashSet<String> = HashSet::new();

        while steps.len() < ids.len() {
            let ready = ids.iter().find(|id| {
                !scheduled.contains(id.as_str())
                    && self.unresolved(store, id, &scheduled, &assumed).is_empty()
            });

            if let Some(id) = ready {
                scheduled.insert(id.as_str());
                steps.push(ExecutionStep::normal(id.clone()));
                continue;
            }

            // Deadlock: every unscheduled criterion is blocked, so the graph
            // is cyclic here. Break the cycle at the cheapest point.
            let victim = ids
                .iter()
                .filter(|id| !scheduled.contains(id.as_str()))
                .min_by_key(|id| {
                    (self.unresolved(store, id, &scheduled, &assumed).len(), id.as_str())
                })
                .expect("deadlock implies at least one unscheduled criterion");

            let unresolved = self.unresolved(store, victim, &scheduled, &assumed);
            warn!(
                criterion = victim.as_str(),
                ignored = ?unresolved,
                "cycle deadlock: force-scheduling despite unresolved prerequisites"
            );
            for dep in store.blocking_edges(victim) {
                if unresolved.contains(&dep.criterion.as_str())
                    && dep.kind == checkflow_core::DependencyKind::Strict
                {
                    assumed.insert(dep.criterion.clone());
                }
            }
            scheduled.insert(victim.as_str());
            steps.push(ExecutionStep::forced(victim.clone()));
        }

        debug!(
            total = steps.len(),
            forced = steps.iter().filter(|s| s.forced).count(),
            "generated execution order"
        );
        steps
    }

    /// Blocking prerequisites of `id` that are present in the store but not
    /// yet scheduled or forgiven.
    fn unresolved<'a>(
        &self,
        store: &'a GraphStore,
        id: &str,
        scheduled: &HashSet<&str>,
        assumed: &HashSet<String>,
    ) -> Vec<&'a str> {
        store
            .blocking_edges(id)
            .map(|dep| dep.criterion.as_str())
            .filter(|target| {
                store.contains(target)
                    && !scheduled.contains(target)
                    && !assumed.contains(*target)
            })
            .collect()
    }
}

impl Default for OrderPlanner {
    fn default() -> Self {
        Self::new()
    }
}
