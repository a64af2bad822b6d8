//! Read-only statistics view for operators.

use checkflow_core::{DependencyKind, ResourceTag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::GraphStore;

/// Aggregate figures describing the dependency graph.
///
/// Collection never mutates state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStatistics {
    /// Number of criteria in the store
    pub total_criteria: usize,

    /// Number of declared edges, dangling ones included
    pub total_edges: usize,

    /// Strict edge count
    pub strict_edges: usize,

    /// Weak edge count
    pub weak_edges: usize,

    /// Optional edge count
    pub optional_edges: usize,

    /// How many criteria may share a wave
    pub parallelizable_criteria: usize,

    /// Sum of all duration estimates
    pub total_estimated_duration_ms: u64,

    /// How many criteria carry each resource tag
    pub resource_histogram: BTreeMap<ResourceTag, usize>,
}

impl GraphStatistics {
    /// Collect statistics from the store.
    pub fn collect(store: &GraphStore) -> Self {
        let mut strict_edges = 0;
        let mut weak_edges = 0;
        let mut optional_edges = 0;
        let mut parallelizable_criteria = 0;
        let mut total_estimated_duration_ms = 0;
        let mut resource_histogram: BTreeMap<ResourceTag, usize> = BTreeMap::new();

        for criterion in store.criteria() {
            if criterion.parallelizable {
                parallelizable_criteria += 1;
            }
            total_estimated_duration_ms += criterion.estimated_duration_ms;
            for tag in &criterion.resource_requirements {
                *resource_histogram.entry(*tag).or_default() += 1;
            }
            for dep in &criterion.depends_on {
                match dep.kind {
                    DependencyKind::Strict => strict_edges += 1,
                    DependencyKind::Weak => weak_edges += 1,
                    DependencyKind::Optional => optional_edges += 1,
                }
            }
        }

        Self {
            total_criteria: store.len(),
            total_edges: store.edge_count(),
            strict_edges,
            weak_edges,
            optional_edges,
            parallelizable_criteria,
            total_estimated_duration_ms,
            resource_histogram,
        }
    }
}
