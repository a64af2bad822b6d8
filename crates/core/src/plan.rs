//! Execution plans: linear orders and parallel wave schedules.

use serde::{Deserialize, Serialize};

/// One scheduled criterion in an execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStep {
    /// Id of the scheduled criterion
    pub criterion: String,

    /// True when scheduling ignored an unresolved strict dependency
    /// inside a cycle to guarantee coverage
    pub forced: bool,
}

impl ExecutionStep {
    /// A normally scheduled step.
    pub fn normal(criterion: impl Into<String>) -> Self {
        Self { criterion: criterion.into(), forced: false }
    }

    /// A step scheduled despite unresolved strict prerequisites.
    pub fn forced(criterion: impl Into<String>) -> Self {
        Self { criterion: criterion.into(), forced: true }
    }
}

/// A set of criteria the plan designates safe to run concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Ordered steps packed into this wave
    pub criteria: Vec<ExecutionStep>,

    /// How many of them may run at once (the wave's packed width)
    pub concurrency: usize,
}

/// Kind of scheduling advice attached to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// Waves were narrowed by per-resource-class caps
    ResourceContention,
    /// A serialized criterion dominates the critical path
    LoadBalance,
}

/// Scheduling advice for the caller's executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    /// Advice category
    #[serde(rename = "type")]
    pub kind: RecommendationKind,

    /// Human-readable explanation
    pub detail: String,
}

/// A dependency- and resource-aware parallel schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPlan {
    /// Waves in execution order; wave N+1 starts after wave N completes
    pub waves: Vec<Wave>,

    /// Percentage reduction in total estimated duration versus fully
    /// sequential execution
    pub parallelization_gain: f64,

    /// Advice derived while packing
    pub recommendations: Vec<Recommendation>,
}

impl ExecutionPlan {
    /// Total number of steps across all waves.
    pub fn total_steps(&self) -> usize {
        self.waves.iter().map(|w| w.criteria.len()).sum()
    }

    /// Index of the wave containing `criterion`, if scheduled.
    pub fn wave_of(&self, criterion: &str) -> Option<usize> {
        self.waves.iter().position(|w| {
            w.criteria.iter().any(|s| s.criterion == criterion)
        })
    }

    /// Whether any step was force-scheduled.
    pub fn has_forced_steps(&self) -> bool {
        self.waves
            .iter()
            .any(|w| w.criteria.iter().any(|s| s.forced))
    }
}
