//! Checkflow core data models.
//!
//! This crate defines the fundamental data structures that power the
//! validation-pipeline execution planner.

#![warn(missing_docs)]

// Criteria and dependency edges
mod criterion;

// Structural validation findings
mod issue;

// Execution plans
mod plan;

// System resource profiles
mod resource;

// Re-exports
pub use criterion::{
    Criterion, CriterionSpec, Dependency, DependencyKind, ResourceTag,
};
pub use issue::{GraphValidation, ValidationIssue};
pub use plan::{
    ExecutionPlan, ExecutionStep, Recommendation, RecommendationKind, Wave,
};
pub use resource::{
    AdaptiveOptimizations, AdaptivePlan, ResourceProfile, ResourceSchedulingHint,
    SystemAware,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
