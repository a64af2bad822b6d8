//! Validation criteria and the dependency edges between them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A resource class a criterion needs while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceTag {
    /// Compute-bound work
    Cpu,
    /// Memory-hungry work
    Memory,
    /// Needs outbound network access
    Network,
    /// Touches the working tree or build artifacts
    Filesystem,
}

impl std::fmt::Display for ResourceTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceTag::Cpu => write!(f, "cpu"),
            ResourceTag::Memory => write!(f, "memory"),
            ResourceTag::Network => write!(f, "network"),
            ResourceTag::Filesystem => write!(f, "filesystem"),
        }
    }
}

/// Ordering strength of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Prerequisite must be scheduled (assumed successful) before the dependent.
    Strict,
    /// Should precede the dependent; absence or failure is non-blocking.
    Weak,
    /// Ordering hint only, ignorable if undefined.
    Optional,
}

impl DependencyKind {
    /// Whether this edge participates in hard ordering constraints.
    ///
    /// Optional edges are hints and never gate scheduling or cycle detection.
    pub fn blocks(&self) -> bool {
        matches!(self, DependencyKind::Strict | DependencyKind::Weak)
    }
}

impl Default for DependencyKind {
    fn default() -> Self {
        DependencyKind::Strict
    }
}

impl std::fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DependencyKind::Strict => write!(f, "strict"),
            DependencyKind::Weak => write!(f, "weak"),
            DependencyKind::Optional => write!(f, "optional"),
        }
    }
}

/// A dependency edge owned by its dependent criterion.
///
/// `criterion` names the prerequisite; it may reference an id that is not
/// (or no longer) in the store, which validation reports as
/// `missing_dependency` rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Id of the prerequisite criterion
    pub criterion: String,

    /// Ordering strength
    #[serde(rename = "type", default)]
    pub kind: DependencyKind,
}

impl Dependency {
    /// Strict edge to `criterion`.
    pub fn strict(criterion: impl Into<String>) -> Self {
        Self { criterion: criterion.into(), kind: DependencyKind::Strict }
    }

    /// Weak edge to `criterion`.
    pub fn weak(criterion: impl Into<String>) -> Self {
        Self { criterion: criterion.into(), kind: DependencyKind::Weak }
    }

    /// Optional edge to `criterion`.
    pub fn optional(criterion: impl Into<String>) -> Self {
        Self { criterion: criterion.into(), kind: DependencyKind::Optional }
    }
}

/// A named validation check with cost and resource metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    /// Unique key, chosen by the caller (e.g. "build-validation")
    pub id: String,

    /// Human-readable description
    pub description: String,

    /// Estimated wall-clock duration in milliseconds
    pub estimated_duration_ms: u64,

    /// Whether the criterion may share a wave with others
    pub parallelizable: bool,

    /// Resource classes the criterion occupies while running
    pub resource_requirements: BTreeSet<ResourceTag>,

    /// Edges to prerequisites of this criterion
    pub depends_on: Vec<Dependency>,
}

impl Criterion {
    /// Whether this criterion carries the given resource tag.
    pub fn requires(&self, tag: ResourceTag) -> bool {
        self.resource_requirements.contains(&tag)
    }
}

/// Validated per-criterion configuration accepted at the ingestion boundary.
///
/// Unknown fields are rejected rather than propagated as untyped maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CriterionSpec {
    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Estimated wall-clock duration in milliseconds
    #[serde(default)]
    pub estimated_duration_ms: u64,

    /// Whether the criterion may share a wave with others
    #[serde(default = "CriterionSpec::default_parallelizable")]
    pub parallelizable: bool,

    /// Resource classes the criterion occupies while running
    #[serde(default)]
    pub resource_requirements: BTreeSet<ResourceTag>,

    /// Edges to prerequisites of this criterion
    #[serde(default)]
    pub depends_on: Vec<Dependency>,
}

impl Default for CriterionSpec {
    fn default() -> Self {
        Self {
            description: String::new(),
            estimated_duration_ms: 0,
            parallelizable: true,
            resource_requirements: BTreeSet::new(),
            depends_on: Vec::new(),
        }
    }
}

impl CriterionSpec {
    fn default_parallelizable() -> bool {
        true
    }

    /// Materialize the spec under a caller-chosen id.
    pub fn into_criterion(self, id: impl Into<String>) -> Criterion {
        Criterion {
            id: id.into(),
            description: self.description,
            estimated_duration_ms: self.estimated_duration_ms,
            parallelizable: self.parallelizable,
            resource_requirements: self.resource_requirements,
            depends_on: self.depends_on,
        }
    }
}
