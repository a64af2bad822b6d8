//! In-memory criterion store.
//!
//! The store owns the dependency graph: criteria keyed by id plus the edges
//! each criterion declares. Mutation is pure in-memory state; nothing is
//! persisted until the storage layer is asked to save.

use checkflow_core::{Criterion, CriterionSpec, Dependency, ResourceTag};
use std::collections::HashMap;
use tracing::debug;

/// Errors for malformed caller input at the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Criterion id was empty or whitespace
    #[error("criterion id must not be blank")]
    BlankId,

    /// Per-criterion configuration did not match the expected shape
    #[error("malformed criterion config: {0}")]
    MalformedConfig(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// In-memory mapping of criterion id to metadata and dependency edges.
///
/// Insertion order is tracked explicitly; it is the deterministic tie-break
/// for every planner downstream.
#[derive(Debug, Clone)]
pub struct GraphStore {
    criteria: HashMap<String, Criterion>,
    order: Vec<String>,
}

impl GraphStore {
    /// A store seeded with the canonical CI pipeline criteria.
    pub fn new() -> Self {
        let mut store = Self::empty();
        for criterion in default_pipeline() {
            store.insert(criterion);
        }
        store
    }

    /// A bare store with no criteria.
    pub fn empty() -> Self {
        Self { criteria: HashMap::new(), order: Vec::new() }
    }

    /// Insert or overwrite the criterion named `id`.
    ///
    /// Re-adding an existing id replaces its metadata and edges but keeps
    /// its original insertion position.
    pub fn add(&mut self, id: &str, spec: CriterionSpec) -> Result<()> {
        if id.trim().is_empty() {
            return Err(GraphError::BlankId);
        }
        debug!(id, "adding criterion");
        self.insert(spec.into_criterion(id));
        Ok(())
    }

    /// Parse an untrusted JSON config and insert it under `id`.
    ///
    /// This is the ingestion boundary: unknown or malformed fields are
    /// rejected here instead of propagating untyped maps into the planner.
    pub fn add_json(&mut self, id: &str, config: &serde_json::Value) -> Result<()> {
        let spec: CriterionSpec = serde_json::from_value(config.clone())?;
        self.add(id, spec)
    }

    /// Remove the criterion named `id` along with the edges it owns.
    ///
    /// Edges elsewhere that name `id` as their prerequisite are left intact;
    /// they surface as `missing_dependency` issues on the next validation
    /// rather than being silently pruned. Returns whether the id existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let existed = self.criteria.remove(id).is_some();
        if existed {
            self.order.retain(|entry| entry != id);
            debug!(id, "removed criterion");
        }
        existed
    }

    /// Look up a criterion by id.
    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.criteria.get(id)
    }

    /// Whether a criterion named `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.criteria.contains_key(id)
    }

    /// Criterion ids in insertion order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    /// Criteria in insertion order.
    pub fn criteria(&self) -> Vec<&Criterion> {
        self.order
            .iter()
            .filter_map(|id| self.criteria.get(id))
            .collect()
    }

    /// Number of criteria.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the store holds no criteria.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of declared edges, dangling ones included.
    pub fn edge_count(&self) -> usize {
        self.criteria.values().map(|c| c.depends_on.len()).sum()
    }

    /// Edges of `id` that participate in hard ordering (strict/weak).
    pub fn blocking_edges(&self, id: &str) -> impl Iterator<Item = &Dependency> {
        self.criteria
            .get(id)
            .into_iter()
            .flat_map(|c| c.depends_on.iter())
            .filter(|dep| dep.kind.blocks())
    }

    fn insert(&mut self, criterion: Criterion) {
        if !self.criteria.contains_key(&criterion.id) {
            self.order.push(criterion.id.clone());
        }
        self.criteria.insert(criterion.id.clone(), criterion);
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

/// The seven default criteria of the canonical CI pipeline.
///
/// build strictly depends on linter+type; start strictly depends on build.
/// Metadata reflects a realistic pipeline; callers overwrite freely.
fn default_pipeline() -> Vec<Criterion> {
    fn criterion(
        id: &str,
        description: &str,
        estimated_duration_ms: u64,
        parallelizable: bool,
        resource_requirements: &[ResourceTag],
        depends_on: Vec<Dependency>,
    ) -> Criterion {
        Criterion {
            id: id.to_string(),
            description: description.to_string(),
            estimated_duration_ms,
            parallelizable,
            resource_requirements: resource_requirements.iter().copied().collect(),
            depends_on,
        }
    }

    vec![
        criterion(
            "focused-codebase",
            "Working tree contains only changes relevant to the task",
            5_000,
            true,
            &[ResourceTag::Filesystem],
            Vec::new(),
        ),
        criterion(
            "security-validation",
            "Dependency audit and secret scan pass",
            30_000,
            true,
            &[ResourceTag::Cpu, ResourceTag::Network],
            Vec::new(),
        ),
        criterion(
            "linter-validation",
            "Linter reports no errors",
            15_000,
            true,
            &[ResourceTag::Cpu],
            Vec::new(),
        ),
        criterion(
            "type-validation",
            "Type checker reports no errors",
            20_000,
            true,
            &[ResourceTag::Cpu, ResourceTag::Memory],
            Vec::new(),
        ),
        criterion(
            "build-validation",
            "Project builds from a clean state",
            60_000,
            // Exclusive hold on the build output directory
            false,
            &[ResourceTag::Cpu, ResourceTag::Memory, ResourceTag::Filesystem],
            vec![
                Dependency::strict("linter-validation"),
                Dependency::strict("type-validation"),
            ],
        ),
        criterion(
            "start-validation",
            "Built artifact starts and answers a health probe",
            10_000,
            // Binds ports; cannot share a wave
            false,
            &[ResourceTag::Network, ResourceTag::Filesystem],
            vec![Dependency::strict("build-validation")],
        ),
        criterion(
            "test-validation",
            "Test suite passes",
            120_000,
            true,
            &[ResourceTag::Cpu, ResourceTag::Memory],
            Vec::new(),
        ),
    ]
}
