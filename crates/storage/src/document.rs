//! The persisted configuration document.
//!
//! Top-level `dependencies` object keyed by criterion id, each entry holding
//! `metadata` and `dependsOn`. Parsing the whole document into these structs
//! before touching any store is what makes load all-or-nothing.

use checkflow_core::{CriterionSpec, Dependency, ResourceTag, Time};
use checkflow_graph::GraphStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Current format version written by save.
pub const FORMAT_VERSION: u32 = 1;

/// Per-criterion metadata as persisted.
///
/// Fields are required; a document missing any of them is structurally
/// invalid and rejected as a whole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionMetadata {
    /// Human-readable description
    pub description: String,

    /// Estimated wall-clock duration in milliseconds
    pub estimated_duration: u64,

    /// Whether the criterion may share a wave with others
    pub parallelizable: bool,

    /// Resource classes the criterion occupies while running
    pub resource_requirements: BTreeSet<ResourceTag>,
}

/// One persisted criterion: metadata plus outgoing edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEntry {
    /// Criterion metadata
    pub metadata: CriterionMetadata,

    /// Edges to prerequisites
    #[serde(default)]
    pub depends_on: Vec<Dependency>,
}

/// The full persisted graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    /// Format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// When the document was written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<Time>,

    /// Criteria keyed by id
    pub dependencies: BTreeMap<String, DependencyEntry>,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

impl ConfigDocument {
    /// Snapshot a store into a document.
    pub fn from_store(store: &GraphStore) -> Self {
        let dependencies = store
            .criteria()
            .into_iter()
            .map(|criterion| {
                let entry = DependencyEntry {
                    metadata: CriterionMetadata {
                        description: criterion.description.clone(),
                        estimated_duration: criterion.estimated_duration_ms,
                        parallelizable: criterion.parallelizable,
                        resource_requirements: criterion.resource_requirements.clone(),
                    },
                    depends_on: criterion.depends_on.clone(),
                };
                (criterion.id.clone(), entry)
            })
            .collect();

        Self {
            version: FORMAT_VERSION,
            saved_at: Some(chrono::Utc::now()),
            dependencies,
        }
    }

    /// Build a fresh store from the document.
    ///
    /// Insertion order normalizes to the document's key order.
    pub fn into_store(self) -> std::result::Result<GraphStore, checkflow_graph::GraphError> {
        let mut store = GraphStore::empty();
        for (id, entry) in self.dependencies {
            let spec = CriterionSpec {
                description: entry.metadata.description,
                estimated_duration_ms: entry.metadata.estimated_duration,
                parallelizable: entry.metadata.parallelizable,
                resource_requirements: entry.metadata.resource_requirements,
                depends_on: entry.depends_on,
            };
            store.add(&id, spec)?;
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_round_trip_preserves_graph() {
        let store = GraphStore::new();
        let document = ConfigDocument::from_store(&store);
        let restored = document.into_store().unwrap();

        assert_eq!(restored.len(), store.len());
        assert_eq!(restored.edge_count(), store.edge_count());
        for criterion in store.criteria() {
            assert_eq!(restored.get(&criterion.id), Some(criterion));
        }
    }

    #[test]
    fn test_document_wire_format() {
        let store = GraphStore::new();
        let json = serde_json::to_value(ConfigDocument::from_store(&store)).unwrap();

        let build = &json["dependencies"]["build-validation"];
        assert_eq!(build["metadata"]["estimatedDuration"], 60000);
        assert_eq!(build["metadata"]["parallelizable"], false);
        assert_eq!(build["dependsOn"][0]["criterion"], "linter-validation");
        assert_eq!(build["dependsOn"][0]["type"], "strict");
        assert_eq!(json["version"], FORMAT_VERSION);
    }

    #[test]
    fn test_missing_metadata_field_rejected() {
        let raw = json!({
            "dependencies": {
                "a": {
                    "metadata": {"description": "no duration"},
                    "dependsOn": []
                }
            }
        });
        assert!(serde_json::from_value::<ConfigDocument>(raw).is_err());
    }

    #[test]
    fn test_missing_dependencies_object_rejected() {
        let raw = json!({"version": 1});
        assert!(serde_json::from_value::<ConfigDocument>(raw).is_err());
    }

    #[test]
    fn test_depends_on_defaults_to_empty() {
        let raw = json!({
            "dependencies": {
                "a": {
                    "metadata": {
                        "description": "",
                        "estimatedDuration": 0,
                        "parallelizable": true,
                        "resourceRequirements": []
                    }
                }
            }
        });
        let document: ConfigDocument = serde_json::from_value(raw).unwrap();
        let store = document.into_store().unwrap();
        assert!(store.get("a").unwrap().depends_on.is_empty());
    }

    #[test]
    fn test_dangling_edges_survive_round_trip() {
        let mut store = GraphStore::empty();
        store
            .add_json("a", &json!({"dependsOn": [{"criterion": "ghost"}]}))
            .unwrap();

        let restored = ConfigDocument::from_store(&store).into_store().unwrap();
        assert_eq!(restored.get("a").unwrap().depends_on[0].criterion, "ghost");
    }
}
