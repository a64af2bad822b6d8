//! Command dispatch for the orchestration layer.
//!
//! Every command returns a JSON envelope with a `success` flag. Malformed
//! input surfaces as `success: false` with a message; structural issues in
//! the graph are data inside a successful response, so callers choose
//! policy.

use checkflow_core::ResourceProfile;
use checkflow_graph::{GraphStatistics, GraphStore, GraphValidator};
use checkflow_planner::{AdaptivePlanner, OrderPlanner, WavePlanner};
use checkflow_storage::{ConfigPersistence, ConfigStore};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

fn failure(message: impl std::fmt::Display) -> Value {
    json!({ "success": false, "error": message.to_string() })
}

/// Owns the graph store and serves the command-style API.
///
/// The handler itself is single-writer; callers that share one across
/// threads must serialize mutations.
pub struct CommandHandler {
    store: GraphStore,
    persistence: ConfigPersistence,
    config_path: PathBuf,
}

impl CommandHandler {
    /// A handler over the seeded default pipeline.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            store: GraphStore::new(),
            persistence: ConfigPersistence::new(),
            config_path: config_path.into(),
        }
    }

    /// A handler restored from `config_path` when the file exists, seeded
    /// with the defaults otherwise.
    pub async fn open(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let store = match ConfigPersistence::new().load(&config_path).await {
            Ok(store) => store,
            Err(e) => {
                debug!(error = %e, "no usable config document, starting from defaults");
                GraphStore::new()
            }
        };
        Self {
            store,
            persistence: ConfigPersistence::new(),
            config_path,
        }
    }

    /// add-dependency: insert or overwrite a criterion from untrusted JSON.
    pub fn add_dependency(&mut self, id: &str, config: &Value) -> Value {
        match self.store.add_json(id, config) {
            Ok(()) => json!({ "success": true, "id": id }),
            Err(e) => failure(e),
        }
    }

    /// remove-dependency: drop a criterion and the edges it owns.
    pub fn remove_dependency(&mut self, id: &str) -> Value {
        if self.store.remove(id) {
            json!({ "success": true, "id": id })
        } else {
            failure(format!("unknown criterion '{id}'"))
        }
    }

    /// get-dependency: a single criterion.
    pub fn get_dependency(&self, id: &str) -> Value {
        match self.store.get(id) {
            Some(criterion) => json!({ "success": true, "criterion": criterion }),
            None => failure(format!("unknown criterion '{id}'")),
        }
    }

    /// get-dependency-graph: every criterion in insertion order.
    pub fn get_dependency_graph(&self) -> Value {
        json!({
            "success": true,
            "criteria": self.store.criteria(),
            "totalCriteria": self.store.len(),
            "totalEdges": self.store.edge_count(),
        })
    }

    /// validate-dependency-graph: cycles and dangling references as data.
    pub fn validate_dependency_graph(&self) -> Value {
        let validation = GraphValidator::new().validate(&self.store);
        json!({
            "success": true,
            "valid": validation.valid,
            "issues": validation.issues,
        })
    }

    /// generate-validation-execution-plan: the linear order.
    pub fn generate_execution_plan(&self) -> Value {
        let steps = OrderPlanner::new().execution_order(&self.store);
        json!({ "success": true, "steps": steps })
    }

    /// generate-parallel-execution-plan: the wave schedule.
    ///
    /// Width defaults to the profile's CPUs (a live probe when no profile
    /// is supplied).
    pub fn generate_parallel_plan(
        &self,
        profile: Option<&Value>,
        max_concurrency: Option<usize>,
    ) -> Value {
        let profile = match profile {
            Some(raw) => match serde_json::from_value::<ResourceProfile>(raw.clone()) {
                Ok(profile) => profile,
                Err(e) => return failure(format!("malformed resource profile: {e}")),
            },
            None => ResourceProfile::detect(),
        };
        let width = max_concurrency.unwrap_or_else(|| profile.available_cpus.max(1));
        let plan = WavePlanner::new().parallel_plan(&self.store, width);
        json!({ "success": true, "plan": plan })
    }

    /// generate-adaptive-execution-plan: the tuned wave schedule.
    pub fn generate_adaptive_plan(&self, system_info: Option<&Value>) -> Value {
        let profile = match system_info {
            Some(raw) => match serde_json::from_value::<ResourceProfile>(raw.clone()) {
                Ok(profile) => profile,
                Err(e) => return failure(format!("malformed system info: {e}")),
            },
            None => ResourceProfile::detect(),
        };
        let plan = AdaptivePlanner::new().adaptive_plan(&self.store, &profile);
        json!({
            "success": true,
            "plan": plan.plan,
            "adaptiveOptimizations": plan.adaptive_optimizations,
        })
    }

    /// save-dependency-config: write the graph, defaulting to the handler's
    /// config path.
    pub async fn save_config(&self, path: Option<&Path>) -> Value {
        let path = path.unwrap_or(&self.config_path);
        match self.persistence.save(&self.store, path).await {
            Ok(written) => json!({ "success": true, "configPath": written }),
            Err(e) => failure(e),
        }
    }

    /// load-dependency-config: replace the store from a document.
    ///
    /// All-or-nothing; on error the current store stays as it was.
    pub async fn load_config(&mut self, path: &Path) -> Value {
        match self.persistence.load(path).await {
            Ok(store) => {
                let loaded = store.len();
                self.store = store;
                json!({ "success": true, "loadedCriteria": loaded })
            }
            Err(e) => failure(e),
        }
    }

    /// get-dependency-visualization: read-only statistics.
    pub fn get_visualization(&self) -> Value {
        json!({
            "success": true,
            "statistics": GraphStatistics::collect(&self.store),
        })
    }

    /// Persist the current store to the handler's config path.
    pub async fn persist(&self) -> Value {
        self.save_config(None).await
    }

    /// The handler's config path.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> CommandHandler {
        CommandHandler::new("unused.json")
    }

    #[test]
    fn test_add_and_get_round_trip() {
        let mut handler = handler();
        let response = handler.add_dependency(
            "custom-check",
            &json!({"description": "gate", "estimatedDurationMs": 100}),
        );
        assert_eq!(response["success"], true);

        let fetched = handler.get_dependency("custom-check");
        assert_eq!(fetched["success"], true);
        assert_eq!(fetched["criterion"]["estimatedDurationMs"], 100);
    }

    #[test]
    fn test_add_blank_id_fails() {
        let mut handler = handler();
        let response = handler.add_dependency("  ", &json!({}));
        assert_eq!(response["success"], false);
        assert!(response["error"].as_str().unwrap().contains("blank"));
    }

    #[test]
    fn test_add_malformed_config_fails() {
        let mut handler = handler();
        let response = handler.add_dependency("x", &json!({"bogus": 1}));
        assert_eq!(response["success"], false);
    }

    #[test]
    fn test_remove_unknown_fails() {
        let mut handler = handler();
        assert_eq!(handler.remove_dependency("nope")["success"], false);
    }

    #[test]
    fn test_graph_lists_defaults() {
        let response = handler().get_dependency_graph();
        assert_eq!(response["success"], true);
        assert_eq!(response["totalCriteria"], 7);
        assert_eq!(response["criteria"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_validate_reports_issues_as_data() {
        let mut handler = handler();
        handler
            .add_dependency("a", &json!({"dependsOn": [{"criterion": "ghost"}]}));

        let response = handler.validate_dependency_graph();
        assert_eq!(response["success"], true);
        assert_eq!(response["valid"], false);
        assert_eq!(response["issues"][0]["type"], "missing_dependency");
        assert_eq!(response["issues"][0]["missingDependency"], "ghost");
    }

    #[test]
    fn test_execution_plan_covers_all_criteria() {
        let response = handler().generate_execution_plan();
        assert_eq!(response["success"], true);
        assert_eq!(response["steps"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_parallel_plan_with_explicit_width() {
        let response = handler().generate_parallel_plan(None, Some(2));
        assert_eq!(response["success"], true);
        for wave in response["plan"]["waves"].as_array().unwrap() {
            assert!(wave["criteria"].as_array().unwrap().len() <= 2);
        }
    }

    #[test]
    fn test_parallel_plan_width_from_profile() {
        let profile = json!({
            "availableCpus": 1,
            "availableMemoryBytes": 8_000_000_000u64,
            "networkLatencyMs": 10,
            "diskIoLoad": 0.1
        });
        let response = handler().generate_parallel_plan(Some(&profile), None);
        assert_eq!(response["success"], true);
        for wave in response["plan"]["waves"].as_array().unwrap() {
            assert_eq!(wave["criteria"].as_array().unwrap().len(), 1);
        }
    }

    #[test]
    fn test_parallel_plan_rejects_malformed_profile() {
        let response =
            handler().generate_parallel_plan(Some(&json!({"availableCpus": "many"})), None);
        assert_eq!(response["success"], false);
    }

    #[test]
    fn test_adaptive_plan_envelope() {
        let system_info = json!({
            "availableCpus": 8,
            "availableMemoryBytes": 32_000_000_000u64,
            "networkLatencyMs": 10,
            "diskIoLoad": 0.1
        });
        let response = handler().generate_adaptive_plan(Some(&system_info));
        assert_eq!(response["success"], true);
        let recommended = response["adaptiveOptimizations"]["systemAware"]
            ["recommendedConcurrency"]
            .as_u64()
            .unwrap();
        assert!(recommended >= 8);
        assert!(response["plan"]["waves"].as_array().is_some());
    }

    #[test]
    fn test_adaptive_plan_without_system_info_probes_host() {
        let response = handler().generate_adaptive_plan(None);
        assert_eq!(response["success"], true);
    }

    #[test]
    fn test_visualization_statistics() {
        let response = handler().get_visualization();
        assert_eq!(response["success"], true);
        assert_eq!(response["statistics"]["totalCriteria"], 7);
        assert_eq!(response["statistics"]["totalEdges"], 3);
    }

    #[tokio::test]
    async fn test_save_load_round_trip_via_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deps.json");

        let mut handler = CommandHandler::new(&path);
        handler.add_dependency(
            "extra",
            &json!({"dependsOn": [{"criterion": "build-validation", "type": "weak"}]}),
        );

        let saved = handler.save_config(None).await;
        assert_eq!(saved["success"], true);
        assert_eq!(saved["configPath"], path.to_string_lossy().as_ref());

        let mut other = CommandHandler::new(dir.path().join("other.json"));
        let loaded = other.load_config(&path).await;
        assert_eq!(loaded["success"], true);
        assert_eq!(loaded["loadedCriteria"], 8);
        assert_eq!(other.get_dependency("extra")["success"], true);
    }

    #[tokio::test]
    async fn test_failed_load_keeps_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"not json").await.unwrap();

        let mut handler = CommandHandler::new(dir.path().join("deps.json"));
        let response = handler.load_config(&path).await;
        assert_eq!(response["success"], false);
        // Prior store still answers
        assert_eq!(handler.get_dependency_graph()["totalCriteria"], 7);
    }

    #[tokio::test]
    async fn test_open_missing_file_seeds_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let handler = CommandHandler::open(dir.path().join("absent.json")).await;
        assert_eq!(handler.get_dependency_graph()["totalCriteria"], 7);
    }

    #[tokio::test]
    async fn test_open_existing_file_restores_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deps.json");

        let mut first = CommandHandler::new(&path);
        first.remove_dependency("test-validation");
        first.persist().await;

        let second = CommandHandler::open(&path).await;
        assert_eq!(second.get_dependency_graph()["totalCriteria"], 6);
    }
}
