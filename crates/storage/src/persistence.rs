//! JSON file persistence for the dependency graph.

use async_trait::async_trait;
use checkflow_graph::GraphStore;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::document::ConfigDocument;

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised by saving or loading the persisted graph.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document parsed but its contents are unusable
    #[error("invalid config document: {0}")]
    Invalid(String),
}

/// Persistence abstraction for the dependency graph.
///
/// This trait allows different backends to be plugged in.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Write the full graph to `path`, returning the path written.
    async fn save(&self, store: &GraphStore, path: &Path) -> Result<PathBuf>;

    /// Read a graph from `path`.
    ///
    /// All-or-nothing: on any error no store is produced, so the caller's
    /// current store stays untouched.
    async fn load(&self, path: &Path) -> Result<GraphStore>;
}

/// File-based JSON persistence backend.
pub struct ConfigPersistence;

impl ConfigPersistence {
    /// Create the backend.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for ConfigPersistence {
    async fn save(&self, store: &GraphStore, path: &Path) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let document = ConfigDocument::from_store(store);
        let json = serde_json::to_string_pretty(&document)?;
        fs::write(path, json.as_bytes()).await?;

        info!(path = %path.display(), criteria = store.len(), "saved dependency config");
        Ok(path.to_path_buf())
    }

    async fn load(&self, path: &Path) -> Result<GraphStore> {
        let raw = fs::read_to_string(path).await?;
        let document: ConfigDocument = serde_json::from_str(&raw)?;
        let store = document
            .into_store()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        info!(path = %path.display(), criteria = store.len(), "loaded dependency config");
        Ok(store)
    }
}
