//! Dependency graph layer - criterion store, structural validation, and
//! read-only statistics.

#![warn(missing_docs)]

pub mod stats;
pub mod store;
pub mod validator;

pub use stats::GraphStatistics;
pub use store::{GraphError, GraphStore};
pub use validator::GraphValidator;
