//! Persistence for the dependency graph.
//!
//! This crate provides a trait-based persistence interface with a JSON
//! file reference implementation. Loads are all-or-nothing: a corrupt
//! document never partially applies.

#![warn(missing_docs)]

pub mod document;
pub mod persistence;

pub use document::{ConfigDocument, CriterionMetadata, DependencyEntry};
pub use persistence::{ConfigError, ConfigPersistence, ConfigStore, Result};
