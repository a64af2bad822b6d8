//! Structural validation: cycle and missing-reference detection.

use checkflow_core::{GraphValidation, ValidationIssue};
use std::collections::HashSet;

use crate::store::GraphStore;

/// Detects cycles and dangling references over a [`GraphStore`].
///
/// Results are recomputed fresh on every call; nothing is cached.
pub struct GraphValidator;

impl GraphValidator {
    /// Create a new validator.
    pub fn new() -> Self {
        Self
    }

    /// Inspect the store and report every structural issue.
    ///
    /// Issues are data for the caller to set policy on, not errors: the
    /// graph stays usable and planning degrades instead of failing.
    pub fn validate(&self, store: &GraphStore) -> GraphValidation {
        let mut issues = Vec::new();
        self.find_cycles(store, &mut issues);
        self.find_missing(store, &mut issues);
        GraphValidation::from_issues(issues)
    }

    /// DFS over strict/weak edges with an explicit recursion stack.
    ///
    /// Optional edges never form hard constraints and are excluded.
    /// Revisiting a stacked node yields a cycle issue listing the cycle's
    /// members in traversal order; each cycle is reported once.
    fn find_cycles(&self, store: &GraphStore, issues: &mut Vec<ValidationIssue>) {
        let mut done: HashSet<&str> = HashSet::new();

        for root in store.ids() {
            if done.contains(root.as_str()) {
                continue;
            }
            let mut stack: Vec<&str> = Vec::new();
            self.visit(store, root, &mut stack, &mut done, issues);
        }
    }

    fn visit<'a>(
        &self,
        store: &'a GraphStore,
        id: &'a str,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if let Some(pos) = stack.iter().position(|entry| *entry == id) {
            issues.push(ValidationIssue::Cycle {
                participants: stack[pos..].iter().map(|s| s.to_string()).collect(),
            });
            return;
        }
        if done.contains(id) {
            return;
        }

        stack.push(id);
        for dep in store.blocking_edges(id) {
            if store.contains(&dep.criterion) {
                self.visit(store, &dep.criterion, stack, done, issues);
            }
        }
        stack.pop();
        done.insert(id);
    }

    /// Every edge (of any kind) whose target is absent from the store.
    fn find_missing(&self, store: &GraphStore, issues: &mut Vec<ValidationIssue>) {
        for criterion in store.criteria() {
            for dep in &criterion.depends_on {
                if !store.contains(&dep.criterion) {
                    issues.push(ValidationIssue::MissingDependency {
                        criterion: criterion.id.clone(),
                        missing_dependency: dep.criterion.clone(),
                    });
                }
            }
        }
    }
}

impl Default for GraphValidator {
    fn default() -> Self {
        Self::new()
    }
}
