//! Structural findings reported by graph validation.
//!
//! Issues are data, not errors: a cyclic or dangling graph remains usable
//! and planning degrades instead of failing.

use serde::{Deserialize, Serialize};

/// A structural problem found in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// A dependency cycle over strict/weak edges.
    Cycle {
        /// Members of the cycle in traversal order
        participants: Vec<String>,
    },

    /// An edge referencing a criterion that is not in the store.
    #[serde(rename_all = "camelCase")]
    MissingDependency {
        /// The criterion owning the dangling edge
        criterion: String,
        /// The referenced id that does not exist
        missing_dependency: String,
    },
}

impl ValidationIssue {
    /// Whether this issue is a cycle.
    pub fn is_cycle(&self) -> bool {
        matches!(self, ValidationIssue::Cycle { .. })
    }

    /// Whether this issue is a dangling reference.
    pub fn is_missing_dependency(&self) -> bool {
        matches!(self, ValidationIssue::MissingDependency { .. })
    }
}

/// Result of validating the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphValidation {
    /// True when no issues of any kind were found
    pub valid: bool,

    /// Every cycle and dangling reference found
    pub issues: Vec<ValidationIssue>,
}

impl GraphValidation {
    /// A validation result from a list of issues.
    pub fn from_issues(issues: Vec<ValidationIssue>) -> Self {
        Self { valid: issues.is_empty(), issues }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_issue_wire_format() {
        let issue = ValidationIssue::Cycle {
            participants: vec!["a".to_string(), "b".to_string()],
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "cycle");
        assert_eq!(json["participants"][1], "b");
    }

    #[test]
    fn test_missing_dependency_wire_format() {
        let issue = ValidationIssue::MissingDependency {
            criterion: "a".to_string(),
            missing_dependency: "ghost".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["type"], "missing_dependency");
        assert_eq!(json["missingDependency"], "ghost");
    }

    #[test]
    fn test_from_issues_sets_valid() {
        assert!(GraphValidation::from_issues(Vec::new()).valid);

        let invalid = GraphValidation::from_issues(vec![ValidationIssue::Cycle {
            participants: vec!["a".to_string()],
        }]);
        assert!(!invalid.valid);
        assert!(invalid.issues[0].is_cycle());
        assert!(!invalid.issues[0].is_missing_dependency());
    }
}
