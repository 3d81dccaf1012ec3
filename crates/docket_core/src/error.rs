//! Core error types for docket.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;

/// Core error type
///
/// Structural problems in a source document are raised as errors. Problems
/// found while validating a call or a workflow are returned as data by the
/// component that found them and never appear here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Malformed tool schema document
    #[error("Schema parse error at {path}: {reason}")]
    SchemaParse {
        /// JSON path of the offending field
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Tool name not present in the registry
    #[error("Unknown tool: {name}")]
    UnknownTool {
        /// Requested tool name
        name: String,
    },

    /// Malformed workflow document
    #[error("Workflow parse error at {path}: {reason}")]
    WorkflowParse {
        /// JSON path of the offending field
        path: String,
        /// What is wrong with it
        reason: String,
    },

    /// Workflow name not present in the graph
    #[error("Unknown workflow: {name}")]
    UnknownWorkflow {
        /// Requested workflow name
        name: String,
    },

    /// Workflow activated while some of its steps name unregistered tools
    #[error("Workflow {name} has unresolved steps: {}", .missing.join(", "))]
    UnresolvedWorkflow {
        /// Workflow name
        name: String,
        /// Tool names that did not resolve, in step order
        missing: Vec<String>,
    },

    /// One or more training-config constraints failed
    #[error("Config validation failed: {}", join_violations(.violations))]
    ConfigValidation {
        /// Every violated constraint, in document order
        violations: Vec<ConfigViolation>,
    },

    /// Config key absent and no default registered
    #[error("Missing config key: {key}")]
    MissingKey {
        /// Dotted key path
        key: String,
    },

    /// Document text is not JSON, or a requested section is absent
    #[error("Invalid document: {reason}")]
    InvalidDocument {
        /// Parser or lookup message
        reason: String,
    },
}

impl CoreError {
    /// Build a `ConfigValidation` error carrying a single violation
    #[must_use]
    pub fn config_violation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigValidation {
            violations: vec![ConfigViolation::new(key, reason)],
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDocument {
            reason: err.to_string(),
        }
    }
}

/// A single violated training-config constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigViolation {
    /// Dotted key path
    pub key: String,
    /// Why the value was rejected
    pub reason: String,
}

impl ConfigViolation {
    /// Create a new violation
    #[must_use]
    pub fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ConfigViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.reason)
    }
}

fn join_violations(violations: &[ConfigViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
