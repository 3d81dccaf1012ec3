//! Step resolution against a schema registry.

use crate::workflow::Workflow;
use docket_tool::SchemaRegistry;
use indexmap::IndexMap;
use serde::Serialize;

/// A workflow step whose tool is not in the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingStep {
    /// Position of the step in the workflow
    pub index: usize,
    /// Tool name the step refers to
    pub tool: String,
}

impl std::fmt::Display for MissingStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "step {} references unknown tool {}", self.index, self.tool)
    }
}

/// Missing steps per workflow, in document order
///
/// Every workflow appears; an empty list means it resolves fully.
pub type Resolution = IndexMap<String, Vec<MissingStep>>;

/// Steps of `workflow` that do not resolve in `registry`
#[must_use]
pub fn missing_steps(workflow: &Workflow, registry: &SchemaRegistry) -> Vec<MissingStep> {
    workflow
        .steps
        .iter()
        .enumerate()
        .filter(|(_, tool)| !registry.contains(tool))
        .map(|(index, tool)| MissingStep {
            index,
            tool: tool.clone(),
        })
        .collect()
}

/// Whether every workflow in a resolution is fully resolvable
#[must_use]
pub fn is_resolved(resolution: &Resolution) -> bool {
    resolution.values().all(Vec::is_empty)
}
