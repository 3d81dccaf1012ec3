//! Workflow graph: every named workflow from a document.

use crate::validate::{Resolution, missing_steps};
use crate::workflow::{LoadPolicy, Workflow};
use docket_core::{CoreError, CoreResult, FieldPath, parse_document};
use docket_tool::{SchemaRegistry, ToolSchema};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// All workflows loaded from a document
///
/// Immutable once loaded. Step names are not checked against any registry
/// until [`WorkflowGraph::validate`] or [`WorkflowGraph::activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowGraph {
    workflows: IndexMap<String, Workflow>,
}

impl WorkflowGraph {
    /// Create a new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load workflows with the default policy
    ///
    /// # Errors
    ///
    /// Returns `WorkflowParse` if the document is not an object or any
    /// workflow in it is malformed
    pub fn load(document: &Value) -> CoreResult<Self> {
        Self::load_with(document, LoadPolicy::default())
    }

    /// Load workflows with an explicit policy
    ///
    /// # Errors
    ///
    /// Returns `WorkflowParse` if the document is not an object or any
    /// workflow in it is malformed
    pub fn load_with(document: &Value, policy: LoadPolicy) -> CoreResult<Self> {
        let root = FieldPath::root();
        let entries = document
            .as_object()
            .ok_or_else(|| crate::workflow::wrong_kind(&root, "object", document))?;

        let mut workflows = IndexMap::with_capacity(entries.len());
        for (name, value) in entries {
            let workflow = Workflow::parse(name, value, &root.key(name.as_str()), policy)?;
            workflows.insert(name.clone(), workflow);
        }

        tracing::debug!(workflows = workflows.len(), "loaded workflows");
        Ok(Self { workflows })
    }

    /// Parse document text and load it with the default policy
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` for malformed JSON, otherwise as [`Self::load`]
    pub fn from_json(text: &str) -> CoreResult<Self> {
        Self::load(&parse_document(text)?)
    }

    /// Check every workflow's steps against a registry
    ///
    /// Every workflow is reported, in document order; an empty list means
    /// the workflow resolves fully.
    #[must_use]
    pub fn validate(&self, registry: &SchemaRegistry) -> Resolution {
        self.workflows
            .iter()
            .map(|(name, workflow)| {
                let missing = missing_steps(workflow, registry);
                if !missing.is_empty() {
                    tracing::warn!(
                        workflow = %name,
                        missing = missing.len(),
                        "workflow references unregistered tools"
                    );
                }
                (name.clone(), missing)
            })
            .collect()
    }

    /// Ordered step names of a workflow
    ///
    /// # Errors
    ///
    /// Returns `UnknownWorkflow` if no workflow is named `name`
    pub fn steps(&self, name: &str) -> CoreResult<&[String]> {
        self.get(name).map(|w| w.steps.as_slice())
    }

    /// Get a workflow by name
    ///
    /// # Errors
    ///
    /// Returns `UnknownWorkflow` if no workflow is named `name`
    pub fn get(&self, name: &str) -> CoreResult<&Workflow> {
        self.workflows
            .get(name)
            .ok_or_else(|| CoreError::UnknownWorkflow {
                name: name.to_string(),
            })
    }

    /// Resolve a workflow's steps to their schemas
    ///
    /// # Errors
    ///
    /// Returns `UnknownWorkflow` if no workflow is named `name`, or
    /// `UnresolvedWorkflow` listing every step tool absent from `registry`
    pub fn activate<'a>(
        &'a self,
        name: &str,
        registry: &'a SchemaRegistry,
    ) -> CoreResult<ActiveWorkflow<'a>> {
        let workflow = self.get(name)?;
        let missing = missing_steps(workflow, registry);
        if !missing.is_empty() {
            return Err(CoreError::UnresolvedWorkflow {
                name: name.to_string(),
                missing: missing.into_iter().map(|m| m.tool).collect(),
            });
        }

        let steps = workflow
            .steps
            .iter()
            .map(|tool| registry.get(tool))
            .collect::<CoreResult<Vec<_>>>()?;

        tracing::debug!(workflow = name, steps = steps.len(), "activated workflow");
        Ok(ActiveWorkflow { workflow, steps })
    }

    /// Workflow names, in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.workflows.keys().map(String::as_str)
    }

    /// Workflows, in document order
    pub fn iter(&self) -> impl Iterator<Item = &Workflow> {
        self.workflows.values()
    }

    /// Number of workflows
    #[must_use]
    pub fn len(&self) -> usize {
        self.workflows.len()
    }

    /// Check if graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workflows.is_empty()
    }

    /// Serialize back to the document form accepted by [`Self::load`]
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` if serialization fails
    pub fn to_document(&self) -> CoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl Serialize for WorkflowGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(&self.workflows)
    }
}

/// A workflow whose every step resolved to a registered schema
#[derive(Debug, Clone)]
pub struct ActiveWorkflow<'a> {
    workflow: &'a Workflow,
    steps: Vec<&'a ToolSchema>,
}

impl<'a> ActiveWorkflow<'a> {
    /// The underlying workflow
    #[must_use]
    pub fn workflow(&self) -> &'a Workflow {
        self.workflow
    }

    /// Schemas for each step, in execution order
    #[must_use]
    pub fn schemas(&self) -> &[&'a ToolSchema] {
        &self.steps
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for an activated workflow
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
