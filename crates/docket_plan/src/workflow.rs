//! Workflow definitions.
//!
//! A workflow is a named, ordered list of tool names. Steps are plain
//! strings at load time; they are resolved against a registry later.

use docket_core::{CoreError, CoreResult, FieldPath, ValueKind};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// How to treat the same step appearing twice in a row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjacentDuplicates {
    /// Reject the workflow at load
    #[default]
    Reject,
    /// Accept repeated steps as written
    Allow,
}

/// Options for loading workflow documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadPolicy {
    /// Treatment of adjacent duplicate steps
    pub adjacent_duplicates: AdjacentDuplicates,
}

impl LoadPolicy {
    /// Create the default policy
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set treatment of adjacent duplicate steps
    #[must_use]
    pub fn with_adjacent_duplicates(mut self, policy: AdjacentDuplicates) -> Self {
        self.adjacent_duplicates = policy;
        self
    }
}

/// How a workflow was written in its document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowForm {
    /// `{"description": ..., "steps": [...]}`
    #[default]
    Object,
    /// A bare list of step names
    StepList,
}

/// A named multi-step workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workflow {
    /// Workflow name (the key it is stored under)
    pub name: String,
    /// What the workflow accomplishes, if the document says
    pub description: Option<String>,
    /// Tool names, in execution order
    pub steps: Vec<String>,
    /// Fields this crate does not interpret, kept for round-tripping
    pub extra: IndexMap<String, Value>,
    /// Document form, reproduced on serialization
    pub form: WorkflowForm,
}

impl Workflow {
    /// Parse a workflow from its document form
    ///
    /// Accepts an object with a `steps` list or a bare list of step names.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowParse` if the entry is neither, `steps` is
    /// missing, empty or holds a non-string or blank entry, or a step
    /// repeats its predecessor while the policy rejects that
    pub fn parse(
        name: &str,
        value: &Value,
        path: &FieldPath,
        policy: LoadPolicy,
    ) -> CoreResult<Self> {
        let object = match value {
            Value::Array(entries) => {
                return Ok(Self {
                    name: name.to_string(),
                    description: None,
                    steps: parse_steps(entries, path, policy)?,
                    extra: IndexMap::new(),
                    form: WorkflowForm::StepList,
                });
            }
            Value::Object(object) => object,
            other => return Err(wrong_kind(path, "object or array", other)),
        };

        let description = match object.get("description") {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => return Err(wrong_kind(&path.key("description"), "string", other)),
        };

        let steps_path = path.key("steps");
        let steps = match object.get("steps") {
            Some(Value::Array(entries)) => parse_steps(entries, &steps_path, policy)?,
            Some(other) => return Err(wrong_kind(&steps_path, "array", other)),
            None => return Err(parse_error(&steps_path, "missing required field")),
        };

        Ok(Self {
            name: name.to_string(),
            description,
            steps,
            extra: object
                .iter()
                .filter(|(k, _)| !matches!(k.as_str(), "description" | "steps"))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            form: WorkflowForm::Object,
        })
    }

    /// Description, or `""` when the document has none
    #[must_use]
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false for a loaded workflow
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Serialize for Workflow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bare = self.description.is_none() && self.extra.is_empty();
        if self.form == WorkflowForm::StepList && bare {
            return self.steps.serialize(serializer);
        }
        let mut map = serializer.serialize_map(None)?;
        if let Some(description) = &self.description {
            map.serialize_entry("description", description)?;
        }
        map.serialize_entry("steps", &self.steps)?;
        for (key, value) in &self.extra {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn parse_steps(entries: &[Value], path: &FieldPath, policy: LoadPolicy) -> CoreResult<Vec<String>> {
    if entries.is_empty() {
        return Err(parse_error(path, "workflow must have at least one step"));
    }

    let mut steps: Vec<String> = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let step_path = path.index(i);
        let step = match entry {
            Value::String(s) if !s.trim().is_empty() => s,
            Value::String(_) => return Err(parse_error(&step_path, "step name is blank")),
            other => return Err(wrong_kind(&step_path, "string", other)),
        };
        if policy.adjacent_duplicates == AdjacentDuplicates::Reject
            && steps.last().is_some_and(|prev| prev == step)
        {
            return Err(parse_error(
                &step_path,
                format!("step '{}' repeats the previous step", step),
            ));
        }
        steps.push(step.clone());
    }
    Ok(steps)
}

pub(crate) fn parse_error(path: &FieldPath, reason: impl Into<String>) -> CoreError {
    CoreError::WorkflowParse {
        path: path.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn wrong_kind(path: &FieldPath, expected: &str, found: &Value) -> CoreError {
    parse_error(
        path,
        format!("expected {}, found {}", expected, ValueKind::of(found)),
    )
}
