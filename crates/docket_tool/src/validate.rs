//! Call validation against a tool schema.

use crate::schema::{ParamType, ParameterSpec, ToolSchema};
use docket_core::{FieldPath, ValueKind};
use serde::Serialize;
use serde_json::Value;

/// A problem found in a candidate tool call
///
/// Violations are ordinary results, not errors: a call that breaks its
/// schema is reported, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallViolation {
    /// The argument payload is not a JSON object
    ArgumentsNotObject { found: ValueKind },
    /// Argument not declared by the schema
    UnknownArgument { name: String },
    /// Required parameter absent from the call
    MissingRequired { name: String },
    /// Value has the wrong runtime type
    TypeMismatch {
        path: String,
        expected: ParamType,
        found: ValueKind,
    },
    /// Value is not one of the declared enum literals
    NotInEnum { path: String, value: Value },
}

impl CallViolation {
    /// Argument path the violation refers to
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ArgumentsNotObject { .. } => None,
            Self::UnknownArgument { name } | Self::MissingRequired { name } => Some(name),
            Self::TypeMismatch { path, .. } | Self::NotInEnum { path, .. } => Some(path),
        }
    }
}

impl std::fmt::Display for CallViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ArgumentsNotObject { found } => {
                write!(f, "Arguments must be an object, found {}", found)
            }
            Self::UnknownArgument { name } => write!(f, "Unknown argument: {}", name),
            Self::MissingRequired { name } => write!(f, "Missing required argument: {}", name),
            Self::TypeMismatch {
                path,
                expected,
                found,
            } => write!(f, "Type mismatch at {}: expected {}, found {}", path, expected, found),
            Self::NotInEnum { path, value } => {
                write!(f, "Value at {} is not an allowed enum value: {}", path, value)
            }
        }
    }
}

/// Validator for candidate tool calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallValidator {
    /// Accept arguments the schema does not declare
    allow_unknown: bool,
}

impl CallValidator {
    /// Create a validator that rejects undeclared arguments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether undeclared arguments are accepted
    #[must_use]
    pub fn with_allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    /// Validate call arguments against a schema
    ///
    /// Returns every violation found; an empty list means the call is valid.
    #[must_use]
    pub fn validate(&self, schema: &ToolSchema, arguments: &Value) -> Vec<CallViolation> {
        let Some(arguments) = arguments.as_object() else {
            return vec![CallViolation::ArgumentsNotObject {
                found: ValueKind::of(arguments),
            }];
        };

        let mut violations = Vec::new();

        if !self.allow_unknown {
            for name in arguments.keys() {
                if !schema.parameters.contains_key(name) {
                    violations.push(CallViolation::UnknownArgument { name: name.clone() });
                }
            }
        }

        for name in schema.required_names() {
            if !arguments.contains_key(name) {
                violations.push(CallViolation::MissingRequired {
                    name: name.to_string(),
                });
            }
        }

        let root = FieldPath::root();
        for (name, value) in arguments {
            if let Some(spec) = schema.parameters.get(name) {
                check_value(spec, value, &root.key(name.as_str()), &mut violations);
            }
        }

        violations
    }
}

fn check_value(
    spec: &ParameterSpec,
    value: &Value,
    path: &FieldPath,
    violations: &mut Vec<CallViolation>,
) {
    if !spec.param_type.accepts(value) {
        violations.push(CallViolation::TypeMismatch {
            path: path.to_dotted(),
            expected: spec.param_type,
            found: ValueKind::of(value),
        });
        return;
    }

    if !spec.permits(value) {
        violations.push(CallViolation::NotInEnum {
            path: path.to_dotted(),
            value: value.clone(),
        });
    }

    if let (Some(items), Value::Array(elements)) = (&spec.items, value) {
        for (i, element) in elements.iter().enumerate() {
            check_value(items, element, &path.index(i), violations);
        }
    }
}
