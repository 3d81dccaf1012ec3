//! Tool schemas as declared in the schema document.

use docket_core::{CoreError, CoreResult, FieldPath, ValueKind};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declared type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// JSON string
    String,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// JSON number
    Number,
    /// JSON boolean
    Boolean,
}

impl ParamType {
    /// Parse a type name as written in the document
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            _ => None,
        }
    }

    /// Type name as written in the document
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }

    /// Check whether a runtime value has this type
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        matches!(
            (self, ValueKind::of(value)),
            (Self::String, ValueKind::String)
                | (Self::Array, ValueKind::Array)
                | (Self::Object, ValueKind::Object)
                | (Self::Number, ValueKind::Number)
                | (Self::Boolean, ValueKind::Boolean)
        )
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared shape of one tool parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Declared type
    #[serde(rename = "type")]
    pub param_type: ParamType,
    /// Allowed literal values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,
    /// Element spec for array parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<ParameterSpec>>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ParameterSpec {
    /// Create a spec of the given type with nothing else declared
    #[must_use]
    pub fn new(param_type: ParamType) -> Self {
        Self {
            param_type,
            allowed: None,
            items: None,
            description: None,
            extra: IndexMap::new(),
        }
    }

    /// Restrict to a set of literal values
    #[must_use]
    pub fn with_enum(mut self, allowed: Vec<Value>) -> Self {
        self.allowed = Some(allowed);
        self
    }

    /// Set the element spec
    #[must_use]
    pub fn with_items(mut self, items: ParameterSpec) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parse a parameter spec from its document form
    ///
    /// # Errors
    ///
    /// Returns `SchemaParse` if the type is missing or unknown, an enum is
    /// empty or holds a literal of the wrong type, or `items` appears on a
    /// non-array parameter
    pub fn parse(value: &Value, path: &FieldPath) -> CoreResult<Self> {
        let object = expect_object(value, path)?;

        let type_path = path.key("type");
        let type_name = match object.get("type") {
            Some(Value::String(s)) => s,
            Some(other) => return Err(wrong_kind(&type_path, "string", other)),
            None => return Err(schema_error(&type_path, "missing required field")),
        };
        let param_type = ParamType::parse(type_name).ok_or_else(|| {
            schema_error(
                &type_path,
                format!(
                    "unknown type '{}' (expected string, array, object, number or boolean)",
                    type_name
                ),
            )
        })?;

        let allowed = match object.get("enum") {
            None => None,
            Some(Value::Array(values)) => {
                let enum_path = path.key("enum");
                if values.is_empty() {
                    return Err(schema_error(&enum_path, "enum must list at least one value"));
                }
                for (i, literal) in values.iter().enumerate() {
                    if !param_type.accepts(literal) {
                        return Err(schema_error(
                            &enum_path.index(i),
                            format!(
                                "enum value of kind {} does not match declared type {}",
                                ValueKind::of(literal),
                                param_type
                            ),
                        ));
                    }
                }
                Some(values.clone())
            }
            Some(other) => return Err(wrong_kind(&path.key("enum"), "array", other)),
        };

        let items = match object.get("items") {
            None => None,
            Some(_) if param_type != ParamType::Array => {
                return Err(schema_error(
                    &path.key("items"),
                    "items is only allowed on array parameters",
                ));
            }
            Some(items) => Some(Box::new(Self::parse(items, &path.key("items"))?)),
        };

        let description = optional_string(object, "description", path)?;

        Ok(Self {
            param_type,
            allowed,
            items,
            description,
            extra: collect_extra(object, &["type", "enum", "items", "description"]),
        })
    }

    /// Whether a literal is permitted by the enum, if one is declared
    #[must_use]
    pub fn permits(&self, value: &Value) -> bool {
        self.allowed
            .as_ref()
            .is_none_or(|allowed| allowed.iter().any(|literal| same_literal(literal, value)))
    }
}

/// Literal equality, comparing numbers by value so `2` matches `2.0`
fn same_literal(literal: &Value, value: &Value) -> bool {
    match (literal, value) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        _ => literal == value,
    }
}

/// Schema for a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name (the key the schema is stored under)
    #[serde(skip)]
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Declared parameters, in document order
    pub parameters: IndexMap<String, ParameterSpec>,
    /// Names of parameters every call must supply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<IndexSet<String>>,
    /// Description of the result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<String>,
    /// Fields this crate does not interpret, kept for round-tripping
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl ToolSchema {
    /// Create a new tool schema with no parameters
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: IndexMap::new(),
            required: None,
            returns: None,
            extra: IndexMap::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Mark a parameter as required
    #[must_use]
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required
            .get_or_insert_with(IndexSet::new)
            .insert(name.into());
        self
    }

    /// Set the result description
    #[must_use]
    pub fn with_returns(mut self, returns: impl Into<String>) -> Self {
        self.returns = Some(returns.into());
        self
    }

    /// Required parameter names, in declaration order
    pub fn required_names(&self) -> impl Iterator<Item = &str> {
        self.required.iter().flatten().map(String::as_str)
    }

    /// Whether `name` is a required parameter
    #[must_use]
    pub fn is_required(&self, name: &str) -> bool {
        self.required.as_ref().is_some_and(|r| r.contains(name))
    }

    /// Parse a tool schema from its document form
    ///
    /// # Errors
    ///
    /// Returns `SchemaParse` if `description` or `parameters` is missing or
    /// mistyped, any parameter spec is malformed, or `required` names a
    /// parameter that is not declared
    pub fn parse(name: &str, value: &Value, path: &FieldPath) -> CoreResult<Self> {
        let object = expect_object(value, path)?;

        let description = match object.get("description") {
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(wrong_kind(&path.key("description"), "string", other)),
            None => {
                return Err(schema_error(
                    &path.key("description"),
                    "missing required field",
                ));
            }
        };

        let params_path = path.key("parameters");
        let params_object = match object.get("parameters") {
            Some(Value::Object(map)) => map,
            Some(other) => return Err(wrong_kind(&params_path, "object", other)),
            None => return Err(schema_error(&params_path, "missing required field")),
        };
        let mut parameters = IndexMap::with_capacity(params_object.len());
        for (param_name, spec) in params_object {
            let spec = ParameterSpec::parse(spec, &params_path.key(param_name.as_str()))?;
            parameters.insert(param_name.clone(), spec);
        }

        let required = match object.get("required") {
            None => None,
            Some(Value::Array(entries)) => {
                let required_path = path.key("required");
                let mut names = IndexSet::with_capacity(entries.len());
                for (i, entry) in entries.iter().enumerate() {
                    let entry_path = required_path.index(i);
                    let Value::String(param_name) = entry else {
                        return Err(wrong_kind(&entry_path, "string", entry));
                    };
                    if !parameters.contains_key(param_name) {
                        return Err(schema_error(
                            &entry_path,
                            format!("required names undeclared parameter '{}'", param_name),
                        ));
                    }
                    names.insert(param_name.clone());
                }
                Some(names)
            }
            Some(other) => return Err(wrong_kind(&path.key("required"), "array", other)),
        };

        let returns = optional_string(object, "returns", path)?;

        Ok(Self {
            name: name.to_string(),
            description,
            parameters,
            required,
            returns,
            extra: collect_extra(object, &["description", "parameters", "required", "returns"]),
        })
    }
}

fn schema_error(path: &FieldPath, reason: impl Into<String>) -> CoreError {
    CoreError::SchemaParse {
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn wrong_kind(path: &FieldPath, expected: &str, found: &Value) -> CoreError {
    schema_error(
        path,
        format!("expected {}, found {}", expected, ValueKind::of(found)),
    )
}

fn expect_object<'a>(value: &'a Value, path: &FieldPath) -> CoreResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| wrong_kind(path, "object", value))
}

fn optional_string(
    object: &Map<String, Value>,
    key: &str,
    path: &FieldPath,
) -> CoreResult<Option<String>> {
    match object.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(wrong_kind(&path.key(key), "string", other)),
    }
}

fn collect_extra(object: &Map<String, Value>, known: &[&str]) -> IndexMap<String, Value> {
    object
        .iter()
        .filter(|(k, _)| !known.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root(name: &str) -> FieldPath {
        FieldPath::root().key(name)
    }

    #[test]
    fn test_param_type_parse() {
        assert_eq!(ParamType::parse("string"), Some(ParamType::String));
        assert_eq!(ParamType::parse("boolean"), Some(ParamType::Boolean));
        assert_eq!(ParamType::parse("integer"), None);
    }

    #[test]
    fn test_param_type_accepts() {
        assert!(ParamType::Number.accepts(&json!(0.5)));
        assert!(!ParamType::Number.accepts(&json!("0.5")));
        assert!(ParamType::Array.accepts(&json!([])));
        assert!(!ParamType::String.accepts(&Value::Null));
    }

    #[test]
    fn test_tool_schema_parse() {
        let doc = json!({
            "description": "Replace personal identifiers in a document",
            "parameters": {
                "text": {"type": "string", "description": "Input text"},
                "entity_types": {
                    "type": "array",
                    "items": {"type": "string", "enum": ["PERSON", "ADDRESS", "SSN"]}
                },
                "method": {"type": "string", "enum": ["mask", "pseudonymize"]}
            },
            "required": ["text"],
            "returns": "The anonymized text"
        });
        let path = root("anonymize_sensitive_data");
        let schema = ToolSchema::parse("anonymize_sensitive_data", &doc, &path).unwrap();
        assert_eq!(schema.name, "anonymize_sensitive_data");
        assert_eq!(schema.parameters.len(), 3);
        assert_eq!(
            schema.parameters.keys().collect::<Vec<_>>(),
            vec!["text", "entity_types", "method"]
        );
        assert!(schema.is_required("text"));
        assert!(!schema.is_required("method"));
        let items = schema.parameters["entity_types"].items.as_ref().unwrap();
        assert_eq!(items.param_type, ParamType::String);
        assert_eq!(schema.returns.as_deref(), Some("The anonymized text"));
    }

    #[test]
    fn test_missing_description() {
        let doc = json!({"parameters": {}});
        let err = ToolSchema::parse("t", &doc, &root("t")).unwrap_err();
        assert_eq!(
            err,
            CoreError::SchemaParse {
                path: "$.t.description".to_string(),
                reason: "missing required field".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_parameters() {
        let doc = json!({"description": "d"});
        let err = ToolSchema::parse("t", &doc, &root("t")).unwrap_err();
        assert!(matches!(err, CoreError::SchemaParse { ref path, .. } if path == "$.t.parameters"));
    }

    #[test]
    fn test_required_names_undeclared_parameter() {
        let doc = json!({
            "description": "d",
            "parameters": {"a": {"type": "string"}},
            "required": ["a", "b"]
        });
        let err = ToolSchema::parse("t", &doc, &root("t")).unwrap_err();
        assert_eq!(
            err,
            CoreError::SchemaParse {
                path: "$.t.required[1]".to_string(),
                reason: "required names undeclared parameter 'b'".to_string(),
            }
        );
    }

    #[test]
    fn test_unknown_type() {
        let doc = json!({"type": "integer"});
        let err = ParameterSpec::parse(&doc, &root("p")).unwrap_err();
        assert!(err.to_string().contains("unknown type 'integer'"));
    }

    #[test]
    fn test_enum_inconsistent_with_type() {
        let doc = json!({"type": "string", "enum": ["low", 2]});
        let err = ParameterSpec::parse(&doc, &root("p")).unwrap_err();
        assert_eq!(
            err,
            CoreError::SchemaParse {
                path: "$.p.enum[1]".to_string(),
                reason: "enum value of kind number does not match declared type string".to_string(),
            }
        );
    }

    #[test]
    fn test_empty_enum_rejected() {
        let doc = json!({"type": "string", "enum": []});
        assert!(ParameterSpec::parse(&doc, &root("p")).is_err());
    }

    #[test]
    fn test_items_on_non_array_rejected() {
        let doc = json!({"type": "object", "items": {"type": "string"}});
        let err = ParameterSpec::parse(&doc, &root("p")).unwrap_err();
        assert!(matches!(err, CoreError::SchemaParse { ref path, .. } if path == "$.p.items"));
    }

    #[test]
    fn test_extra_fields_round_trip() {
        let doc = json!({
            "description": "d",
            "parameters": {"a": {"type": "number", "minimum": 0}},
            "category": "privacy"
        });
        let schema = ToolSchema::parse("t", &doc, &root("t")).unwrap();
        assert_eq!(schema.extra.get("category"), Some(&json!("privacy")));
        assert_eq!(serde_json::to_value(&schema).unwrap(), doc);
    }

    #[test]
    fn test_builder_matches_parse() {
        let built = ToolSchema::new("detect_privilege", "Flag privileged communications")
            .with_parameter(
                "document",
                ParameterSpec::new(ParamType::String).with_description("Document text"),
            )
            .with_required("document")
            .with_returns("Privilege assessment");
        let doc = serde_json::to_value(&built).unwrap();
        let parsed =
            ToolSchema::parse("detect_privilege", &doc, &root("detect_privilege")).unwrap();
        assert_eq!(parsed, built);
    }

    #[test]
    fn test_permits() {
        let spec = ParameterSpec::new(ParamType::String).with_enum(vec![json!("a"), json!("b")]);
        assert!(spec.permits(&json!("a")));
        assert!(!spec.permits(&json!("c")));
        assert!(ParameterSpec::new(ParamType::String).permits(&json!("anything")));
    }
}
