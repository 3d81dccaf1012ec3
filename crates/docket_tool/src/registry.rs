//! Schema registry for tool lookup and call validation.

use crate::schema::ToolSchema;
use crate::validate::{CallValidator, CallViolation};
use docket_core::{CoreError, CoreResult, FieldPath, ValueKind, parse_document};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Registry of tool schemas
///
/// Loaded once from a schema document and read-only afterwards, so a
/// loaded registry can be shared across threads behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRegistry {
    /// Schemas by tool name, in document order
    tools: IndexMap<String, ToolSchema>,
    /// Validator applied by `validate_call`
    validator: CallValidator,
}

impl SchemaRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a mapping of tool name to schema
    ///
    /// # Errors
    ///
    /// Returns `SchemaParse` if the document is not an object or any
    /// schema in it is malformed
    pub fn load(document: &Value) -> CoreResult<Self> {
        let root = FieldPath::root();
        let entries = document.as_object().ok_or_else(|| CoreError::SchemaParse {
            path: root.to_string(),
            reason: format!("expected object, found {}", ValueKind::of(document)),
        })?;

        let mut tools = IndexMap::with_capacity(entries.len());
        for (name, value) in entries {
            let schema = ToolSchema::parse(name, value, &root.key(name.as_str()))?;
            tools.insert(name.clone(), schema);
        }

        tracing::debug!(tools = tools.len(), "loaded tool schemas");
        Ok(Self {
            tools,
            validator: CallValidator::default(),
        })
    }

    /// Parse document text and load it
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` for malformed JSON, otherwise as [`Self::load`]
    pub fn from_json(text: &str) -> CoreResult<Self> {
        Self::load(&parse_document(text)?)
    }

    /// Replace the validator used by `validate_call`
    #[must_use]
    pub fn with_validator(mut self, validator: CallValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Register a schema built in code
    ///
    /// # Errors
    ///
    /// Returns `SchemaParse` if a schema of the same name is present or the
    /// schema's required set names an undeclared parameter
    pub fn insert(&mut self, schema: ToolSchema) -> CoreResult<()> {
        let path = FieldPath::root().key(schema.name.as_str());
        if self.tools.contains_key(&schema.name) {
            return Err(CoreError::SchemaParse {
                path: path.to_string(),
                reason: "tool already registered".to_string(),
            });
        }
        if let Some(undeclared) = schema
            .required_names()
            .find(|name| !schema.parameters.contains_key(*name))
        {
            return Err(CoreError::SchemaParse {
                path: path.key("required").to_string(),
                reason: format!("required names undeclared parameter '{}'", undeclared),
            });
        }
        self.tools.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Get a schema by tool name
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` if no schema is registered under `name`
    pub fn get(&self, name: &str) -> CoreResult<&ToolSchema> {
        self.tools.get(name).ok_or_else(|| CoreError::UnknownTool {
            name: name.to_string(),
        })
    }

    /// Validate a candidate call
    ///
    /// Returns every violation found; an empty list means the call is
    /// valid. An invalid call is never an error.
    ///
    /// # Errors
    ///
    /// Returns `UnknownTool` if no schema is registered under `name`
    pub fn validate_call(&self, name: &str, arguments: &Value) -> CoreResult<Vec<CallViolation>> {
        let schema = self.get(name)?;
        let violations = self.validator.validate(schema, arguments);
        tracing::trace!(tool = name, violations = violations.len(), "validated call");
        Ok(violations)
    }

    /// Check if a tool is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered tool names, in document order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Registered schemas, in document order
    pub fn iter(&self) -> impl Iterator<Item = &ToolSchema> {
        self.tools.values()
    }

    /// Number of registered tools
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
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

impl Serialize for SchemaRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(&self.tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamType, ParameterSpec};
    use proptest::prelude::*;
    use serde_json::json;

    fn privacy_tools() -> Value {
        json!({
            "anonymize_sensitive_data": {
                "description": "Anonymize personal data in legal documents",
                "parameters": {
                    "text": {"type": "string"},
                    "entity_types": {"type": "array", "items": {"type": "string"}},
                    "preserve_format": {"type": "boolean"}
                },
                "required": ["text"],
                "returns": "Anonymized text and an entity map"
            },
            "detect_privilege": {
                "description": "Flag attorney-client privileged content",
                "parameters": {
                    "document": {"type": "string"},
                    "privilege_types": {
                        "type": "array",
                        "items": {"type": "string", "enum": ["attorney_client", "work_product"]}
                    },
                    "confidence_threshold": {"type": "number"}
                },
                "required": ["document"],
                "returns": "Privilege assessment"
            }
        })
    }

    #[test]
    fn test_registry_new() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_load() {
        let registry = SchemaRegistry::load(&privacy_tools()).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["anonymize_sensitive_data", "detect_privilege"]
        );
        assert!(registry.contains("detect_privilege"));
    }

    #[test]
    fn test_registry_load_not_object() {
        let err = SchemaRegistry::load(&json!(["detect_privilege"])).unwrap_err();
        assert_eq!(
            err,
            CoreError::SchemaParse {
                path: "$".to_string(),
                reason: "expected object, found array".to_string(),
            }
        );
    }

    #[test]
    fn test_registry_load_reports_nested_path() {
        let mut doc = privacy_tools();
        doc["detect_privilege"]["parameters"]["privilege_types"]["items"]["enum"][1] = json!(7);
        let err = SchemaRegistry::load(&doc).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SchemaParse { ref path, .. }
                if path == "$.detect_privilege.parameters.privilege_types.items.enum[1]"
        ));
    }

    #[test]
    fn test_registry_from_json_invalid() {
        let result = SchemaRegistry::from_json("{\"a\": ");
        assert!(matches!(result, Err(CoreError::InvalidDocument { .. })));
    }

    #[test]
    fn test_registry_get() {
        let registry = SchemaRegistry::load(&privacy_tools()).unwrap();
        let schema = registry.get("detect_privilege").unwrap();
        assert_eq!(schema.description, "Flag attorney-client privileged content");
    }

    #[test]
    fn test_registry_get_not_found() {
        let registry = SchemaRegistry::load(&privacy_tools()).unwrap();
        let err = registry.get("search_case_law").unwrap_err();
        assert_eq!(
            err,
            CoreError::UnknownTool {
                name: "search_case_law".to_string()
            }
        );
    }

    #[test]
    fn test_validate_call() {
        let registry = SchemaRegistry::load(&privacy_tools()).unwrap();
        let ok = registry
            .validate_call(
                "detect_privilege",
                &json!({"document": "memo", "privilege_types": ["work_product"]}),
            )
            .unwrap();
        assert!(ok.is_empty());

        let bad = registry
            .validate_call("detect_privilege", &json!({"privilege_types": ["gossip"]}))
            .unwrap();
        assert_eq!(bad.len(), 2);
    }

    #[test]
    fn test_validate_call_unknown_tool() {
        let registry = SchemaRegistry::load(&privacy_tools()).unwrap();
        let result = registry.validate_call("nope", &json!({}));
        assert!(matches!(result, Err(CoreError::UnknownTool { .. })));
    }

    #[test]
    fn test_validate_call_with_lenient_validator() {
        let registry = SchemaRegistry::load(&privacy_tools())
            .unwrap()
            .with_validator(CallValidator::new().with_allow_unknown(true));
        let violations = registry
            .validate_call("detect_privilege", &json!({"document": "memo", "matter_id": 4}))
            .unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn test_registry_insert() {
        let mut registry = SchemaRegistry::new();
        let schema = ToolSchema::new("log_access", "Record document access")
            .with_parameter("user", ParameterSpec::new(ParamType::String))
            .with_required("user");
        registry.insert(schema.clone()).unwrap();
        assert!(registry.contains("log_access"));
        assert!(registry.insert(schema).is_err());
    }

    #[test]
    fn test_registry_insert_undeclared_required() {
        let mut registry = SchemaRegistry::new();
        let schema = ToolSchema::new("log_access", "Record document access").with_required("user");
        let err = registry.insert(schema).unwrap_err();
        assert!(matches!(
            err,
            CoreError::SchemaParse { ref path, .. } if path == "$.log_access.required"
        ));
    }

    #[test]
    fn test_registry_round_trip() {
        let doc = privacy_tools();
        let registry = SchemaRegistry::load(&doc).unwrap();
        assert_eq!(registry.to_document().unwrap(), doc);
        assert_eq!(SchemaRegistry::load(&registry.to_document().unwrap()).unwrap(), registry);
    }

    fn param_type() -> impl Strategy<Value = ParamType> {
        prop_oneof![
            Just(ParamType::String),
            Just(ParamType::Array),
            Just(ParamType::Object),
            Just(ParamType::Number),
            Just(ParamType::Boolean),
        ]
    }

    fn sample_value(param_type: ParamType) -> Value {
        match param_type {
            ParamType::String => json!("text"),
            ParamType::Array => json!([]),
            ParamType::Object => json!({}),
            ParamType::Number => json!(1.5),
            ParamType::Boolean => json!(true),
        }
    }

    /// A tool document with its parameters and the subset marked required
    fn tool_document() -> impl Strategy<Value = (Value, Vec<(String, ParamType, bool)>)> {
        prop::collection::btree_map("[a-z][a-z_]{0,8}", (param_type(), any::<bool>()), 0..6)
            .prop_map(|params| {
                let params: Vec<(String, ParamType, bool)> =
                    params.into_iter().map(|(k, (t, r))| (k, t, r)).collect();
                let parameters: serde_json::Map<String, Value> = params
                    .iter()
                    .map(|(name, t, _)| (name.clone(), json!({"type": t.name()})))
                    .collect();
                let required: Vec<&str> = params
                    .iter()
                    .filter(|(_, _, r)| *r)
                    .map(|(name, _, _)| name.as_str())
                    .collect();
                let doc = json!({
                    "generated_tool": {
                        "description": "generated",
                        "parameters": parameters,
                        "required": required,
                    }
                });
                (doc, params)
            })
    }

    proptest! {
        #[test]
        fn prop_required_subset_of_parameters((doc, _params) in tool_document()) {
            let registry = SchemaRegistry::load(&doc).unwrap();
            for name in registry.names().collect::<Vec<_>>() {
                let schema = registry.get(name).unwrap();
                for required in schema.required_names() {
                    prop_assert!(schema.parameters.contains_key(required));
                }
            }
        }

        #[test]
        fn prop_well_typed_call_is_valid((doc, params) in tool_document()) {
            let registry = SchemaRegistry::load(&doc).unwrap();
            let args: serde_json::Map<String, Value> = params
                .iter()
                .filter(|(_, _, required)| *required)
                .map(|(name, t, _)| (name.clone(), sample_value(*t)))
                .collect();
            let violations = registry
                .validate_call("generated_tool", &Value::Object(args))
                .unwrap();
            prop_assert!(violations.is_empty());
        }

        #[test]
        fn prop_missing_required_reported_once((doc, params) in tool_document()) {
            let required: Vec<&(String, ParamType, bool)> =
                params.iter().filter(|(_, _, r)| *r).collect();
            prop_assume!(!required.is_empty());
            let registry = SchemaRegistry::load(&doc).unwrap();
            let dropped = &required[0].0;
            let args: serde_json::Map<String, Value> = required
                .iter()
                .filter(|(name, _, _)| name != dropped)
                .map(|(name, t, _)| (name.clone(), sample_value(*t)))
                .collect();
            let violations = registry
                .validate_call("generated_tool", &Value::Object(args))
                .unwrap();
            prop_assert_eq!(
                violations,
                vec![CallViolation::MissingRequired { name: dropped.clone() }]
            );
        }

        #[test]
        fn prop_round_trip((doc, _params) in tool_document()) {
            let registry = SchemaRegistry::load(&doc).unwrap();
            let reloaded = SchemaRegistry::load(&registry.to_document().unwrap()).unwrap();
            prop_assert_eq!(reloaded, registry);
        }
    }
}
