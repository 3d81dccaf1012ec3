//! Training-config loading: merge over defaults, coerce, validate.

use crate::config::TrainingConfig;
use crate::constraint::{Constraint, standard_constraints};
use docket_core::{ConfigViolation, CoreError, CoreResult, FieldPath, ValueKind, parse_document};
use serde_json::{Map, Value};

/// Loads training configs against a set of constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLoader {
    constraints: Vec<Constraint>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader with the standard training constraints
    #[must_use]
    pub fn new() -> Self {
        Self {
            constraints: standard_constraints(),
        }
    }

    /// Loader with no constraints at all
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constraints: Vec::new(),
        }
    }

    /// Add a constraint
    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Registered constraints
    #[must_use]
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Merge `document` over `defaults`, coerce and validate
    ///
    /// Nested objects merge key by key; arrays and scalars in `document`
    /// replace the default outright.
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidation` listing every violation found, or a single
    /// one if either input is not an object
    pub fn load(&self, document: &Value, defaults: &Value) -> CoreResult<TrainingConfig> {
        let defaults = expect_object("defaults", defaults)?;
        let document = expect_object("document", document)?;

        let mut merged = defaults.clone();
        merge_into(&mut merged, document);

        let mut violations = Vec::new();
        for (key, value) in merged.iter_mut() {
            self.check(&FieldPath::root().key(key.as_str()), value, &mut violations);
        }

        if !violations.is_empty() {
            tracing::debug!(violations = violations.len(), "training config rejected");
            return Err(CoreError::ConfigValidation { violations });
        }

        tracing::debug!(keys = merged.len(), "loaded training config");
        Ok(TrainingConfig::from_map(merged))
    }

    /// Parse document text and load it over `defaults`
    ///
    /// # Errors
    ///
    /// Returns `InvalidDocument` for malformed JSON, otherwise as [`Self::load`]
    pub fn from_json(&self, text: &str, defaults: &Value) -> CoreResult<TrainingConfig> {
        self.load(&parse_document(text)?, defaults)
    }

    fn check(&self, path: &FieldPath, value: &mut Value, violations: &mut Vec<ConfigViolation>) {
        let mut constrained = false;
        for constraint in self.constraints.iter().filter(|c| c.applies_to(path)) {
            constrained = true;
            match constraint.apply(value) {
                Ok(coerced) => *value = coerced,
                Err(reason) => {
                    violations.push(ConfigViolation::new(path.to_dotted(), reason));
                    return;
                }
            }
        }
        if constrained {
            return;
        }

        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    self.check(&path.key(key.as_str()), child, violations);
                }
            }
            Value::Array(items) => {
                for (i, child) in items.iter_mut().enumerate() {
                    self.check(&path.index(i), child, violations);
                }
            }
            _ => {}
        }
    }
}

fn expect_object<'a>(what: &str, value: &'a Value) -> CoreResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        CoreError::config_violation(
            what,
            format!("expected object, found {}", ValueKind::of(value)),
        )
    })
}

fn merge_into(base: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_into(existing, incoming);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}
