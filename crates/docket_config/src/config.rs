//! Loaded training configuration.

use crate::value::FromConfigValue;
use docket_core::path::Segment;
use docket_core::{CoreError, CoreResult, FieldPath, ValueKind};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// A training configuration after defaults, coercion and validation
///
/// Keys are addressed with dotted paths such as `training.batch_size`.
/// Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingConfig {
    root: Map<String, Value>,
}

impl TrainingConfig {
    pub(crate) fn from_map(root: Map<String, Value>) -> Self {
        Self { root }
    }

    /// Raw value at a dotted key
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        let path = FieldPath::from_dotted(key);
        let mut segments = path.segments().iter();
        let Some(Segment::Key(first)) = segments.next() else {
            return None;
        };
        let mut current = self.root.get(first)?;
        for segment in segments {
            current = match segment {
                Segment::Key(k) => current.as_object()?.get(k)?,
                Segment::Index(i) => current.as_array()?.get(*i)?,
            };
        }
        Some(current)
    }

    /// Typed value at a dotted key
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` if the key is absent, or `ConfigValidation` if
    /// the value cannot be read as `T`
    pub fn get<T: FromConfigValue>(&self, key: &str) -> CoreResult<T> {
        let value = self.lookup(key).ok_or_else(|| CoreError::MissingKey {
            key: key.to_string(),
        })?;
        read(key, value)
    }

    /// Typed value at a dotted key, or `fallback` when absent
    ///
    /// # Errors
    ///
    /// Returns `ConfigValidation` if the key is present but cannot be read as `T`
    pub fn get_or<T: FromConfigValue>(&self, key: &str, fallback: T) -> CoreResult<T> {
        match self.lookup(key) {
            Some(value) => read(key, value),
            None => Ok(fallback),
        }
    }

    /// Check if a dotted key is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }

    /// Nested mapping at a dotted key
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` if the key is absent, or `ConfigValidation` if
    /// it holds something other than an object
    pub fn section(&self, key: &str) -> CoreResult<TrainingConfig> {
        match self.get::<Value>(key)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(CoreError::config_violation(
                key,
                format!("expected object, found {}", ValueKind::of(&other)),
            )),
        }
    }

    /// Top-level keys
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    /// Serialize the merged, coerced document
    #[must_use]
    pub fn to_document(&self) -> Value {
        Value::Object(self.root.clone())
    }
}

impl Serialize for TrainingConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}

fn read<T: FromConfigValue>(key: &str, value: &Value) -> CoreResult<T> {
    T::from_config_value(value).ok_or_else(|| {
        CoreError::config_violation(
            key,
            format!("expected {}, found {}", T::EXPECTED, ValueKind::of(value)),
        )
    })
}
