//! Typed reads of config values.

use serde_json::Value;

/// A type that can be read out of a config value
///
/// Reads are lenient in the same way loading is: numeric strings read as
/// numbers and `"true"`/`"false"` read as booleans.
pub trait FromConfigValue: Sized {
    /// Type name used in error messages
    const EXPECTED: &'static str;

    /// Convert, or `None` if the value does not fit
    fn from_config_value(value: &Value) -> Option<Self>;
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

impl FromConfigValue for f64 {
    const EXPECTED: &'static str = "number";

    fn from_config_value(value: &Value) -> Option<Self> {
        as_f64(value)
    }
}

impl FromConfigValue for f32 {
    const EXPECTED: &'static str = "number";

    fn from_config_value(value: &Value) -> Option<Self> {
        as_f64(value).map(|f| f as f32)
    }
}

impl FromConfigValue for i64 {
    const EXPECTED: &'static str = "integer";

    fn from_config_value(value: &Value) -> Option<Self> {
        as_i64(value)
    }
}

impl FromConfigValue for u64 {
    const EXPECTED: &'static str = "non-negative integer";

    fn from_config_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) if n.is_u64() => n.as_u64(),
            _ => as_i64(value).and_then(|i| u64::try_from(i).ok()),
        }
    }
}

impl FromConfigValue for u32 {
    const EXPECTED: &'static str = "non-negative integer";

    fn from_config_value(value: &Value) -> Option<Self> {
        u64::from_config_value(value).and_then(|u| u32::try_from(u).ok())
    }
}

impl FromConfigValue for usize {
    const EXPECTED: &'static str = "non-negative integer";

    fn from_config_value(value: &Value) -> Option<Self> {
        u64::from_config_value(value).and_then(|u| usize::try_from(u).ok())
    }
}

impl FromConfigValue for bool {
    const EXPECTED: &'static str = "boolean";

    fn from_config_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromConfigValue for String {
    const EXPECTED: &'static str = "string";

    fn from_config_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl FromConfigValue for Vec<String> {
    const EXPECTED: &'static str = "array of strings";

    fn from_config_value(value: &Value) -> Option<Self> {
        value
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }
}

impl FromConfigValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_config_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers() {
        assert_eq!(f64::from_config_value(&json!("5e-5")), Some(5e-5));
        assert_eq!(f64::from_config_value(&json!(3)), Some(3.0));
        assert_eq!(i64::from_config_value(&json!(4.0)), Some(4));
        assert_eq!(i64::from_config_value(&json!(4.5)), None);
        assert_eq!(u32::from_config_value(&json!("16")), Some(16));
        assert_eq!(u64::from_config_value(&json!(-1)), None);
        assert_eq!(usize::from_config_value(&json!("many")), None);
    }

    #[test]
    fn test_booleans() {
        assert_eq!(bool::from_config_value(&json!(true)), Some(true));
        assert_eq!(bool::from_config_value(&json!("false")), Some(false));
        assert_eq!(bool::from_config_value(&json!(1)), None);
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            String::from_config_value(&json!("mistral-7b")),
            Some("mistral-7b".to_string())
        );
        assert_eq!(String::from_config_value(&json!(7)), None);
        assert_eq!(
            Vec::<String>::from_config_value(&json!(["q_proj", "v_proj"])),
            Some(vec!["q_proj".to_string(), "v_proj".to_string()])
        );
        assert_eq!(Vec::<String>::from_config_value(&json!(["q_proj", 1])), None);
    }
}
