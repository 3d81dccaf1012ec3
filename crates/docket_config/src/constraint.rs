//! Constraints on training-config values, with coercion.

use docket_core::{FieldPath, ValueKind};
use serde_json::{Number, Value};

/// What a constrained value must be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    /// Finite number greater than zero
    PositiveNumber,
    /// Integer greater than zero
    PositiveInteger,
    /// Finite number greater than or equal to zero
    NonNegativeNumber,
    /// Number in `[0, 1]`
    Fraction,
}

/// Which keys a constraint applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyMatch {
    /// Any key with this name, at any depth
    Leaf(String),
    /// Exactly this dotted path
    Path(String),
}

impl KeyMatch {
    fn matches(&self, path: &FieldPath) -> bool {
        match self {
            Self::Leaf(name) => path.leaf_key() == Some(name.as_str()),
            Self::Path(dotted) => path.to_dotted() == *dotted,
        }
    }
}

/// A constraint on one or more config keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    /// Keys the constraint applies to
    pub key: KeyMatch,
    /// Required shape of the value
    pub kind: ConstraintKind,
}

impl Constraint {
    /// Constrain every key with this name
    #[must_use]
    pub fn leaf(name: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            key: KeyMatch::Leaf(name.into()),
            kind,
        }
    }

    /// Constrain one dotted path
    #[must_use]
    pub fn at(dotted: impl Into<String>, kind: ConstraintKind) -> Self {
        Self {
            key: KeyMatch::Path(dotted.into()),
            kind,
        }
    }

    /// Whether the constraint applies at `path`
    #[must_use]
    pub fn applies_to(&self, path: &FieldPath) -> bool {
        self.key.matches(path)
    }

    /// Coerce a value to the constrained shape and check its range
    ///
    /// Returns the coerced value, or the reason it was rejected.
    pub fn apply(&self, value: &Value) -> Result<Value, String> {
        match self.kind {
            ConstraintKind::PositiveInteger => {
                let n = coerce_integer(value)?;
                if n <= 0 {
                    return Err(format!("must be a positive integer, got {}", n));
                }
                Ok(Value::from(n))
            }
            ConstraintKind::PositiveNumber => {
                let n = coerce_number(value)?;
                if n.as_f64() <= 0.0 {
                    return Err(format!("must be positive, got {}", n));
                }
                Ok(n.into_value())
            }
            ConstraintKind::NonNegativeNumber => {
                let n = coerce_number(value)?;
                if n.as_f64() < 0.0 {
                    return Err(format!("must not be negative, got {}", n));
                }
                Ok(n.into_value())
            }
            ConstraintKind::Fraction => {
                let n = coerce_number(value)?;
                if !(0.0..=1.0).contains(&n.as_f64()) {
                    return Err(format!("must be between 0 and 1, got {}", n));
                }
                Ok(n.into_value())
            }
        }
    }
}

/// Constraints every training config is checked against
#[must_use]
pub fn standard_constraints() -> Vec<Constraint> {
    use ConstraintKind::*;
    vec![
        Constraint::leaf("learning_rate", PositiveNumber),
        Constraint::leaf("num_epochs", PositiveNumber),
        Constraint::leaf("epochs", PositiveNumber),
        Constraint::leaf("num_train_epochs", PositiveNumber),
        Constraint::leaf("batch_size", PositiveInteger),
        Constraint::leaf("per_device_train_batch_size", PositiveInteger),
        Constraint::leaf("per_device_eval_batch_size", PositiveInteger),
        Constraint::leaf("eval_batch_size", PositiveInteger),
        Constraint::leaf("gradient_accumulation_steps", PositiveInteger),
        Constraint::leaf("max_seq_length", PositiveInteger),
        Constraint::leaf("weight_decay", NonNegativeNumber),
        Constraint::leaf("warmup_ratio", Fraction),
        Constraint::leaf("validation_split", Fraction),
    ]
}

/// A number that remembers whether it was integral
#[derive(Debug, Clone, Copy, PartialEq)]
enum Numeric {
    Int(i64),
    Float(f64),
}

impl Numeric {
    fn as_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Int(i) => Value::from(i),
            // Finite by construction, so from_f64 cannot fail
            Self::Float(f) => Number::from_f64(f).map_or(Value::Null, Value::Number),
        }
    }
}

impl std::fmt::Display for Numeric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
        }
    }
}

fn coerce_number(value: &Value) -> Result<Numeric, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Numeric::Int)
            .or_else(|| n.as_f64().map(Numeric::Float))
            .ok_or_else(|| format!("number {} is out of range", n)),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(Numeric::Int(i));
            }
            match s.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Numeric::Float(f)),
                _ => Err(format!("expected a number, found string '{}'", s)),
            }
        }
        other => Err(format!("expected a number, found {}", ValueKind::of(other))),
    }
}

fn coerce_integer(value: &Value) -> Result<i64, String> {
    if matches!(value, Value::Number(n) if n.is_u64() && !n.is_i64()) {
        return Err(format!("number {} is out of range", value));
    }
    match coerce_number(value)? {
        Numeric::Int(i) => Ok(i),
        Numeric::Float(f) if f.fract() != 0.0 => Err(format!("must be an integer, got {}", f)),
        Numeric::Float(f) if f.abs() < i64::MAX as f64 => Ok(f as i64),
        Numeric::Float(f) => Err(format!("number {} is out of range", f)),
    }
}
