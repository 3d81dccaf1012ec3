//! docket Training Config
//!
//! Loads training configuration documents over defaults, coercing and
//! validating constrained keys, and exposes typed dotted-key access.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod constraint;
pub mod defaults;
pub mod loader;
pub mod value;

// Re-exports
pub use config::TrainingConfig;
pub use constraint::{Constraint, ConstraintKind, KeyMatch, standard_constraints};
pub use defaults::training_defaults;
pub use loader::ConfigLoader;
pub use value::FromConfigValue;
