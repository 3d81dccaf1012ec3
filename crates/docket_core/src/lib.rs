//! docket Core Types
//!
//! This crate contains pure types and logic with no I/O.
//! Every other docket crate reports failures through [`CoreError`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod error;
pub mod kind;
pub mod path;

// Re-exports
pub use document::{parse_document, section};
pub use error::{ConfigViolation, CoreError, CoreResult};
pub use kind::ValueKind;
pub use path::FieldPath;
