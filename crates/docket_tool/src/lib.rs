//! docket Tool Schemas
//!
//! Registry of declared tool schemas and validation of candidate calls.
//! The registry describes tools; it never invokes them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod registry;
pub mod schema;
pub mod validate;

pub use registry::SchemaRegistry;
pub use schema::{ParamType, ParameterSpec, ToolSchema};
pub use validate::{CallValidator, CallViolation};
