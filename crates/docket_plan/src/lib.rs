//! docket Workflows
//!
//! Named multi-step workflows over registered tools. Loading checks shape
//! only; step names resolve against a schema registry on demand.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod graph;
pub mod validate;
pub mod workflow;

pub use graph::{ActiveWorkflow, WorkflowGraph};
pub use validate::{MissingStep, Resolution, is_resolved};
pub use workflow::{AdjacentDuplicates, LoadPolicy, Workflow, WorkflowForm};
