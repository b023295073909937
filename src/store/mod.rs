//! Store Module - state management
//!
//! Key types:
//! - `FlowVariables`: append-only table of exported values (`taskId.name`)
//! - `TaskResult`: normalized (headers, body) pair of one task execution

mod result;
mod variables;

// Re-export all public types
pub use result::TaskResult;
pub use variables::{export_value, FlowVariables};
