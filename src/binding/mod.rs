//! Binding Module - variable substitution in task templates
//!
//! Two placeholder classes:
//! - `${ENV.NAME}`: process environment, from an [`Environment`] snapshot
//! - `${taskId.name}`: flow variables exported by earlier layers
//!
//! Data flow:
//! ```text
//! TaskDefinition templates (url, headers, body)
//!                  ↓
//!      flow pass (FlowVariables)
//!                  ↓
//!      environment pass (Environment)
//!                  ↓
//!   unresolved scan → skip task, or send request
//! ```

mod environment;
mod template;
mod validate;

// Re-export public types
pub use environment::Environment;
pub use template::{
    has_unresolved, interpolate, interpolate_str, substitute_environment,
    substitute_environment_str, substitute_flow, substitute_flow_str, unresolved_placeholders,
};
pub use validate::is_referenceable_name;
