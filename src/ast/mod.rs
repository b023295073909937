//! AST Module - task definitions as read from the definition file
//!
//! Contains parsed Rust types from JSON (or YAML) definition files:
//! - `task`: TaskDefinition, Method, DisplaySpec
//! - `definition`: loading, schema validation and post-load checks
//! - `schema`: embedded JSON Schema for definition files
//!
//! These types represent the "what" - static structure loaded once per run.
//! For runtime execution, see the `runtime` module.

mod definition;
mod schema;
mod task;

// Re-export all public types
pub use definition::{load_definition, parse_definition, DefinitionFormat};
pub use schema::DefinitionSchemaValidator;
pub use task::{DisplaySpec, Fields, Method, TaskDefinition};
