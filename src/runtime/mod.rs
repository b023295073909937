//! Runtime Module - flow execution
//!
//! - `executor`: one HTTP request per task (interpolation, skip, transport)
//! - `backend`: path evaluation for display conditions and exports
//! - `runner`: layer-by-layer orchestration with tokio
//!
//! This module represents the "how" - runtime execution.
//! For static structure, see the `ast` and `dag` modules.

mod backend;
mod executor;
mod runner;

pub use backend::{BuiltinBackend, JqBackend, PathBackend};
pub use executor::{normalize_headers, BodyEncoding, PreparedRequest, TaskExecutor, TaskOutcome};
pub use runner::{RunReport, Runner};
