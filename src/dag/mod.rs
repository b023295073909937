//! DAG Module - dependency resolution
//!
//! Turns the loaded task universe into an ordered list of layers:
//! - `grouper`: layered topological sort with stall detection
//! - `plan`: exclusions and target closure applied before grouping
//!
//! Every task's dependencies sit in a strictly earlier layer; tasks within a
//! layer are mutually independent and run concurrently.

mod grouper;
mod plan;

// Re-export public types
pub use grouper::{group, Layer};
pub use plan::{apply_exclusions, parse_exclusions, plan, target_closure};
