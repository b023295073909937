//! Utilities Module - shared infrastructure
//!
//! - `constants`: Centralized timeouts and limits
//! - `jsonpath`: Path expressions over task results (header/body)

pub mod constants;
pub mod jsonpath;

// Re-export public types
pub use constants::{CONNECT_TIMEOUT, FETCH_TIMEOUT, JQ_TIMEOUT, REDIRECT_LIMIT, USER_AGENT};
pub use jsonpath::{PathExpr, ResultSource, Segment};
