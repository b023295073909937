//! Centralized constants for runtime configuration
//!
//! All timeout and limit values in one place for easy tuning.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════
// Timeouts
// ═══════════════════════════════════════════════════════════════

/// Default timeout for a task's HTTP request (overridable with --timeout)
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for establishing HTTP connections
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for one evaluation by the external jq backend
pub const JQ_TIMEOUT: Duration = Duration::from_secs(10);

// ═══════════════════════════════════════════════════════════════
// HTTP Client
// ═══════════════════════════════════════════════════════════════

/// Maximum number of HTTP redirects to follow
pub const REDIRECT_LIMIT: usize = 5;

pub const USER_AGENT: &str = concat!("httpflow/", env!("CARGO_PKG_VERSION"));
