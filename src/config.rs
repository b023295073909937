//! Run configuration
//!
//! Transport and path-evaluation settings for one run, assembled by the CLI
//! from flags and environment variables.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Command-line flags
//! 2. Environment variables (`SOCKS5_PROXY`, `JQ_PATH`, `.env` included)
//! 3. Defaults from [`crate::util::constants`]

use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use crate::error::{FlowError, Result};
use crate::runtime::{BuiltinBackend, JqBackend, PathBackend};
use crate::util::{CONNECT_TIMEOUT, FETCH_TIMEOUT, REDIRECT_LIMIT, USER_AGENT};

/// Which evaluator resolves display and export paths
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum PathBackendKind {
    /// In-process path grammar
    #[default]
    Builtin,
    /// External jq binary
    Jq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Proxy for every request (`socks5://`, `http://` ...)
    pub proxy: Option<String>,
    /// Whole-request timeout
    pub timeout: Duration,
    pub path_backend: PathBackendKind,
    /// jq binary used by [`PathBackendKind::Jq`]
    pub jq_path: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            timeout: FETCH_TIMEOUT,
            path_backend: PathBackendKind::default(),
            jq_path: "jq".to_string(),
        }
    }
}

impl RunConfig {
    /// Proxy URL, ignoring a blank value
    pub fn effective_proxy(&self) -> Option<&str> {
        self.proxy.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Reject settings that cannot produce a working client
    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(FlowError::Config {
                reason: "timeout must be greater than zero".to_string(),
            });
        }

        if let Some(proxy) = self.effective_proxy() {
            reqwest::Proxy::all(proxy).map_err(|e| FlowError::Config {
                reason: format!("invalid proxy '{}': {}", proxy, e),
            })?;
        }

        if self.path_backend == PathBackendKind::Jq && self.jq_path.trim().is_empty() {
            return Err(FlowError::Config {
                reason: "jq backend selected but jq path is empty".to_string(),
            });
        }

        Ok(())
    }

    /// Shared HTTP client for every task of the run
    pub fn http_client(&self) -> Result<reqwest::Client> {
        self.validate()?;

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(CONNECT_TIMEOUT.min(self.timeout))
            .redirect(reqwest::redirect::Policy::limited(REDIRECT_LIMIT))
            .user_agent(USER_AGENT);

        if let Some(proxy) = self.effective_proxy() {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| FlowError::Config {
                reason: format!("invalid proxy '{}': {}", proxy, e),
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(|e| FlowError::Config {
            reason: format!("cannot build HTTP client: {}", e),
        })
    }

    pub fn path_backend(&self) -> Arc<dyn PathBackend> {
        match self.path_backend {
            PathBackendKind::Builtin => Arc::new(BuiltinBackend),
            PathBackendKind::Jq => Arc::new(JqBackend::new(self.jq_path.trim())),
        }
    }
}
