//! Path evaluation backends
//!
//! Display conditions and exports are evaluated through a [`PathBackend`]:
//!
//! - [`BuiltinBackend`] - in-process `header|body` path grammar (default)
//! - [`JqBackend`] - pipes the selected half of the result through an external
//!   `jq` binary, using `.` + the rest of the path as the filter
//!
//! Both return `Ok(None)` for "undefined". Only a backend that cannot run at
//! all (missing binary, timeout) is an error.

use std::process::Stdio;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::error::FlowError;
use crate::store::TaskResult;
use crate::util::jsonpath::{self, ResultSource};
use crate::util::JQ_TIMEOUT;

/// Evaluates a path expression against a task result
#[async_trait]
pub trait PathBackend: Send + Sync {
    /// Backend name for logs ("builtin", "jq")
    fn name(&self) -> &'static str;

    /// Resolve `path`; `Ok(None)` means undefined
    async fn evaluate(&self, result: &TaskResult, path: &str) -> Result<Option<Value>, FlowError>;
}

/// In-process resolver over the path grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBackend;

#[async_trait]
impl PathBackend for BuiltinBackend {
    fn name(&self) -> &'static str {
        "builtin"
    }

    async fn evaluate(&self, result: &TaskResult, path: &str) -> Result<Option<Value>, FlowError> {
        Ok(jsonpath::resolve(result, path))
    }
}

/// External `jq` process per evaluation
#[derive(Debug, Clone)]
pub struct JqBackend {
    binary: String,
}

impl JqBackend {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Split `body.a.b[1]` into the `body` source and the `.a.b[1]` filter
    fn split_path(path: &str) -> Option<(ResultSource, String)> {
        let (token, rest) = match path.split_once('.') {
            Some((token, rest)) => (token, rest),
            None => (path, ""),
        };
        let source = ResultSource::from_token(token)?;
        // Empty segments (`body..a`) are dropped, as the builtin grammar does
        let segments: Vec<&str> = rest.split('.').filter(|s| !s.is_empty()).collect();
        Some((source, format!(".{}", segments.join("."))))
    }

    async fn run_filter(&self, input: Vec<u8>, filter: &str) -> Result<std::process::Output, FlowError> {
        let mut child = Command::new(&self.binary)
            .arg("-c")
            .arg(filter)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| FlowError::PathBackend {
                reason: format!("cannot start '{}': {}", self.binary, e),
            })?;

        let stdin = child.stdin.take();
        let run = async move {
            if let Some(mut stdin) = stdin {
                // jq may exit before consuming its input (bad filter)
                if let Err(e) = stdin.write_all(&input).await {
                    if e.kind() != std::io::ErrorKind::BrokenPipe {
                        return Err(e);
                    }
                }
            }
            child.wait_with_output().await
        };

        tokio::time::timeout(JQ_TIMEOUT, run)
            .await
            .map_err(|_| FlowError::PathBackend {
                reason: format!("'{}' timed out after {}s", self.binary, JQ_TIMEOUT.as_secs()),
            })?
            .map_err(|e| FlowError::PathBackend {
                reason: format!("'{}' failed: {}", self.binary, e),
            })
    }
}

#[async_trait]
impl PathBackend for JqBackend {
    fn name(&self) -> &'static str {
        "jq"
    }

    #[instrument(skip(self, result), fields(binary = %self.binary))]
    async fn evaluate(&self, result: &TaskResult, path: &str) -> Result<Option<Value>, FlowError> {
        let Some((source, filter)) = Self::split_path(path) else {
            return Ok(None);
        };
        let input = serde_json::to_vec(source.select(result))?;

        let output = self.run_filter(input, &filter).await?;
        if !output.status.success() {
            debug!(
                filter = %filter,
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "jq rejected the filter"
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let text = stdout.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str(text).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TaskResult {
        TaskResult::new(
            json!({"x-id": ["7"]}),
            json!({"a": {"b": [10, 20]}, "token": "abc"}),
        )
    }

    #[tokio::test]
    async fn builtin_resolves_paths() {
        let backend = BuiltinBackend;
        assert_eq!(
            backend.evaluate(&sample(), "body.a.b[1]").await.unwrap(),
            Some(json!(20))
        );
        assert_eq!(backend.evaluate(&sample(), "body.missing").await.unwrap(), None);
        assert_eq!(backend.name(), "builtin");
    }

    #[test]
    fn jq_filter_from_path() {
        let (source, filter) = JqBackend::split_path("body.a.b[1]").unwrap();
        assert_eq!(source, ResultSource::Body);
        assert_eq!(filter, ".a.b[1]");

        let (source, filter) = JqBackend::split_path("header").unwrap();
        assert_eq!(source, ResultSource::Header);
        assert_eq!(filter, ".");

        assert!(JqBackend::split_path("status.code").is_none());
    }

    #[test]
    fn jq_filter_drops_empty_segments() {
        let (source, filter) = JqBackend::split_path("body..a").unwrap();
        assert_eq!(source, ResultSource::Body);
        assert_eq!(filter, ".a");

        let (_, filter) = JqBackend::split_path("body.items[0]..id.").unwrap();
        assert_eq!(filter, ".items[0].id");

        let (_, filter) = JqBackend::split_path("header.").unwrap();
        assert_eq!(filter, ".");
    }

    #[tokio::test]
    async fn jq_missing_binary_is_an_error() {
        let backend = JqBackend::new("/definitely/not/a/jq-binary");
        let err = backend.evaluate(&sample(), "body.token").await.unwrap_err();
        assert!(matches!(err, FlowError::PathBackend { .. }));
    }

    #[tokio::test]
    async fn jq_unknown_source_is_undefined() {
        // Never spawns: the source is rejected first
        let backend = JqBackend::new("/definitely/not/a/jq-binary");
        assert_eq!(backend.evaluate(&sample(), "status.code").await.unwrap(), None);
    }
}
