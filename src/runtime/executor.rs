//! Task Executor - one HTTP call per task
//!
//! Interpolates the task's url, headers and body, skips the task if any
//! placeholder is left, otherwise sends the request and normalizes the
//! response into a [`TaskResult`].
//!
//! Request body policy (method first):
//! - GET never carries a body
//! - POST + `application/x-www-form-urlencoded` → form-encoded body
//! - POST + JSON media type, or no content-type → JSON body
//! - POST + any other content-type → no body
//!
//! Content-type is looked up case-insensitively and compared without
//! parameters (`application/json; charset=utf-8` is JSON).

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::ast::{Fields, Method, TaskDefinition};
use crate::binding::{interpolate, interpolate_str, unresolved_placeholders, Environment};
use crate::error::FlowError;
use crate::store::{FlowVariables, TaskResult};

const CONTENT_TYPE: &str = "content-type";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// What happened to one task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The request was sent and a response normalized
    Completed(TaskResult),
    /// Placeholders were left after interpolation; nothing was sent
    Skipped { placeholders: Vec<String> },
}

impl TaskOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, TaskOutcome::Skipped { .. })
    }

    /// The task's result; a skipped task yields the empty result
    pub fn into_result(self) -> TaskResult {
        match self {
            TaskOutcome::Completed(result) => result,
            TaskOutcome::Skipped { .. } => TaskResult::empty(),
        }
    }
}

/// A task's request after interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Fields,
    pub body: Fields,
}

impl PreparedRequest {
    /// Placeholders still present in url, headers or body
    pub fn unresolved(&self) -> Vec<String> {
        let mut found = unresolved_placeholders(&self.url);
        found.extend(unresolved_placeholders(&Value::Object(self.headers.clone()).to_string()));
        found.extend(unresolved_placeholders(&Value::Object(self.body.clone()).to_string()));
        found
    }

    /// Media type of the content-type header, lower-cased, without parameters
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(CONTENT_TYPE))
            .map(|(_, value)| {
                let raw = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
            })
    }

    pub fn encoding(&self) -> BodyEncoding {
        if self.method == Method::Get {
            return BodyEncoding::None;
        }
        match self.content_type() {
            None => BodyEncoding::Json,
            Some(media) if media == FORM_URLENCODED => BodyEncoding::Form,
            Some(media) if media == "application/json" || media.ends_with("+json") => {
                BodyEncoding::Json
            }
            Some(media) => BodyEncoding::Unsupported(media),
        }
    }

    /// `application/x-www-form-urlencoded` rendering of the body
    pub fn form_body(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.body {
            serializer.append_pair(key, &field_text(value));
        }
        serializer.finish()
    }
}

/// How a request body is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyEncoding {
    None,
    Json,
    Form,
    /// Content-type we cannot encode for; the body is dropped
    Unsupported(String),
}

/// Sends task requests over one shared HTTP client
#[derive(Clone)]
pub struct TaskExecutor {
    /// Shared HTTP client (connection pooling)
    http_client: reqwest::Client,
    /// Environment snapshot for `${ENV.*}` placeholders
    environment: Arc<Environment>,
}

impl TaskExecutor {
    pub fn new(http_client: reqwest::Client, environment: Arc<Environment>) -> Self {
        Self {
            http_client,
            environment,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Interpolate url, headers and body (flow pass, then environment pass)
    pub fn prepare(&self, task: &TaskDefinition, vars: &FlowVariables) -> PreparedRequest {
        PreparedRequest {
            method: task.method,
            url: interpolate_str(&task.url, vars, &self.environment),
            headers: interpolate(&task.headers, vars, &self.environment),
            body: interpolate(&task.body, vars, &self.environment),
        }
    }

    /// Run one task against the flow variables written by earlier layers
    #[instrument(skip_all, fields(task = %task.label(), method = %task.method))]
    pub async fn execute(
        &self,
        task: &TaskDefinition,
        vars: &FlowVariables,
    ) -> Result<TaskOutcome, FlowError> {
        let prepared = self.prepare(task, vars);

        let placeholders = prepared.unresolved();
        if !placeholders.is_empty() {
            info!(?placeholders, "Unresolved variables, skipping task");
            debug!(
                url = %prepared.url,
                headers = %serde_json::Value::Object(prepared.headers.clone()),
                body = %serde_json::Value::Object(prepared.body.clone()),
                "Skipped request"
            );
            return Ok(TaskOutcome::Skipped { placeholders });
        }

        self.send(task, &prepared).await.map(TaskOutcome::Completed)
    }

    async fn send(
        &self,
        task: &TaskDefinition,
        prepared: &PreparedRequest,
    ) -> Result<TaskResult, FlowError> {
        let transport = |reason: String| FlowError::Transport {
            task_id: task.label().to_string(),
            reason,
        };

        let mut request = match prepared.method {
            Method::Get => self.http_client.get(&prepared.url),
            Method::Post => self.http_client.post(&prepared.url),
        };

        for (name, value) in &prepared.headers {
            request = request.header(name.as_str(), field_text(value));
        }

        request = match prepared.encoding() {
            BodyEncoding::None => request,
            BodyEncoding::Json => request.json(&Value::Object(prepared.body.clone())),
            BodyEncoding::Form => request.body(prepared.form_body()),
            BodyEncoding::Unsupported(media) => {
                warn!(content_type = %media, "Unsupported content-type, sending without body");
                request
            }
        };

        debug!(
            url = %prepared.url,
            headers = %serde_json::Value::Object(prepared.headers.clone()),
            body = %serde_json::Value::Object(prepared.body.clone()),
            "Sending request"
        );

        let response = request
            .send()
            .await
            .map_err(|e| transport(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success response status");
        }

        let headers = normalize_headers(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| transport(format!("failed to read response: {}", e)))?;

        let result = TaskResult::from_response_text(headers, text);
        debug!(status = status.as_u16(), response = %result.to_json(), "Response received");
        Ok(result)
    }
}

/// Header and form values: strings as-is, anything else as JSON text
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Header name → array of every value received under that name
pub fn normalize_headers(headers: &HeaderMap) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        let entry = map
            .entry(name.as_str().to_ascii_lowercase())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(values) = entry {
            values.push(Value::String(
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            ));
        }
    }
    Value::Object(map)
}
