//! TaskExecutor tests against a wiremock server
//!
//! Covers request construction (methods, body encodings, headers) and
//! response normalization (JSON, plain text, multi-valued headers, non-2xx).

use std::sync::Arc;

use httpflow::ast::{Method, TaskDefinition};
use httpflow::runtime::{TaskExecutor, TaskOutcome};
use httpflow::{Environment, FlowError, FlowVariables, RunConfig, TaskResult};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// HELPERS
// =============================================================================

fn create_test_executor(env: Environment) -> TaskExecutor {
    let client = RunConfig::default().http_client().unwrap();
    TaskExecutor::new(client, Arc::new(env))
}

fn task(method: Method, url: String, headers: Value, body: Value) -> TaskDefinition {
    TaskDefinition {
        id: "t".to_string(),
        method,
        url,
        headers: headers.as_object().cloned().unwrap(),
        body: body.as_object().cloned().unwrap(),
        ..Default::default()
    }
}

async fn completed(executor: &TaskExecutor, task: &TaskDefinition) -> TaskResult {
    match executor.execute(task, &FlowVariables::new()).await {
        Ok(TaskOutcome::Completed(result)) => result,
        other => panic!("expected a completed task, got {other:?}"),
    }
}

// =============================================================================
// GET
// =============================================================================

#[tokio::test]
async fn test_get_json_response() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok", "count": 42})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(
        Method::Get,
        format!("{}/api/data", mock_server.uri()),
        json!({}),
        json!({"ignored": "for GET"}),
    );

    let result = completed(&executor, &task).await;
    assert_eq!(result.body, json!({"status": "ok", "count": 42}));

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty(), "GET must not carry a body");
}

#[tokio::test]
async fn test_get_plain_text_is_wrapped() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Hello, World!"))
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(Method::Get, format!("{}/hello", mock_server.uri()), json!({}), json!({}));

    let result = completed(&executor, &task).await;
    assert_eq!(result.body, json!({"content": "Hello, World!"}));
}

#[tokio::test]
async fn test_response_headers_are_lowercased_arrays() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Token", "t1")
                .append_header("Set-Cookie", "a=1")
                .append_header("Set-Cookie", "b=2")
                .set_body_json(json!({})),
        )
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(Method::Get, mock_server.uri(), json!({}), json!({}));

    let result = completed(&executor, &task).await;
    assert_eq!(result.headers["x-token"], json!(["t1"]));
    assert_eq!(result.headers["set-cookie"], json!(["a=1", "b=2"]));
}

#[tokio::test]
async fn test_request_headers_are_interpolated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer s3cret"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let env = Environment::new().with("API_TOKEN", "s3cret").with("PAGE", "2");
    let executor = create_test_executor(env);
    let task = task(
        Method::Get,
        format!("{}/items?page=${{ENV.PAGE}}", mock_server.uri()),
        json!({"Authorization": "Bearer ${ENV.API_TOKEN}"}),
        json!({}),
    );

    let result = completed(&executor, &task).await;
    assert_eq!(result.body["ok"], json!(true));
}

// =============================================================================
// POST
// =============================================================================

#[tokio::test]
async fn test_post_json_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "test", "value": 123})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "abc-123"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(
        Method::Post,
        format!("{}/api/submit", mock_server.uri()),
        json!({"Content-Type": "application/json"}),
        json!({"name": "test", "value": 123}),
    );

    let result = completed(&executor, &task).await;
    assert_eq!(result.body["id"], json!("abc-123"));
}

#[tokio::test]
async fn test_post_without_content_type_defaults_to_json() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"q": "rust"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(Method::Post, mock_server.uri(), json!({}), json!({"q": "rust"}));

    let result = completed(&executor, &task).await;
    assert_eq!(result.body["hits"], json!(1));
}

#[tokio::test]
async fn test_post_form_urlencoded_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("user=neo"))
        .and(body_string_contains("pass=p+w"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "abc"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let env = Environment::new().with("USER", "neo");
    let executor = create_test_executor(env);
    let task = task(
        Method::Post,
        format!("{}/login", mock_server.uri()),
        json!({"content-type": "application/x-www-form-urlencoded"}),
        json!({"user": "${ENV.USER}", "pass": "p w"}),
    );

    let result = completed(&executor, &task).await;
    assert_eq!(result.body["token"], json!("abc"));
}

#[tokio::test]
async fn test_post_unsupported_content_type_sends_no_body() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(
        Method::Post,
        mock_server.uri(),
        json!({"content-type": "text/plain"}),
        json!({"dropped": "yes"}),
    );

    completed(&executor, &task).await;
    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].body.is_empty());
}

// =============================================================================
// STATUS AND TRANSPORT
// =============================================================================

#[tokio::test]
async fn test_non_success_status_is_not_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(Method::Get, mock_server.uri(), json!({}), json!({}));

    let result = completed(&executor, &task).await;
    assert_eq!(result.body["error"], json!("boom"));
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let executor = create_test_executor(Environment::new());
    // Port 1 is never served in the test environment
    let task = task(Method::Get, "http://127.0.0.1:1/".to_string(), json!({}), json!({}));

    let err = executor
        .execute(&task, &FlowVariables::new())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowError::Transport { ref task_id, .. } if task_id == "t"));
}

#[tokio::test]
async fn test_unresolved_body_skips_without_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let executor = create_test_executor(Environment::new());
    let task = task(
        Method::Post,
        mock_server.uri(),
        json!({}),
        json!({"key": "${ENV.MISSING_VAR}"}),
    );

    let outcome = executor.execute(&task, &FlowVariables::new()).await.unwrap();
    assert_eq!(
        outcome,
        TaskOutcome::Skipped {
            placeholders: vec!["${ENV.MISSING_VAR}".to_string()]
        }
    );
}
