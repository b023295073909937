//! TaskResult - normalized response of one task
//!
//! `headers` is an object mapping lower-case header name to an array of
//! string values. `body` is the parsed JSON response, or `{"content": <raw>}`
//! when the response text is not JSON. Path expressions rely on exactly this
//! shape and nothing more.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub headers: Value,
    pub body: Value,
}

impl TaskResult {
    pub fn new(headers: Value, body: Value) -> Self {
        Self { headers, body }
    }

    /// `{}` headers and `{}` body, the result of a skipped task
    pub fn empty() -> Self {
        Self {
            headers: Value::Object(Map::new()),
            body: Value::Object(Map::new()),
        }
    }

    /// Parse the response text as JSON, wrapping it as `{content}` otherwise
    pub fn from_response_text(headers: Value, text: String) -> Self {
        let body = match serde_json::from_str::<Value>(&text) {
            Ok(value) => value,
            Err(_) => json!({ "content": text }),
        };
        Self { headers, body }
    }

    /// Both halves as one JSON document (debug output)
    pub fn to_json(&self) -> Value {
        json!({ "header": self.headers, "body": self.body })
    }
}

impl Default for TaskResult {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_text_is_parsed() {
        let r = TaskResult::from_response_text(json!({}), r#"{"token":"abc"}"#.to_string());
        assert_eq!(r.body, json!({"token": "abc"}));
    }

    #[test]
    fn json_scalar_is_parsed() {
        let r = TaskResult::from_response_text(json!({}), "42".to_string());
        assert_eq!(r.body, json!(42));
    }

    #[test]
    fn non_json_text_is_wrapped() {
        let r = TaskResult::from_response_text(json!({}), "<html>hi</html>".to_string());
        assert_eq!(r.body, json!({"content": "<html>hi</html>"}));
    }

    #[test]
    fn empty_text_is_wrapped() {
        let r = TaskResult::from_response_text(json!({}), String::new());
        assert_eq!(r.body, json!({"content": ""}));
    }

    #[test]
    fn empty_result_shape() {
        let r = TaskResult::empty();
        assert_eq!(r.headers, json!({}));
        assert_eq!(r.body, json!({}));
        assert_eq!(r.to_json(), json!({"header": {}, "body": {}}));
    }
}
