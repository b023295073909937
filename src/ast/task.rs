//! Task definition types
//!
//! A definition file is a JSON array of [`TaskDefinition`] objects:
//!
//! ```json
//! [
//!   {
//!     "id": "login",
//!     "method": "POST",
//!     "url": "https://api.example.com/login",
//!     "headers": { "content-type": "application/json" },
//!     "body": { "user": "${ENV.API_USER}" },
//!     "export": { "token": "body.data.token" },
//!     "display": { "start": "logging in", "conditions": { "status": "body.status" } }
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Flat template mapping used for headers and body
pub type Fields = Map<String, Value>;

/// HTTP method of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress output declared by a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplaySpec {
    /// Message printed when the task starts (template)
    #[serde(default)]
    pub start: Option<String>,
    /// Message printed when the task ends (template)
    #[serde(default)]
    pub end: Option<String>,
    /// label -> path expression, printed after the task completes
    #[serde(default)]
    pub conditions: BTreeMap<String, String>,
}

/// One declared HTTP task
///
/// Immutable after loading. A task with an empty `id` is never excluded by
/// exclusion filters and cannot be addressed as a dependency or target.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub method: Method,
    pub url: String,
    #[serde(default)]
    pub headers: Fields,
    #[serde(default)]
    pub body: Fields,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// exported name -> path expression
    #[serde(default)]
    pub export: BTreeMap<String, String>,
    #[serde(default)]
    pub display: Option<DisplaySpec>,
}

impl TaskDefinition {
    /// Whether the task can be targeted, excluded or depended upon
    #[inline]
    pub fn is_addressable(&self) -> bool {
        !self.id.is_empty()
    }

    /// Id for progress output (`<unnamed>` when empty)
    pub fn label(&self) -> &str {
        if self.id.is_empty() {
            "<unnamed>"
        } else {
            &self.id
        }
    }

    pub fn display_conditions(&self) -> impl Iterator<Item = (&String, &String)> {
        self.display.iter().flat_map(|d| d.conditions.iter())
    }

    /// Every path expression the task declares (exports first, then conditions)
    pub fn declared_paths(&self) -> impl Iterator<Item = &str> {
        self.export
            .values()
            .chain(self.display_conditions().map(|(_, p)| p))
            .map(String::as_str)
    }
}
