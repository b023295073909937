//! FlowVariables - exported values shared between layers
//!
//! Keys are `"<taskId>.<exportName>"`, values are strings or null. Entries are
//! written once, after the producing task completes, and never removed or
//! overwritten. The runner owns the table; tasks of a layer read a shared
//! snapshot of it.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::FlowError;
use crate::util::jsonpath::value_type;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowVariables {
    entries: BTreeMap<String, Option<String>>,
}

impl FlowVariables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table key for an export
    #[inline]
    pub fn key(task_id: &str, name: &str) -> String {
        format!("{}.{}", task_id, name)
    }

    /// Record an export. Returns `false` (and keeps the first value) if the
    /// key was already written.
    pub fn insert(&mut self, task_id: &str, name: &str, value: Option<String>) -> bool {
        use std::collections::btree_map::Entry;

        match self.entries.entry(Self::key(task_id, name)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(e) => {
                e.insert(value);
                true
            }
        }
    }

    /// String value for a key; `None` when absent or null
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(|v| v.as_deref())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Serialize to a JSON object for debugging
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|(k, v)| {
                let value = v.clone().map_or(Value::Null, Value::String);
                (k.clone(), value)
            })
            .collect();
        Value::Object(map)
    }
}

/// Check a resolved export value against the string-or-null rule
///
/// Undefined (`None`) is stored as null.
pub fn export_value(
    task_id: &str,
    name: &str,
    resolved: Option<Value>,
) -> Result<Option<String>, FlowError> {
    match resolved {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(FlowError::ExportType {
            task_id: task_id.to_string(),
            name: name.to_string(),
            value_type: value_type(&other).to_string(),
        }),
    }
}
