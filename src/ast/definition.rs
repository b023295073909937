//! Definition loading
//!
//! Read → parse (JSON, or YAML by extension) → schema check → deserialize →
//! post-load checks (unique ids, well-formed paths). Any failure here aborts
//! the run before a single task is grouped.

use std::collections::HashSet;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::binding::is_referenceable_name;
use crate::error::FlowError;
use crate::util::jsonpath;

use super::schema::DefinitionSchemaValidator;
use super::task::TaskDefinition;

/// On-disk format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Json,
    Yaml,
}

impl DefinitionFormat {
    /// `.yaml` / `.yml` are YAML, everything else is JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                DefinitionFormat::Yaml
            }
            _ => DefinitionFormat::Json,
        }
    }
}

/// Read and validate a definition file
pub async fn load_definition(path: impl AsRef<Path>) -> Result<Vec<TaskDefinition>, FlowError> {
    let path = path.as_ref();
    let origin = path.display().to_string();

    // Read (async to not block runtime)
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FlowError::DefinitionLoad {
            path: origin.clone(),
            reason: e.to_string(),
        })?;

    let tasks = parse_definition(&content, DefinitionFormat::from_path(path), &origin)?;
    debug!(path = %origin, tasks = tasks.len(), "Definition loaded");
    Ok(tasks)
}

/// Parse and validate definition text; `origin` names the source in errors
pub fn parse_definition(
    content: &str,
    format: DefinitionFormat,
    origin: &str,
) -> Result<Vec<TaskDefinition>, FlowError> {
    let load_error = |reason: String| FlowError::DefinitionLoad {
        path: origin.to_string(),
        reason,
    };

    let value: Value = match format {
        DefinitionFormat::Json => serde_json::from_str(content).map_err(|e| load_error(e.to_string()))?,
        DefinitionFormat::Yaml => serde_yaml::from_str(content).map_err(|e| load_error(e.to_string()))?,
    };

    let violations = DefinitionSchemaValidator::new()?.violations(&value);
    if !violations.is_empty() {
        return Err(load_error(violations.join("; ")));
    }

    let tasks: Vec<TaskDefinition> =
        serde_json::from_value(value).map_err(|e| load_error(e.to_string()))?;

    check_unique_ids(&tasks)?;
    check_paths(&tasks)?;
    warn_unreferenceable(&tasks);
    Ok(tasks)
}

fn check_unique_ids(tasks: &[TaskDefinition]) -> Result<(), FlowError> {
    let mut seen = HashSet::new();
    for task in tasks.iter().filter(|t| t.is_addressable()) {
        if !seen.insert(task.id.as_str()) {
            return Err(FlowError::InvalidDefinition {
                reason: format!("duplicate task id '{}'", task.id),
            });
        }
    }
    Ok(())
}

fn check_paths(tasks: &[TaskDefinition]) -> Result<(), FlowError> {
    for task in tasks {
        for path in task.declared_paths() {
            jsonpath::parse(path)?;
        }
    }
    Ok(())
}

/// Exports of these tasks are stored but no placeholder can reach them
fn warn_unreferenceable(tasks: &[TaskDefinition]) {
    for task in tasks.iter().filter(|t| !t.export.is_empty()) {
        if !is_referenceable_name(&task.id) {
            warn!(task = %task.label(), "Task id cannot be used in ${{id.name}} placeholders");
        }
        for name in task.export.keys().filter(|n| !is_referenceable_name(n)) {
            warn!(task = %task.label(), export = %name, "Export name cannot be used in placeholders");
        }
    }
}
