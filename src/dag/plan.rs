//! Working-set selection before grouping
//!
//! 1. Exclusions remove tasks from the universe entirely (unnamed tasks are
//!    never excluded). A task still depending on an excluded one then fails
//!    grouping as a missing dependency.
//! 2. With a target, only the target and its transitive dependencies are kept.
//! 3. The result is grouped into layers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::ast::TaskDefinition;
use crate::error::FlowError;

use super::grouper::{group, Layer};

/// Split a comma-separated exclusion list (`-e a,b`), dropping blanks
pub fn parse_exclusions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Remove every task whose id is listed in `excludes`
pub fn apply_exclusions(
    tasks: &[Arc<TaskDefinition>],
    excludes: &[String],
) -> Vec<Arc<TaskDefinition>> {
    let excluded: HashSet<&str> = excludes.iter().map(String::as_str).collect();
    tasks
        .iter()
        .filter(|t| !t.is_addressable() || !excluded.contains(t.id.as_str()))
        .cloned()
        .collect()
}

/// The target plus all of its transitive dependencies
///
/// Depth-first from the target. Tasks come back in universe order. An id
/// missing from the universe, target or dependency, is a lookup failure.
pub fn target_closure(
    tasks: &[Arc<TaskDefinition>],
    target: &str,
) -> Result<Vec<Arc<TaskDefinition>>, FlowError> {
    let by_id: HashMap<&str, &Arc<TaskDefinition>> = tasks
        .iter()
        .filter(|t| t.is_addressable())
        .map(|t| (t.id.as_str(), t))
        .collect();

    if !by_id.contains_key(target) {
        return Err(FlowError::UnknownTask {
            task_id: target.to_string(),
        });
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = vec![target];

    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        let task = by_id.get(current).ok_or_else(|| FlowError::GraphResolution {
            details: format!("'{}' is required by target '{}' but does not exist", current, target),
        })?;
        stack.extend(task.dependencies.iter().map(String::as_str));
    }

    Ok(tasks
        .iter()
        .filter(|t| t.is_addressable() && visited.contains(t.id.as_str()))
        .cloned()
        .collect())
}

/// Exclusions → optional target closure → layers
#[instrument(skip(tasks), fields(universe = tasks.len()))]
pub fn plan(
    tasks: &[Arc<TaskDefinition>],
    target: Option<&str>,
    excludes: &[String],
) -> Result<Vec<Layer>, FlowError> {
    let reserved = apply_exclusions(tasks, excludes);
    debug!(remaining = reserved.len(), "Exclusions applied");

    let working = match target {
        Some(target) => target_closure(&reserved, target)?,
        None => reserved,
    };

    group(&working)
}
