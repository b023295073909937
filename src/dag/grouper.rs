//! Layered topological sort (Kahn)
//!
//! Repeatedly takes every task whose dependency set is empty as the next
//! layer, then removes those ids from the remaining sets. If tasks remain but
//! none is ready, a dependency is either missing from the working set or part
//! of a cycle; both are reported as one error listing the stalled tasks.
//!
//! Nodes are keyed by position, not id, so tasks with an empty id stay
//! distinct. Empty ids never satisfy a dependency.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use crate::ast::TaskDefinition;
use crate::error::FlowError;

/// Tasks that may run concurrently once all earlier layers are done
pub type Layer = Vec<Arc<TaskDefinition>>;

/// Working dependency state of one task during grouping
struct Node<'a> {
    index: usize,
    waiting_on: BTreeSet<&'a str>,
}

/// Partition `tasks` into layers
///
/// Within a layer, tasks keep their definition order.
pub fn group(tasks: &[Arc<TaskDefinition>]) -> Result<Vec<Layer>, FlowError> {
    let mut pending: Vec<Node<'_>> = tasks
        .iter()
        .enumerate()
        .map(|(index, task)| Node {
            index,
            waiting_on: task.dependencies.iter().map(String::as_str).collect(),
        })
        .collect();

    let mut layers: Vec<Layer> = Vec::new();

    while !pending.is_empty() {
        let (ready, blocked): (Vec<Node<'_>>, Vec<Node<'_>>) =
            pending.into_iter().partition(|n| n.waiting_on.is_empty());

        if ready.is_empty() {
            return Err(FlowError::GraphResolution {
                details: describe_stall(tasks, &blocked),
            });
        }

        let layer: Layer = ready
            .iter()
            .map(|n| Arc::clone(&tasks[n.index]))
            .collect();

        pending = blocked;
        for node in &mut pending {
            for task in layer.iter().filter(|t| t.is_addressable()) {
                node.waiting_on.remove(task.id.as_str());
            }
        }

        debug!(
            layer = layers.len(),
            tasks = ?layer.iter().map(|t| t.label()).collect::<Vec<_>>(),
            "Layer grouped"
        );
        layers.push(layer);
    }

    Ok(layers)
}

/// "c waits on [d]; e waits on [e]"
fn describe_stall(tasks: &[Arc<TaskDefinition>], blocked: &[Node<'_>]) -> String {
    blocked
        .iter()
        .map(|n| {
            let deps: Vec<&str> = n.waiting_on.iter().copied().collect();
            format!("{} waits on [{}]", tasks[n.index].label(), deps.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
