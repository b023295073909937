//! Flow Runner - layer-by-layer execution with tokio
//!
//! Layers run strictly in order. Every task of a layer is spawned on a
//! `JoinSet` and the whole layer is joined before the next one starts, so a
//! task only ever sees exports written by earlier layers.
//!
//! A fatal error inside a layer does not cancel its siblings: the layer is
//! drained, then the error of the earliest-declared failing task is returned
//! and no further layer starts.

use std::collections::HashMap;
use std::sync::Arc;

use colored::Colorize;
use futures::future::try_join_all;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use crate::ast::{DisplaySpec, TaskDefinition};
use crate::binding::{interpolate_str, Environment};
use crate::dag::{plan, Layer};
use crate::error::FlowError;
use crate::store::{export_value, FlowVariables, TaskResult};

use super::backend::PathBackend;
use super::executor::TaskExecutor;

/// Summary of a finished run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Task ids of each executed layer, in order
    pub layers: Vec<Vec<String>>,
    /// Tasks whose request was sent
    pub executed: Vec<String>,
    /// Tasks skipped because of unresolved placeholders
    pub skipped: Vec<String>,
    /// Final flow variable table
    pub variables: FlowVariables,
    /// Result of the requested target task
    pub target_result: Option<TaskResult>,
}

impl RunReport {
    pub fn task_count(&self) -> usize {
        self.executed.len() + self.skipped.len()
    }
}

/// One task's contribution, applied at the layer barrier
struct TaskCompletion {
    task: Arc<TaskDefinition>,
    skipped: bool,
    result: TaskResult,
    exports: Vec<(String, Option<String>)>,
}

/// Drives a task universe from planning to the last layer
pub struct Runner {
    tasks: Vec<Arc<TaskDefinition>>,
    target: Option<String>,
    excludes: Vec<String>,
    executor: TaskExecutor,
    backend: Arc<dyn PathBackend>,
}

impl Runner {
    pub fn new(
        tasks: Vec<TaskDefinition>,
        executor: TaskExecutor,
        backend: Arc<dyn PathBackend>,
    ) -> Self {
        Self {
            tasks: tasks.into_iter().map(Arc::new).collect(),
            target: None,
            excludes: Vec::new(),
            executor,
            backend,
        }
    }

    /// Run only this task and its transitive dependencies
    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }

    /// Remove these ids from the universe before planning
    pub fn with_excludes(mut self, excludes: Vec<String>) -> Self {
        self.excludes = excludes;
        self
    }

    /// Layers this runner would execute
    pub fn plan(&self) -> Result<Vec<Layer>, FlowError> {
        plan(&self.tasks, self.target.as_deref(), &self.excludes)
    }

    /// Main execution loop
    #[instrument(skip(self), fields(tasks = self.tasks.len(), backend = self.backend.name()))]
    pub async fn run(&self) -> Result<RunReport, FlowError> {
        let layers = self.plan()?;
        info!(layers = layers.len(), "Starting flow");

        let mut variables = Arc::new(FlowVariables::new());
        let mut report = RunReport::default();

        for (index, layer) in layers.iter().enumerate() {
            info!(layer = index, tasks = layer.len(), "Executing layer");
            report
                .layers
                .push(layer.iter().map(|t| t.id.clone()).collect());

            let completions = self.run_layer(layer, &variables).await?;

            // Layer barrier: every sibling is done, the snapshot is unshared again
            let table = Arc::make_mut(&mut variables);
            for completion in completions {
                let TaskCompletion {
                    task,
                    skipped,
                    result,
                    exports,
                } = completion;

                if task.is_addressable() {
                    for (name, value) in exports {
                        if !table.insert(&task.id, &name, value) {
                            warn!(task = %task.id, export = %name, "Export already written, keeping first value");
                        }
                    }
                }

                if skipped {
                    report.skipped.push(task.id.clone());
                } else {
                    report.executed.push(task.id.clone());
                }

                if self.target.as_deref() == Some(task.id.as_str()) {
                    debug!(task = %task.id, result = %result.to_json(), "Target task result");
                    report.target_result = Some(result);
                }
            }
        }

        report.variables = Arc::try_unwrap(variables).unwrap_or_else(|shared| (*shared).clone());
        debug!(variables = %report.variables.to_json(), "Flow variables");
        info!(
            executed = report.executed.len(),
            skipped = report.skipped.len(),
            "Flow finished"
        );
        Ok(report)
    }

    /// Spawn every task of a layer and drain them all
    async fn run_layer(
        &self,
        layer: &Layer,
        variables: &Arc<FlowVariables>,
    ) -> Result<Vec<TaskCompletion>, FlowError> {
        let mut join_set = JoinSet::new();
        let mut positions = HashMap::with_capacity(layer.len());

        for (index, task) in layer.iter().enumerate() {
            let task = Arc::clone(task);
            let variables = Arc::clone(variables);
            let executor = self.executor.clone();
            let backend = Arc::clone(&self.backend);

            let handle = join_set.spawn(async move {
                (index, Self::execute_task(task, variables, executor, backend).await)
            });
            positions.insert(handle.id(), index);
        }

        // Slots keep declaration order regardless of completion order
        let mut slots: Vec<Option<Result<TaskCompletion, FlowError>>> =
            (0..layer.len()).map(|_| None).collect();

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    if let Err(e) = &outcome {
                        error!(task = %layer[index].id, error = %e, "Task failed");
                    }
                    slots[index] = Some(outcome);
                }
                Err(e) => {
                    error!(error = %e, "Task panicked");
                    if let Some(&index) = positions.get(&e.id()) {
                        slots[index] = Some(Err(FlowError::Execution {
                            reason: format!("task '{}' panicked: {}", layer[index].id, e),
                        }));
                    }
                }
            }
        }

        slots.into_iter().flatten().collect()
    }

    /// Execute one task, print its progress, evaluate its exports
    async fn execute_task(
        task: Arc<TaskDefinition>,
        variables: Arc<FlowVariables>,
        executor: TaskExecutor,
        backend: Arc<dyn PathBackend>,
    ) -> Result<TaskCompletion, FlowError> {
        let label = task.label().to_string();
        let start = display_message(&task, |d| d.start.as_deref(), &variables, executor.environment())
            .unwrap_or_else(|| "started".to_string());
        println!("{} : {}", label.cyan(), start);

        let outcome = executor.execute(&task, &variables).await?;
        let skipped = outcome.is_skipped();
        if skipped {
            println!("{} : {}", label.cyan(), "skipped (unresolved variables)".yellow());
        }
        let result = outcome.into_result();

        // Paths of one task are evaluated concurrently, printed in declaration order
        let conditions = try_join_all(task.display_conditions().map(|(name, path)| {
            let (backend, result) = (&backend, &result);
            async move { Ok::<_, FlowError>((name, backend.evaluate(result, path).await?)) }
        }))
        .await?;
        for (name, value) in conditions {
            println!("{} : {} = {}", label.cyan(), name, display_value(value.as_ref()));
        }

        let end = display_message(&task, |d| d.end.as_deref(), &variables, executor.environment())
            .unwrap_or_else(|| "finished".to_string());
        println!("{} : {}", label.cyan(), end.green());

        let exports = try_join_all(task.export.iter().map(|(name, path)| {
            let (backend, result, label) = (&backend, &result, label.as_str());
            async move {
                let resolved = backend.evaluate(result, path).await?;
                Ok::<_, FlowError>((name.clone(), export_value(label, name, resolved)?))
            }
        }))
        .await?;

        Ok(TaskCompletion {
            task,
            skipped,
            result,
            exports,
        })
    }
}

/// Interpolated start/end message, if declared
fn display_message(
    task: &TaskDefinition,
    pick: impl Fn(&DisplaySpec) -> Option<&str>,
    variables: &FlowVariables,
    environment: &Environment,
) -> Option<String> {
    let template = task.display.as_ref().and_then(pick)?;
    Some(interpolate_str(template, variables, environment))
}

/// Strings print bare, undefined prints as `undefined`, the rest as JSON
fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
