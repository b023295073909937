//! Error types with fix suggestions
//!
//! Every fatal condition of a run is a [`FlowError`]. A task skipped because of
//! unresolved placeholders is not an error: see
//! [`TaskOutcome::Skipped`](crate::runtime::TaskOutcome).

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

pub type Result<T, E = FlowError> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Loading (FLOW-010 to FLOW-012)
    // ─────────────────────────────────────────────────────────────
    #[error("FLOW-010: Cannot load definition '{path}': {reason}")]
    DefinitionLoad { path: String, reason: String },

    #[error("FLOW-011: Invalid definition: {reason}")]
    InvalidDefinition { reason: String },

    #[error("FLOW-012: Invalid path expression '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Grouping (FLOW-020 to FLOW-021)
    // ─────────────────────────────────────────────────────────────
    #[error("FLOW-020: Unresolvable dependencies (missing task or cycle): {details}")]
    GraphResolution { details: String },

    #[error("FLOW-021: Task '{task_id}' not found")]
    UnknownTask { task_id: String },

    // ─────────────────────────────────────────────────────────────
    // Execution (FLOW-030 to FLOW-033)
    // ─────────────────────────────────────────────────────────────
    #[error("FLOW-030: Export '{task_id}.{name}' must be a string or null, got {value_type}")]
    ExportType {
        task_id: String,
        name: String,
        value_type: String,
    },

    #[error("FLOW-031: HTTP request for task '{task_id}' failed: {reason}")]
    Transport { task_id: String, reason: String },

    #[error("FLOW-032: Path backend failed: {reason}")]
    PathBackend { reason: String },

    #[error("FLOW-033: Task execution aborted: {reason}")]
    Execution { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration (FLOW-040)
    // ─────────────────────────────────────────────────────────────
    #[error("FLOW-040: Invalid configuration: {reason}")]
    Config { reason: String },
}

impl FlowError {
    /// True for the errors raised while turning the task universe into layers
    pub fn is_graph_error(&self) -> bool {
        matches!(
            self,
            FlowError::GraphResolution { .. } | FlowError::UnknownTask { .. }
        )
    }

    /// True for the errors raised before any task runs
    pub fn is_definition_error(&self) -> bool {
        matches!(
            self,
            FlowError::DefinitionLoad { .. }
                | FlowError::InvalidDefinition { .. }
                | FlowError::InvalidPath { .. }
        )
    }
}

impl FixSuggestion for FlowError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            FlowError::Io(_) => Some("Check file path and permissions"),
            FlowError::Json(_) => Some("Check JSON syntax of the definition file"),
            FlowError::DefinitionLoad { .. } => {
                Some("The definition must be a JSON array of task objects")
            }
            FlowError::InvalidDefinition { .. } => Some("Give every task a unique id"),
            FlowError::InvalidPath { .. } => {
                Some("Use header.<field> or body.<field>.<list>[0] style paths")
            }
            FlowError::GraphResolution { .. } => Some(
                "Check that every dependency exists, is not excluded, and no tasks depend on each other in a loop",
            ),
            FlowError::UnknownTask { .. } => {
                Some("Verify the task id exists in the definition and is not excluded")
            }
            FlowError::ExportType { .. } => {
                Some("Point the export at a string field, or use body.<field> of a string value")
            }
            FlowError::Transport { .. } => Some("Check the URL, network access and proxy settings"),
            FlowError::PathBackend { .. } => {
                Some("Install jq or set JQ_PATH, or use --path-backend builtin")
            }
            FlowError::Execution { .. } => Some("Re-run with --debug to see which task aborted"),
            FlowError::Config { .. } => Some("Check --proxy, --timeout and related flags"),
        }
    }
}
