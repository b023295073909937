//! httpflow - dependency-ordered HTTP task flows
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       JSON/YAML → Rust types (TaskDefinition, Method)  │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  runtime/   Layer execution (Runner, TaskExecutor)           │
//! │  dag/       Layered topological sort, target closure         │
//! │  binding/   ${ENV.NAME} and ${taskId.name} substitution      │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  store/     FlowVariables, TaskResult                        │
//! │  util/      Path expressions, constants                      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | Definition loading, schema check → `TaskDefinition` |
//! | [`dag`] | Exclusions, target closure, grouping into layers |
//! | [`binding`] | Placeholder substitution and unresolved detection |
//! | [`runtime`] | HTTP execution, path backends, layer orchestration |
//! | [`store`] | Append-only export table, normalized responses |
//! | [`util`] | `header.x` / `body.a.b[0]` path grammar |
//! | [`config`] | Transport and path-backend settings |
//! | [`error`] | Error types with fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - definition file → Rust types
// ═══════════════════════════════════════════════════════════════
pub mod ast;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - Execution logic
// ═══════════════════════════════════════════════════════════════
pub mod binding;
pub mod dag;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - State and utilities
// ═══════════════════════════════════════════════════════════════
pub mod store;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, FlowError};

// Config types
pub use config::{PathBackendKind, RunConfig};

// AST types
pub use ast::{load_definition, DisplaySpec, Method, TaskDefinition};

// Binding types
pub use binding::Environment;

// DAG types
pub use dag::{group, parse_exclusions, plan, Layer};

// Runtime types
pub use runtime::{BuiltinBackend, JqBackend, PathBackend, RunReport, Runner, TaskExecutor, TaskOutcome};

// Store types
pub use store::{FlowVariables, TaskResult};
