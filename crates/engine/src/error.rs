//! Error taxonomy for the engine crate: definition (parse/validate) errors
//! are a distinct type from runtime engine errors, matching §7's split
//! between errors that prevent execution from ever starting and errors
//! that abort an execution already in flight.

use thiserror::Error;

/// Errors produced while parsing and validating a
/// [`crate::model::WorkflowDefinition`] (C2). Fatal at validate-time — no
/// execution begins.
#[derive(Debug, Error, Clone)]
pub enum ValidationError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("workflow 'id' must match [A-Za-z0-9_-]+, got '{0}'")]
    InvalidId(String),

    #[error("workflow 'version' must be X.Y.Z semver, got '{0}'")]
    InvalidVersion(String),

    #[error("'workflow' step list must not be empty")]
    EmptyWorkflow,

    #[error("step at {path} has an unrecognised shape")]
    UnrecognisedStep { path: String },

    #[error("unknown node type '{node_type}' at {path}{}", suggestion_suffix(suggestions))]
    UnknownNodeType { node_type: String, path: String, suggestions: Vec<String> },

    #[error("invalid state path '${path}': segments must match identifier(.identifier)*")]
    InvalidStatePath { path: String },

    #[error("edge '{edge}' at {path} targets unknown step '{target}'")]
    UnresolvedEdgeTarget { path: String, edge: String, target: String },
}

fn suggestion_suffix(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(" (did you mean: {}?)", suggestions.join(", "))
    }
}

/// A non-fatal observation the validator surfaces alongside a successful
/// parse (C2 item 6: depth, missing `error?` edges, AI nodes without
/// downstream validation, …).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

/// Errors produced by the execution engine (C4) once a plan is running.
/// Always terminate the execution with status `failed` — unlike node
/// errors, which are normalized into an `error` edge and may be routed or
/// fallen through (§8 scenario: "error fall-through").
#[derive(Debug, Error)]
pub enum EngineError {
    /// Loop body failed to terminate within the configured cap.
    #[error("loop node '{node_id}' exceeded its iteration cap ({cap})")]
    LoopCapExceeded { node_id: String, cap: u32 },

    /// An edge pointed at a step index that doesn't exist in the plan —
    /// only reachable if the registry was mutated after validation, since
    /// the parser resolves every edge target up front.
    #[error("unresolved edge target at runtime: step index {0}")]
    UnresolvedEdgeTarget(usize),

    /// The registry no longer has an implementation for a node type that
    /// validated successfully (registry mutated after validation).
    #[error("no implementation registered for node type '{0}' (node '{1}')")]
    UnknownNodeAtRuntime(String, String),

    /// The execution was cancelled cooperatively between nodes.
    #[error("execution cancelled")]
    Cancelled,

    /// The execution exceeded its deadline.
    #[error("execution timed out")]
    TimedOut,

    /// Persistence error surfaced from the `db` crate's `ExecutionStore`.
    #[error("execution store error: {0}")]
    Store(String),
}

/// Errors from the trigger layer (C5): a definition failed to parse before
/// an invocation could even begin.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
