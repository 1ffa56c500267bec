//! Node-level error type.

use thiserror::Error;

/// Errors returned by a node's `execute` method.
///
/// The engine uses the variant to decide retry behaviour before the error
/// is normalized into an `error` edge:
/// - `Retryable` — the node is re-invoked with exponential back-off.
/// - `Fatal`     — no retry is attempted, the error edge fires immediately.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    /// Transient failure; the engine should re-try the call.
    #[error("retryable node error: {0}")]
    Retryable(String),

    /// Permanent failure; no retry should be attempted.
    #[error("fatal node error: {0}")]
    Fatal(String),
}

impl NodeError {
    pub fn message(&self) -> &str {
        match self {
            NodeError::Retryable(m) | NodeError::Fatal(m) => m,
        }
    }
}

/// Errors raised by the [`crate::registry::Registry`] itself, as opposed to
/// errors raised by a node instance during execution.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node type '{id}' is already registered at version '{existing}' (tried to register '{attempted}')")]
    VersionCollision {
        id: String,
        existing: String,
        attempted: String,
    },
}
