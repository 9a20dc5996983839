//! Error types for the execution engine.

use thiserror::Error;

/// Errors raised by the Object Store (C1) and the Parameter System (C2).
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("object not found: {0}")]
    NotFound(String),
}

/// The error taxonomy that crosses the runtime façade boundary (§7): a
/// small, closed set of categories a host is expected to branch on, with
/// the human-readable detail living in `WorkflowExecution.error` instead
/// of in this type's payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("insufficient credits")]
    InsufficientCredits,

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("node execution failed: {0}")]
    NodeExecutionFailed(String),

    #[error("upstream '{0}' failed")]
    UpstreamFailed(String),

    #[error("timeout")]
    Timeout,

    #[error("aborted")]
    Aborted,
}
