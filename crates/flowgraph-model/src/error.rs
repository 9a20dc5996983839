//! Error types for the data model crate.

use thiserror::Error;

/// Errors raised while constructing or interpreting model values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown parameter type: {0}")]
    UnknownParameterType(String),

    #[error("unknown trigger type: {0}")]
    UnknownTriggerType(String),
}
