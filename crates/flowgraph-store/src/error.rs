//! Store error types.

use flowgraph_engine::ExecutionStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("execution not found")]
    NotFound,

    #[error("connection error: {0}")]
    ConnectionError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("migration error: {0}")]
    MigrationError(String),

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for ExecutionStoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ExecutionStoreError::NotFound(String::new()),
            other => ExecutionStoreError::Unavailable(other.to_string()),
        }
    }
}
