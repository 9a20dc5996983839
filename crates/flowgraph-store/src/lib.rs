//! PostgreSQL persistence for the execution store (C6), following the
//! same row-plus-blob split the engine's in-memory store models: scalar
//! fields in `execution_entity`, the `node_executions` trace in
//! `execution_data` as JSONB.

pub mod entities;
pub mod error;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use store::PostgresExecutionStore;
