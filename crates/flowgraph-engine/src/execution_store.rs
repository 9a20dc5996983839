//! Execution Store (C6): persists the final `WorkflowExecution` record, per
//! §4.6. This module defines the trait; `flowgraph-store` provides a
//! Postgres-backed implementation and this crate provides an in-memory one
//! for tests and for hosts without a database.

use async_trait::async_trait;
use dashmap::DashMap;
use flowgraph_model::WorkflowExecution;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ExecutionStoreError {
    #[error("execution store unavailable: {0}")]
    Unavailable(String),

    #[error("execution not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// Writes the row and the `nodeExecutions` blob. Implementations must
    /// make this atomic from the caller's perspective: row first, blob
    /// next; on blob failure the row update is reverted or the record is
    /// marked errored.
    async fn save(&self, execution: &WorkflowExecution) -> Result<(), ExecutionStoreError>;

    /// Fetches a record filtered by the owning organization.
    async fn get(&self, id: &str, organization_id: &str) -> Result<WorkflowExecution, ExecutionStoreError>;
}

/// In-memory execution store, keyed by execution id.
#[derive(Default)]
pub struct InMemoryExecutionStore {
    rows: DashMap<String, WorkflowExecution>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn save(&self, execution: &WorkflowExecution) -> Result<(), ExecutionStoreError> {
        self.rows.insert(execution.id.clone(), execution.clone());
        Ok(())
    }

    async fn get(&self, id: &str, organization_id: &str) -> Result<WorkflowExecution, ExecutionStoreError> {
        let execution = self
            .rows
            .get(id)
            .ok_or_else(|| ExecutionStoreError::NotFound(id.to_string()))?;
        if execution.organization_id != organization_id {
            return Err(ExecutionStoreError::NotFound(id.to_string()));
        }
        Ok(execution.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowgraph_model::Visibility;

    #[tokio::test]
    async fn save_then_get_roundtrips() {
        let store = InMemoryExecutionStore::new();
        let execution = WorkflowExecution::new("e1", "w1", "org-1", None, Visibility::Private);
        store.save(&execution).await.unwrap();

        let fetched = store.get("e1", "org-1").await.unwrap();
        assert_eq!(fetched.id, "e1");
    }

    #[tokio::test]
    async fn get_is_scoped_to_organization() {
        let store = InMemoryExecutionStore::new();
        let execution = WorkflowExecution::new("e1", "w1", "org-1", None, Visibility::Private);
        store.save(&execution).await.unwrap();

        let err = store.get("e1", "org-2").await.unwrap_err();
        assert!(matches!(err, ExecutionStoreError::NotFound(_)));
    }
}
