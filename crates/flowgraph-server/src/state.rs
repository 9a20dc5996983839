//! Shared application state: the node registry, object store, and the
//! collaborator services the `Runtime` façade needs. Falls back to
//! in-memory implementations when no database is configured, so the
//! binary is runnable without any external dependency for local use.

use std::sync::Arc;

use flowgraph_engine::{ExecutionStore, InMemoryCreditService, InMemoryExecutionStore, NodeRegistry, ObjectStore};
use flowgraph_store::PostgresExecutionStore;

use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NodeRegistry>,
    pub object_store: Arc<ObjectStore>,
    pub credit_service: Arc<InMemoryCreditService>,
    pub execution_store: Arc<dyn ExecutionStore>,
}

impl AppState {
    pub async fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        let mut registry = NodeRegistry::new();
        flowgraph_engine::nodes::register_builtins(&mut registry);

        let execution_store: Arc<dyn ExecutionStore> = match &config.database_url {
            Some(url) => {
                let store = PostgresExecutionStore::connect(url).await?;
                store.migrate().await?;
                Arc::new(store)
            }
            None => {
                tracing::warn!("no DATABASE_URL configured, falling back to in-memory execution store");
                Arc::new(InMemoryExecutionStore::new())
            }
        };

        Ok(Self {
            registry: Arc::new(registry),
            object_store: Arc::new(ObjectStore::in_memory()),
            credit_service: Arc::new(InMemoryCreditService::default()),
            execution_store,
        })
    }
}
