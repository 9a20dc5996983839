//! Object Store (C1): content-addressed blob storage for binary parameters,
//! workflow snapshots, and execution records.
//!
//! The store is generic over a `Bucket` — a minimal put/get/delete blob
//! interface a host may back with anything (S3, filesystem, memory). The
//! store itself owns the namespacing (`objects/{id}/object.data`,
//! `workflows/{id}.json`, ...) and the custom-metadata shapes; it never
//! performs access control, per §4.1.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use flowgraph_model::{ObjectReference, Workflow, WorkflowExecution};

use crate::error::StorageError;

/// HTTP-ish and custom metadata supplied at write time.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub content_type: String,
    pub cache_control: Option<String>,
    pub custom_metadata: HashMap<String, String>,
}

/// What a successful `get` returns.
#[derive(Debug, Clone)]
pub struct GetResult {
    pub bytes: Vec<u8>,
    pub custom_metadata: HashMap<String, String>,
}

/// The minimal blob-store interface the Object Store is built on (§6,
/// "Bucket-like blob store").
#[async_trait]
pub trait Bucket: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> Result<(), StorageError>;
    async fn get(&self, key: &str) -> Result<Option<GetResult>, StorageError>;
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// An in-memory `Bucket`, the default for tests and for running the engine
/// without an external dependency.
#[derive(Default)]
pub struct InMemoryBucket {
    entries: DashMap<String, (Vec<u8>, HashMap<String, String>)>,
}

impl InMemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Bucket for InMemoryBucket {
    async fn put(&self, key: &str, bytes: Vec<u8>, options: PutOptions) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), (bytes, options.custom_metadata));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<GetResult>, StorageError> {
        Ok(self.entries.get(key).map(|entry| {
            let (bytes, custom_metadata) = entry.value().clone();
            GetResult { bytes, custom_metadata }
        }))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Custom metadata attached to a binary object at write time.
#[derive(Debug, Clone)]
pub struct ObjectMetadata {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub organization_id: String,
    pub execution_id: Option<String>,
}

/// A binary object read back from the store.
#[derive(Debug, Clone)]
pub struct ObjectRecord {
    pub data: Vec<u8>,
    pub metadata: ObjectMetadata,
}

fn object_key(id: &str) -> String {
    format!("objects/{id}/object.data")
}

fn workflow_key(id: &str) -> String {
    format!("workflows/{id}.json")
}

fn execution_key(id: &str) -> String {
    format!("executions/{id}/execution.json")
}

fn execution_workflow_key(id: &str) -> String {
    format!("executions/{id}/workflow.json")
}

/// The content-addressed object store.
pub struct ObjectStore {
    bucket: Arc<dyn Bucket>,
}

impl ObjectStore {
    pub fn new(bucket: Arc<dyn Bucket>) -> Self {
        Self { bucket }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBucket::new()))
    }

    pub async fn write_object(
        &self,
        data: Vec<u8>,
        mime_type: String,
        organization_id: &str,
        execution_id: Option<&str>,
    ) -> Result<ObjectReference, StorageError> {
        let id = uuid::Uuid::now_v7().to_string();
        let created_at = Utc::now();

        let mut custom_metadata = HashMap::new();
        custom_metadata.insert("id".to_string(), id.clone());
        custom_metadata.insert("createdAt".to_string(), created_at.to_rfc3339());
        custom_metadata.insert("organizationId".to_string(), organization_id.to_string());
        if let Some(exec_id) = execution_id {
            custom_metadata.insert("executionId".to_string(), exec_id.to_string());
        }

        self.bucket
            .put(
                &object_key(&id),
                data,
                PutOptions {
                    content_type: mime_type.clone(),
                    cache_control: Some("public, max-age=31536000".to_string()),
                    custom_metadata,
                },
            )
            .await?;

        Ok(ObjectReference { id, mime_type })
    }

    pub async fn read_object(&self, reference: &ObjectReference) -> Result<ObjectRecord, StorageError> {
        let result = self
            .bucket
            .get(&object_key(&reference.id))
            .await?
            .ok_or_else(|| StorageError::NotFound(reference.id.clone()))?;

        let organization_id = result
            .custom_metadata
            .get("organizationId")
            .cloned()
            .unwrap_or_default();
        let execution_id = result.custom_metadata.get("executionId").cloned();
        let created_at = result
            .custom_metadata
            .get("createdAt")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        Ok(ObjectRecord {
            data: result.bytes,
            metadata: ObjectMetadata {
                id: reference.id.clone(),
                created_at,
                organization_id,
                execution_id,
            },
        })
    }

    pub async fn delete_object(&self, reference: &ObjectReference) -> Result<(), StorageError> {
        self.bucket.delete(&object_key(&reference.id)).await
    }

    pub async fn write_workflow(&self, workflow: &Workflow) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(workflow)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut custom_metadata = HashMap::new();
        custom_metadata.insert("workflowId".to_string(), workflow.id.clone());
        custom_metadata.insert("name".to_string(), workflow.name.clone());
        custom_metadata.insert("type".to_string(), workflow.trigger_type.as_str().to_string());
        custom_metadata.insert("updatedAt".to_string(), Utc::now().to_rfc3339());

        self.bucket
            .put(
                &workflow_key(&workflow.id),
                bytes,
                PutOptions {
                    content_type: "application/json".to_string(),
                    cache_control: None,
                    custom_metadata,
                },
            )
            .await
    }

    pub async fn read_workflow(&self, id: &str) -> Result<Workflow, StorageError> {
        let result = self
            .bucket
            .get(&workflow_key(id))
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        serde_json::from_slice(&result.bytes).map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    pub async fn delete_workflow(&self, id: &str) -> Result<(), StorageError> {
        self.bucket.delete(&workflow_key(id)).await
    }

    pub async fn write_execution(&self, execution: &WorkflowExecution) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(execution)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut custom_metadata = HashMap::new();
        custom_metadata.insert("workflowId".to_string(), execution.workflow_id.clone());
        custom_metadata.insert("status".to_string(), format!("{:?}", execution.status));
        custom_metadata.insert("updatedAt".to_string(), Utc::now().to_rfc3339());

        self.bucket
            .put(
                &execution_key(&execution.id),
                bytes,
                PutOptions {
                    content_type: "application/json".to_string(),
                    cache_control: None,
                    custom_metadata,
                },
            )
            .await
    }

    pub async fn read_execution(&self, id: &str) -> Result<WorkflowExecution, StorageError> {
        let result = self
            .bucket
            .get(&execution_key(id))
            .await?
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        serde_json::from_slice(&result.bytes).map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    pub async fn delete_execution(&self, id: &str) -> Result<(), StorageError> {
        self.bucket.delete(&execution_key(id)).await
    }

    pub async fn write_execution_workflow(
        &self,
        execution_id: &str,
        workflow: &Workflow,
    ) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(workflow)
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let mut custom_metadata = HashMap::new();
        custom_metadata.insert("executionId".to_string(), execution_id.to_string());
        custom_metadata.insert("workflowId".to_string(), workflow.id.clone());
        custom_metadata.insert("updatedAt".to_string(), Utc::now().to_rfc3339());

        self.bucket
            .put(
                &execution_workflow_key(execution_id),
                bytes,
                PutOptions {
                    content_type: "application/json".to_string(),
                    cache_control: None,
                    custom_metadata,
                },
            )
            .await
    }

    pub async fn read_execution_workflow(&self, execution_id: &str) -> Result<Workflow, StorageError> {
        let result = self
            .bucket
            .get(&execution_workflow_key(execution_id))
            .await?
            .ok_or_else(|| StorageError::NotFound(execution_id.to_string()))?;
        serde_json::from_slice(&result.bytes).map_err(|e| StorageError::Unavailable(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_object_roundtrips_bytes_and_metadata() {
        let store = ObjectStore::in_memory();
        let data = vec![1u8, 2, 3, 4];
        let reference = store
            .write_object(data.clone(), "image/png".to_string(), "org-1", Some("exec-1"))
            .await
            .unwrap();

        assert_eq!(reference.mime_type, "image/png");

        let record = store.read_object(&reference).await.unwrap();
        assert_eq!(record.data, data);
        assert_eq!(record.metadata.organization_id, "org-1");
        assert_eq!(record.metadata.execution_id.as_deref(), Some("exec-1"));
    }

    #[tokio::test]
    async fn read_missing_object_is_not_found() {
        let store = ObjectStore::in_memory();
        let reference = ObjectReference {
            id: "nonexistent".to_string(),
            mime_type: "image/png".to_string(),
        };
        let err = store.read_object(&reference).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }
}
