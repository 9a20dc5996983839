//! Postgres-backed `ExecutionStore`: row-then-blob, upsert on conflict.

use async_trait::async_trait;
use flowgraph_engine::{ExecutionStore, ExecutionStoreError};
use flowgraph_model::WorkflowExecution;
use sqlx::PgPool;

use crate::entities::{entity_to_execution, execution_to_data, execution_to_entity, ExecutionData, ExecutionEntity};
use crate::error::{StoreError, StoreResult};

#[derive(Clone)]
pub struct PostgresExecutionStore {
    pool: PgPool,
}

impl PostgresExecutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(StoreError::SqlxError)?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::MigrationError(e.to_string()))
    }

    async fn find_entity(&self, id: &str, organization_id: &str) -> StoreResult<Option<ExecutionEntity>> {
        let entity = sqlx::query_as::<_, ExecutionEntity>(
            r#"
            SELECT id, workflow_id, deployment_id, organization_id, status, error,
                   started_at, ended_at, visibility
            FROM execution_entity
            WHERE id = $1 AND organization_id = $2
            "#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(entity)
    }

    async fn find_data(&self, id: &str) -> StoreResult<Option<ExecutionData>> {
        let data = sqlx::query_as::<_, ExecutionData>(
            r#"
            SELECT execution_id, node_executions
            FROM execution_data
            WHERE execution_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(data)
    }

    async fn save_inner(&self, execution: &WorkflowExecution) -> StoreResult<()> {
        let entity = execution_to_entity(execution);
        let data = execution_to_data(execution)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO execution_entity
                (id, workflow_id, deployment_id, organization_id, status, error, started_at, ended_at, visibility)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                error = EXCLUDED.error,
                started_at = EXCLUDED.started_at,
                ended_at = EXCLUDED.ended_at,
                visibility = EXCLUDED.visibility
            "#,
        )
        .bind(&entity.id)
        .bind(&entity.workflow_id)
        .bind(&entity.deployment_id)
        .bind(&entity.organization_id)
        .bind(&entity.status)
        .bind(&entity.error)
        .bind(entity.started_at)
        .bind(entity.ended_at)
        .bind(&entity.visibility)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO execution_data (execution_id, node_executions)
            VALUES ($1, $2)
            ON CONFLICT (execution_id) DO UPDATE SET node_executions = EXCLUDED.node_executions
            "#,
        )
        .bind(&data.execution_id)
        .bind(&data.node_executions)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ExecutionStore for PostgresExecutionStore {
    async fn save(&self, execution: &WorkflowExecution) -> Result<(), ExecutionStoreError> {
        self.save_inner(execution).await.map_err(Into::into)
    }

    async fn get(&self, id: &str, organization_id: &str) -> Result<WorkflowExecution, ExecutionStoreError> {
        let entity = self
            .find_entity(id, organization_id)
            .await
            .map_err(ExecutionStoreError::from)?
            .ok_or_else(|| ExecutionStoreError::NotFound(id.to_string()))?;

        let data = self
            .find_data(id)
            .await
            .map_err(ExecutionStoreError::from)?
            .ok_or_else(|| ExecutionStoreError::NotFound(id.to_string()))?;

        entity_to_execution(&entity, &data).map_err(ExecutionStoreError::from)
    }
}
