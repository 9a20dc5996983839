//! Row + blob split for execution persistence, mirroring the teacher's
//! `ExecutionEntity` / `ExecutionData` pattern: scalar fields live in
//! `execution_entity`, the potentially-large `node_executions` trace lives
//! in `execution_data` as JSONB, keyed by the same id.

use chrono::{DateTime, Utc};
use flowgraph_model::{NodeExecution, Visibility, WorkflowExecution, WorkflowExecutionStatus};
use sqlx::FromRow;

use crate::error::StoreResult;

#[derive(Debug, Clone, FromRow)]
pub struct ExecutionEntity {
    pub id: String,
    pub workflow_id: String,
    pub deployment_id: Option<String>,
    pub organization_id: String,
    pub status: String,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub visibility: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ExecutionData {
    pub execution_id: String,
    #[sqlx(json)]
    pub node_executions: serde_json::Value,
}

fn status_to_str(status: WorkflowExecutionStatus) -> &'static str {
    match status {
        WorkflowExecutionStatus::Idle => "idle",
        WorkflowExecutionStatus::Executing => "executing",
        WorkflowExecutionStatus::Completed => "completed",
        WorkflowExecutionStatus::Error => "error",
    }
}

fn status_from_str(status: &str) -> WorkflowExecutionStatus {
    match status {
        "executing" => WorkflowExecutionStatus::Executing,
        "completed" => WorkflowExecutionStatus::Completed,
        "error" => WorkflowExecutionStatus::Error,
        _ => WorkflowExecutionStatus::Idle,
    }
}

fn visibility_to_str(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Public => "public",
        Visibility::Private => "private",
    }
}

fn visibility_from_str(visibility: &str) -> Visibility {
    match visibility {
        "public" => Visibility::Public,
        _ => Visibility::Private,
    }
}

pub fn entity_to_execution(entity: &ExecutionEntity, data: &ExecutionData) -> StoreResult<WorkflowExecution> {
    let node_executions: Vec<NodeExecution> = serde_json::from_value(data.node_executions.clone())?;
    Ok(WorkflowExecution {
        id: entity.id.clone(),
        workflow_id: entity.workflow_id.clone(),
        deployment_id: entity.deployment_id.clone(),
        organization_id: entity.organization_id.clone(),
        status: status_from_str(&entity.status),
        node_executions,
        error: entity.error.clone(),
        started_at: entity.started_at,
        ended_at: entity.ended_at,
        visibility: visibility_from_str(&entity.visibility),
    })
}

pub fn execution_to_entity(execution: &WorkflowExecution) -> ExecutionEntity {
    ExecutionEntity {
        id: execution.id.clone(),
        workflow_id: execution.workflow_id.clone(),
        deployment_id: execution.deployment_id.clone(),
        organization_id: execution.organization_id.clone(),
        status: status_to_str(execution.status).to_string(),
        error: execution.error.clone(),
        started_at: execution.started_at,
        ended_at: execution.ended_at,
        visibility: visibility_to_str(execution.visibility).to_string(),
    }
}

pub fn execution_to_data(execution: &WorkflowExecution) -> StoreResult<ExecutionData> {
    Ok(ExecutionData {
        execution_id: execution.id.clone(),
        node_executions: serde_json::to_value(&execution.node_executions)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrips_through_entity_and_data() {
        let mut execution = WorkflowExecution::new("e1", "w1", "org-1", None, Visibility::Private);
        execution.status = WorkflowExecutionStatus::Completed;
        execution.node_executions.push(NodeExecution::skipped("n1"));

        let entity = execution_to_entity(&execution);
        let data = execution_to_data(&execution).unwrap();
        let restored = entity_to_execution(&entity, &data).unwrap();

        assert_eq!(restored.id, execution.id);
        assert_eq!(restored.status, execution.status);
        assert_eq!(restored.node_executions.len(), 1);
    }
}
