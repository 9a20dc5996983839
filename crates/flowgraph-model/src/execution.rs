//! Execution records: the per-node trace and the overall workflow record.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parameter::WireValue;

/// Status of a single node's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeExecutionStatus {
    Idle,
    Executing,
    Completed,
    Skipped,
    Error,
}

/// Status of the overall workflow execution. Note there is no `skipped`
/// variant here — an execution as a whole either completes or errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowExecutionStatus {
    Idle,
    Executing,
    Completed,
    Error,
}

/// Who may read a public execution record without owning its organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Private,
}

/// The trace of a single node within one workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
    pub node_id: String,
    pub status: NodeExecutionStatus,
    #[serde(default)]
    pub outputs: HashMap<String, WireValue>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub usage: u64,
}

impl NodeExecution {
    pub fn idle(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeExecutionStatus::Idle,
            outputs: HashMap::new(),
            error: None,
            usage: 0,
        }
    }

    pub fn completed(node_id: impl Into<String>, outputs: HashMap<String, WireValue>, usage: u64) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeExecutionStatus::Completed,
            outputs,
            error: None,
            usage,
        }
    }

    pub fn skipped(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeExecutionStatus::Skipped,
            outputs: HashMap::new(),
            error: None,
            usage: 0,
        }
    }

    pub fn errored(node_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            status: NodeExecutionStatus::Error,
            outputs: HashMap::new(),
            error: Some(error.into()),
            usage: 0,
        }
    }
}

/// The full record of one workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowExecution {
    pub id: String,
    pub workflow_id: String,
    #[serde(default)]
    pub deployment_id: Option<String>,
    pub organization_id: String,
    pub status: WorkflowExecutionStatus,
    #[serde(default)]
    pub node_executions: Vec<NodeExecution>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}

impl WorkflowExecution {
    pub fn new(
        id: impl Into<String>,
        workflow_id: impl Into<String>,
        organization_id: impl Into<String>,
        deployment_id: Option<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            deployment_id,
            organization_id: organization_id.into(),
            status: WorkflowExecutionStatus::Idle,
            node_executions: Vec::new(),
            error: None,
            started_at: None,
            ended_at: None,
            visibility,
        }
    }

    pub fn node_execution_mut(&mut self, node_id: &str) -> Option<&mut NodeExecution> {
        self.node_executions.iter_mut().find(|n| n.node_id == node_id)
    }

    pub fn node_execution(&self, node_id: &str) -> Option<&NodeExecution> {
        self.node_executions.iter().find(|n| n.node_id == node_id)
    }

    pub fn total_usage(&self) -> u64 {
        self.node_executions.iter().map(|n| n.usage).sum()
    }
}
