//! Runtime façade (C9): orchestrates C1-C8 for one `run` call, per §4.9.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flowgraph_model::{NodeExecutionStatus, Visibility, Workflow, WorkflowExecution, WorkflowExecutionStatus};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::credit::CreditService;
use crate::error::RuntimeError;
use crate::execution_store::ExecutionStore;
use crate::host::{EmailMessagePayload, HttpRequestPayload, IntegrationProvider, NoIntegrations, NoSecrets, QueueMessagePayload, SecretProvider};
use crate::monitoring::{MonitoringSink, NoOpMonitoringSink};
use crate::object_store::ObjectStore;
use crate::registry::{NoOpProgressSink, NodeRegistry, ProgressSink};
use crate::scheduler::{Scheduler, SchedulerConfig, SchedulerInputs};
use crate::validator;

/// Runtime-wide tunables (§1.1 ambient stack, §5 concurrency model).
/// Constructible via `Default` or `from_env()`, mirroring the teacher's
/// `DbConfig`/`RuntimeConfig` env-var pattern.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub default_step_timeout: Duration,
    pub max_concurrency: usize,
    pub monitoring_channel_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            default_step_timeout: Duration::from_secs(600),
            max_concurrency: 16,
            monitoring_channel_capacity: 256,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_step_timeout: std::env::var("FLOWGRAPH_STEP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_step_timeout),
            max_concurrency: std::env::var("FLOWGRAPH_MAX_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrency),
            monitoring_channel_capacity: std::env::var("FLOWGRAPH_MONITORING_CHANNEL_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.monitoring_channel_capacity),
        }
    }
}

/// Everything one `run` call needs, per §6 "Exposed".
pub struct RuntimeParams {
    pub workflow: Workflow,
    pub organization_id: String,
    /// Whether this run participates in credit accounting (pre-flight
    /// `hasEnoughCredits` check and post-flight `recordUsage`). Draft/test
    /// runs the host doesn't want to bill can set this to `false`.
    pub compute_credits: bool,
    pub user_id: Option<String>,
    pub deployment_id: Option<String>,
    pub monitor_session_id: Option<String>,
    pub http_request: Option<HttpRequestPayload>,
    pub email_message: Option<EmailMessagePayload>,
    pub queue_message: Option<QueueMessagePayload>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub visibility: Visibility,
}

impl RuntimeParams {
    pub fn new(workflow: Workflow, organization_id: impl Into<String>) -> Self {
        Self {
            workflow,
            organization_id: organization_id.into(),
            compute_credits: true,
            user_id: None,
            deployment_id: None,
            monitor_session_id: None,
            http_request: None,
            email_message: None,
            queue_message: None,
            scheduled_time: None,
            visibility: Visibility::Private,
        }
    }
}

/// Orchestrates C1-C8 for one execution, per §4.9.
pub struct Runtime<'a> {
    registry: &'a NodeRegistry,
    object_store: &'a ObjectStore,
    credit_service: Arc<dyn CreditService>,
    execution_store: Arc<dyn ExecutionStore>,
    monitoring: Arc<dyn MonitoringSink>,
    secrets: Arc<dyn SecretProvider>,
    integrations: Arc<dyn IntegrationProvider>,
    progress: Arc<dyn ProgressSink>,
    config: RuntimeConfig,
}

impl<'a> Runtime<'a> {
    pub fn new(
        registry: &'a NodeRegistry,
        object_store: &'a ObjectStore,
        credit_service: Arc<dyn CreditService>,
        execution_store: Arc<dyn ExecutionStore>,
    ) -> Self {
        Self {
            registry,
            object_store,
            credit_service,
            execution_store,
            monitoring: Arc::new(NoOpMonitoringSink),
            secrets: Arc::new(NoSecrets),
            integrations: Arc::new(NoIntegrations),
            progress: Arc::new(NoOpProgressSink),
            config: RuntimeConfig::default(),
        }
    }

    pub fn with_monitoring(mut self, sink: Arc<dyn MonitoringSink>) -> Self {
        self.monitoring = sink;
        self
    }

    pub fn with_secrets(mut self, secrets: Arc<dyn SecretProvider>) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_integrations(mut self, integrations: Arc<dyn IntegrationProvider>) -> Self {
        self.integrations = integrations;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub async fn run(
        &self,
        params: RuntimeParams,
        execution_id: impl Into<String>,
        cancellation: CancellationToken,
    ) -> Result<WorkflowExecution, RuntimeError> {
        let execution_id = execution_id.into();
        let span = info_span!(
            "workflow_execution",
            execution_id = %execution_id,
            organization_id = %params.organization_id,
            workflow_id = %params.workflow.id,
        );
        Ok(self.run_inner(params, execution_id, cancellation).instrument(span).await)
    }

    async fn run_inner(&self, params: RuntimeParams, execution_id: String, cancellation: CancellationToken) -> WorkflowExecution {
        // 1. Init
        let mut execution = WorkflowExecution::new(
            execution_id,
            params.workflow.id.clone(),
            params.organization_id.clone(),
            params.deployment_id.clone(),
            params.visibility,
        );
        execution.status = WorkflowExecutionStatus::Executing;
        execution.started_at = Some(Utc::now());

        // 2. Budget
        if params.compute_credits {
            match self.credit_service.has_enough_credits(&params.organization_id).await {
                Ok(true) => {}
                Ok(false) => {
                    return self
                        .finalize_short_circuit(execution, RuntimeError::InsufficientCredits, params.monitor_session_id.as_deref())
                        .await;
                }
                Err(err) => {
                    return self
                        .finalize_short_circuit(
                            execution,
                            RuntimeError::StorageUnavailable(err.to_string()),
                            params.monitor_session_id.as_deref(),
                        )
                        .await;
                }
            }
        }

        // 3. Validate
        let validation_errors = validator::validate(&params.workflow, self.registry);
        if !validation_errors.is_empty() {
            let message = validation_errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; ");
            return self
                .finalize_short_circuit(execution, RuntimeError::ValidationFailed(message), params.monitor_session_id.as_deref())
                .await;
        }

        // 4. Seed: the trigger payload rides along in every node's context
        // (below) rather than materializing a synthetic trigger
        // NodeExecution, per the source-preserving decision in §9.

        // 5. Schedule
        let scheduler = Scheduler::new(self.registry, self.object_store).with_config(SchedulerConfig {
            step_timeout: self.config.default_step_timeout,
        });
        let scheduler_inputs = SchedulerInputs {
            cancellation,
            monitoring: self.monitoring.clone(),
            session_id: params.monitor_session_id.clone(),
            http_request: params.http_request.clone(),
            email_message: params.email_message.clone(),
            queue_message: params.queue_message.clone(),
            scheduled_time: params.scheduled_time,
            secrets: self.secrets.clone(),
            integrations: self.integrations.clone(),
            progress: self.progress.clone(),
        };
        scheduler.run(&params.workflow, &mut execution, scheduler_inputs).await;

        // 6. Finalize
        self.finalize(execution, &params.workflow, params.monitor_session_id.as_deref())
            .await
    }

    async fn finalize_short_circuit(
        &self,
        mut execution: WorkflowExecution,
        error: RuntimeError,
        session_id: Option<&str>,
    ) -> WorkflowExecution {
        execution.status = WorkflowExecutionStatus::Error;
        execution.error = Some(error.to_string());
        execution.ended_at = Some(Utc::now());

        if let Err(err) = self.execution_store.save(&execution).await {
            warn!(execution_id = %execution.id, error = %err, "failed to persist short-circuited execution");
        }
        self.monitoring.send_update(session_id, &execution).await;
        execution
    }

    async fn finalize(&self, mut execution: WorkflowExecution, workflow: &Workflow, session_id: Option<&str>) -> WorkflowExecution {
        execution.ended_at = Some(Utc::now());

        let any_node_errored = execution.node_executions.iter().any(|n| n.status == NodeExecutionStatus::Error);
        execution.status = if execution.error.is_some() || any_node_errored {
            WorkflowExecutionStatus::Error
        } else {
            WorkflowExecutionStatus::Completed
        };

        let total_usage = execution.total_usage();
        if let Err(err) = self.credit_service.record_usage(&execution.organization_id, total_usage).await {
            warn!(organization_id = %execution.organization_id, error = %err, "failed to record credit usage");
        }

        if let Err(err) = self.object_store.write_execution_workflow(&execution.id, workflow).await {
            warn!(execution_id = %execution.id, error = %err, "failed to snapshot executed workflow");
        }

        if let Err(err) = self.execution_store.save(&execution).await {
            warn!(execution_id = %execution.id, error = %err, "failed to persist execution");
        }

        self.monitoring.send_update(session_id, &execution).await;
        info!(execution_id = %execution.id, status = ?execution.status, usage = total_usage, "execution finished");
        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::InMemoryCreditService;
    use crate::execution_store::InMemoryExecutionStore;
    use crate::nodes::register_builtins;
    use flowgraph_model::{Edge, Node, NodeInput, NodeOutput, ParameterType, TriggerType, WireValue};

    fn number_input(id: &str, value: f64) -> Node {
        Node::new(id, "core.numberInput", id)
            .with_inputs(vec![NodeInput::new("value", ParameterType::Number)
                .required()
                .with_value(WireValue::number(value))])
            .with_outputs(vec![NodeOutput::new("value", ParameterType::Number)])
    }

    #[tokio::test]
    async fn happy_path_completes_and_persists() {
        let n1 = number_input("n1", 10.0);
        let n2 = number_input("n2", 5.0);
        let n3 = Node::new("n3", "core.addition", "Add")
            .with_inputs(vec![
                NodeInput::new("a", ParameterType::Number).required(),
                NodeInput::new("b", ParameterType::Number).required(),
            ])
            .with_outputs(vec![NodeOutput::new("result", ParameterType::Number)]);
        let workflow = Workflow::new("w1", "h1", "Linear", TriggerType::Manual)
            .with_nodes(vec![n1, n2, n3])
            .with_edges(vec![Edge::new("n1", "value", "n3", "a"), Edge::new("n2", "value", "n3", "b")]);

        let mut registry = NodeRegistry::new();
        register_builtins(&mut registry);
        let store = ObjectStore::in_memory();
        let credits = Arc::new(InMemoryCreditService::new());
        let executions = Arc::new(InMemoryExecutionStore::new());

        let runtime = Runtime::new(&registry, &store, credits, executions.clone());
        let params = RuntimeParams::new(workflow, "org-1");
        let execution = runtime.run(params, "e1", CancellationToken::new()).await.unwrap();

        assert_eq!(execution.status, WorkflowExecutionStatus::Completed);
        assert!(execution.started_at.is_some());
        assert!(execution.ended_at.is_some());
        assert!(executions.get("e1", "org-1").await.is_ok());
    }

    #[tokio::test]
    async fn insufficient_credits_short_circuits_before_scheduling() {
        let workflow = Workflow::new("w1", "h1", "Empty", TriggerType::Manual);
        let mut registry = NodeRegistry::new();
        register_builtins(&mut registry);
        let store = ObjectStore::in_memory();
        let credits = Arc::new(InMemoryCreditService::with_balance("org-1", 0));
        let executions = Arc::new(InMemoryExecutionStore::new());

        let runtime = Runtime::new(&registry, &store, credits, executions);
        let params = RuntimeParams::new(workflow, "org-1");
        let execution = runtime.run(params, "e1", CancellationToken::new()).await.unwrap();

        assert_eq!(execution.status, WorkflowExecutionStatus::Error);
        assert_eq!(execution.error.as_deref(), Some("insufficient credits"));
        assert!(execution.node_executions.is_empty());
    }

    #[tokio::test]
    async fn invalid_workflow_short_circuits_with_zero_node_executions() {
        let workflow = Workflow::new("w1", "h1", "Bad", TriggerType::Manual)
            .with_nodes(vec![Node::new("a", "core.doesNotExist", "A")]);
        let mut registry = NodeRegistry::new();
        register_builtins(&mut registry);
        let store = ObjectStore::in_memory();
        let credits = Arc::new(InMemoryCreditService::new());
        let executions = Arc::new(InMemoryExecutionStore::new());

        let runtime = Runtime::new(&registry, &store, credits, executions);
        let params = RuntimeParams::new(workflow, "org-1");
        let execution = runtime.run(params, "e1", CancellationToken::new()).await.unwrap();

        assert_eq!(execution.status, WorkflowExecutionStatus::Error);
        assert!(execution.node_executions.is_empty());
        assert!(execution.error.unwrap().contains("unregistered"));
    }
}
