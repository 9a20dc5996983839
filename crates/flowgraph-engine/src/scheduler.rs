//! Scheduler (C5): the data-driven, level-synchronous dispatcher, per §4.5.
//! The hardest part of the engine — see SPEC_FULL.md for the full model.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use flowgraph_model::{Node, NodeExecution, WireValue, Workflow, WorkflowExecution};
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};

use crate::host::{EmailMessagePayload, HttpRequestPayload, IntegrationProvider, QueueMessagePayload, SecretProvider};
use crate::monitoring::MonitoringSink;
use crate::object_store::ObjectStore;
use crate::parameters::{from_wire, to_wire};
use crate::registry::{NodeContextBuilder, NodeRegistry, ProgressSink};

/// Wall-clock budget applied to each node's `execute` call (§5).
pub struct SchedulerConfig {
    pub step_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(600),
        }
    }
}

/// Everything the scheduler needs beyond the graph and the execution record
/// itself, bundled to keep `run`'s signature manageable.
pub struct SchedulerInputs {
    pub cancellation: CancellationToken,
    pub monitoring: Arc<dyn MonitoringSink>,
    pub session_id: Option<String>,
    pub http_request: Option<HttpRequestPayload>,
    pub email_message: Option<EmailMessagePayload>,
    pub queue_message: Option<QueueMessagePayload>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub secrets: Arc<dyn SecretProvider>,
    pub integrations: Arc<dyn IntegrationProvider>,
    pub progress: Arc<dyn ProgressSink>,
}

/// Per-execution scheduler state (§4.5 "State per execution").
#[derive(Default)]
struct SchedulerState {
    node_outputs: HashMap<String, HashMap<String, WireValue>>,
    executed_nodes: HashSet<String>,
    skipped_nodes: HashSet<String>,
    node_errors: HashMap<String, String>,
}

impl SchedulerState {
    fn is_decided(&self, node_id: &str) -> bool {
        self.executed_nodes.contains(node_id) || self.skipped_nodes.contains(node_id) || self.node_errors.contains_key(node_id)
    }
}

enum InputResolution {
    Bound(WireValue),
    SkipSignal,
    Pending,
    UpstreamError(String),
}

fn resolve_single_input(workflow: &Workflow, node_id: &str, input_name: &str, literal: &Option<WireValue>, state: &SchedulerState) -> InputResolution {
    let edges = workflow.edges_into(node_id, input_name);
    if edges.is_empty() {
        return match literal {
            Some(v) => InputResolution::Bound(v.clone()),
            None => InputResolution::SkipSignal,
        };
    }

    for edge in &edges {
        if let Some(message) = state.node_errors.get(&edge.source_node_id) {
            let _ = message;
            return InputResolution::UpstreamError(edge.source_node_id.clone());
        }
        if !state.is_decided(&edge.source_node_id) {
            return InputResolution::Pending;
        }
    }

    for edge in &edges {
        if let Some(value) = state
            .node_outputs
            .get(&edge.source_node_id)
            .and_then(|outputs| outputs.get(&edge.source_output))
        {
            return InputResolution::Bound(value.clone());
        }
    }

    // Every incoming edge is decided but none produced this output: a skip
    // signal. Fall back to the literal default if present (§9 decision).
    match literal {
        Some(v) => InputResolution::Bound(v.clone()),
        None => InputResolution::SkipSignal,
    }
}

fn resolve_repeated_input(workflow: &Workflow, node_id: &str, input_name: &str, literal: &Option<WireValue>, state: &SchedulerState) -> InputResolution {
    let edges = workflow.edges_into(node_id, input_name);
    if edges.is_empty() {
        let values = literal.clone().into_iter().map(wire_to_json).collect();
        return InputResolution::Bound(WireValue::Json(serde_json::Value::Array(values)));
    }

    let mut collected = Vec::new();
    for edge in &edges {
        if state.node_errors.contains_key(&edge.source_node_id) {
            return InputResolution::UpstreamError(edge.source_node_id.clone());
        }
        if !state.is_decided(&edge.source_node_id) {
            return InputResolution::Pending;
        }
        if let Some(value) = state
            .node_outputs
            .get(&edge.source_node_id)
            .and_then(|outputs| outputs.get(&edge.source_output))
        {
            collected.push(wire_to_json(value.clone()));
        }
        // else: skip signal on this particular edge, simply excluded.
    }
    InputResolution::Bound(WireValue::Json(serde_json::Value::Array(collected)))
}

fn wire_to_json(value: WireValue) -> serde_json::Value {
    match value {
        WireValue::Json(v) => v,
        WireValue::Binary(reference) => serde_json::json!({ "id": reference.id, "mimeType": reference.mime_type }),
    }
}

enum Outcome {
    NotReady,
    Skip,
    Error(String),
    Bind(HashMap<String, WireValue>),
}

fn try_schedule_node(node: &Node, workflow: &Workflow, state: &SchedulerState) -> Outcome {
    if node.node_type == "core.conditionalJoin" {
        return try_schedule_join(node, workflow, state);
    }

    let mut bindings = HashMap::new();
    for input in &node.inputs {
        let resolution = if input.repeated {
            resolve_repeated_input(workflow, &node.id, &input.name, &input.value, state)
        } else {
            resolve_single_input(workflow, &node.id, &input.name, &input.value, state)
        };

        match resolution {
            InputResolution::Pending => return Outcome::NotReady,
            InputResolution::UpstreamError(id) => return Outcome::Error(format!("upstream '{id}' failed")),
            InputResolution::SkipSignal => {
                if input.required {
                    return Outcome::Skip;
                }
            }
            InputResolution::Bound(value) => {
                bindings.insert(input.name.clone(), value);
            }
        }
    }
    Outcome::Bind(bindings)
}

/// The conditional join primitive: ready once both branches are decided;
/// skips if neither produced a value, otherwise forwards whichever did.
fn try_schedule_join(node: &Node, workflow: &Workflow, state: &SchedulerState) -> Outcome {
    let true_res = resolve_single_input(workflow, &node.id, "true", &None, state);
    let false_res = resolve_single_input(workflow, &node.id, "false", &None, state);

    for res in [&true_res, &false_res] {
        if matches!(res, InputResolution::Pending) {
            return Outcome::NotReady;
        }
    }
    for res in [&true_res, &false_res] {
        if let InputResolution::UpstreamError(id) = res {
            return Outcome::Error(format!("upstream '{id}' failed"));
        }
    }

    let mut bindings = HashMap::new();
    if let InputResolution::Bound(v) = true_res {
        bindings.insert("true".to_string(), v);
    }
    if let InputResolution::Bound(v) = false_res {
        bindings.insert("false".to_string(), v);
    }

    if bindings.is_empty() {
        Outcome::Skip
    } else {
        Outcome::Bind(bindings)
    }
}

pub struct Scheduler<'a> {
    pub registry: &'a NodeRegistry,
    pub object_store: &'a ObjectStore,
    pub config: SchedulerConfig,
}

impl<'a> Scheduler<'a> {
    pub fn new(registry: &'a NodeRegistry, object_store: &'a ObjectStore) -> Self {
        Self {
            registry,
            object_store,
            config: SchedulerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Drives `execution` to completion. Mutates `execution.node_executions`
    /// in place; does not set `execution.status` except when cancellation
    /// is observed, matching §4.5's explicit "aborted" behavior. The caller
    /// (the runtime façade) aggregates final status from the populated
    /// node executions.
    pub async fn run(&self, workflow: &Workflow, execution: &mut WorkflowExecution, inputs: SchedulerInputs) {
        let mut state = SchedulerState::default();
        let node_ids: Vec<String> = workflow.nodes.iter().map(|n| n.id.clone()).collect();

        loop {
            if inputs.cancellation.is_cancelled() {
                for node_id in &node_ids {
                    if !state.is_decided(node_id) {
                        state.skipped_nodes.insert(node_id.clone());
                        execution.node_executions.push(NodeExecution::skipped(node_id.clone()));
                    }
                }
                execution.error = Some("aborted".to_string());
                inputs.monitoring.send_update(inputs.session_id.as_deref(), execution).await;
                return;
            }

            let mut progress = false;
            for node in &workflow.nodes {
                if state.is_decided(&node.id) {
                    continue;
                }

                match try_schedule_node(node, workflow, &state) {
                    Outcome::NotReady => continue,
                    Outcome::Skip => {
                        state.skipped_nodes.insert(node.id.clone());
                        execution.node_executions.push(NodeExecution::skipped(node.id.clone()));
                        progress = true;
                    }
                    Outcome::Error(message) => {
                        state.node_errors.insert(node.id.clone(), message.clone());
                        execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                        progress = true;
                    }
                    Outcome::Bind(wire_bindings) => {
                        self.execute_step(workflow, node, wire_bindings, &mut state, execution, &inputs).await;
                        progress = true;
                    }
                }

                inputs.monitoring.send_update(inputs.session_id.as_deref(), execution).await;
            }

            if !progress {
                break;
            }
        }

        // Anything left undecided after the fixed point is unreachable.
        for node_id in &node_ids {
            if !state.is_decided(node_id) {
                state.skipped_nodes.insert(node_id.clone());
                execution.node_executions.push(NodeExecution::skipped(node_id.clone()));
            }
        }

        inputs.monitoring.send_update(inputs.session_id.as_deref(), execution).await;
    }

    async fn execute_step(
        &self,
        workflow: &Workflow,
        node: &Node,
        wire_bindings: HashMap<String, WireValue>,
        state: &mut SchedulerState,
        execution: &mut WorkflowExecution,
        inputs: &SchedulerInputs,
    ) {
        let span = info_span!("scheduler_step", node_id = %node.id, node_type = %node.node_type);
        async {
            let Some(descriptor) = self.registry.descriptor(&node.node_type) else {
                let message = format!("node type '{}' is not registered", node.node_type);
                state.node_errors.insert(node.id.clone(), message.clone());
                execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                return;
            };

            let mut engine_inputs = HashMap::new();
            for (name, wire_value) in &wire_bindings {
                let Some(input_def) = node.input(name) else { continue };
                match from_wire(input_def.param_type, wire_value, self.object_store).await {
                    Ok(Some(engine_value)) => {
                        engine_inputs.insert(name.clone(), engine_value);
                    }
                    Ok(None) => {
                        let message = format!("input '{name}' does not type-check");
                        state.node_errors.insert(node.id.clone(), message.clone());
                        execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                        return;
                    }
                    Err(err) => {
                        let message = err.to_string();
                        state.node_errors.insert(node.id.clone(), message.clone());
                        execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                        return;
                    }
                }
            }

            let Some(executable) = self.registry.create_executable(node) else {
                let message = format!("node type '{}' has no executable factory", node.node_type);
                state.node_errors.insert(node.id.clone(), message.clone());
                execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                return;
            };

            let ctx = NodeContextBuilder::new(node.id.clone(), workflow.id.clone(), execution.organization_id.clone())
                .inputs(engine_inputs)
                .cancellation(inputs.cancellation.clone())
                .secrets(inputs.secrets.clone())
                .integrations(inputs.integrations.clone())
                .progress(inputs.progress.clone())
                .http_request(inputs.http_request.clone())
                .email_message(inputs.email_message.clone())
                .queue_message(inputs.queue_message.clone())
                .scheduled_time(inputs.scheduled_time)
                .build();

            let run_result = tokio::time::timeout(self.config.step_timeout, executable.execute(ctx)).await;

            let node_result = match run_result {
                Err(_elapsed) => Err("timeout".to_string()),
                Ok(inner) => inner,
            };

            match node_result {
                Err(message) => {
                    state.node_errors.insert(node.id.clone(), message.clone());
                    execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                }
                Ok(engine_outputs) => {
                    let mut wire_outputs = HashMap::new();
                    for (name, engine_value) in &engine_outputs {
                        let Some(output_def) = node.output(name) else { continue };
                        match to_wire(
                            output_def.param_type,
                            engine_value,
                            self.object_store,
                            &execution.organization_id,
                            Some(&execution.id),
                        )
                        .await
                        {
                            Ok(wire_value) => {
                                wire_outputs.insert(name.clone(), wire_value);
                            }
                            Err(err) => {
                                let message = err.to_string();
                                state.node_errors.insert(node.id.clone(), message.clone());
                                execution.node_executions.push(NodeExecution::errored(node.id.clone(), message));
                                return;
                            }
                        }
                    }

                    state.node_outputs.insert(node.id.clone(), wire_outputs.clone());
                    state.executed_nodes.insert(node.id.clone());
                    execution
                        .node_executions
                        .push(NodeExecution::completed(node.id.clone(), wire_outputs, descriptor.compute_cost));
                }
            }
        }
        .instrument(span)
        .await;

        if let Some(message) = state.node_errors.get(&node.id) {
            warn!(node_id = %node.id, error = %message, "node execution failed");
        }
    }
}
