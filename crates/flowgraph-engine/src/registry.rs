//! Node Registry (C3): static descriptors plus factories producing
//! executable node instances, per §4.3.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowgraph_model::{EngineValue, Node, ParameterType};
use tokio_util::sync::CancellationToken;

use crate::host::{EmailMessagePayload, HttpRequestPayload, IntegrationProvider, NoIntegrations, NoSecrets, QueueMessagePayload, SecretProvider};

/// A single named, typed slot in a node descriptor's input or output list.
#[derive(Debug, Clone)]
pub struct ParameterSlot {
    pub name: String,
    pub param_type: ParameterType,
    pub required: bool,
    pub repeated: bool,
}

impl ParameterSlot {
    pub fn new(name: impl Into<String>, param_type: ParameterType) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            repeated: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }
}

/// The static, process-wide description of a node type.
#[derive(Debug, Clone)]
pub struct NodeDescriptor {
    pub id: String,
    pub node_type: String,
    pub name: String,
    pub description: String,
    pub tags: Vec<String>,
    pub icon: Option<String>,
    pub inlinable: bool,
    pub as_tool: bool,
    pub compute_cost: u64,
    pub inputs: Vec<ParameterSlot>,
    pub outputs: Vec<ParameterSlot>,
}

impl NodeDescriptor {
    pub fn new(node_type: impl Into<String>, name: impl Into<String>) -> Self {
        let node_type = node_type.into();
        Self {
            id: node_type.clone(),
            node_type,
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            icon: None,
            inlinable: false,
            as_tool: false,
            compute_cost: 1,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn compute_cost(mut self, cost: u64) -> Self {
        self.compute_cost = cost;
        self
    }

    pub fn inputs(mut self, inputs: Vec<ParameterSlot>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn outputs(mut self, outputs: Vec<ParameterSlot>) -> Self {
        self.outputs = outputs;
        self
    }
}

/// One method: report incremental progress from inside a node's `execute`.
/// A no-op sink is the test default, matching the redesign note in §9.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, node_id: &str, payload: serde_json::Value);
}

pub struct NoOpProgressSink;

impl ProgressSink for NoOpProgressSink {
    fn on_progress(&self, _node_id: &str, _payload: serde_json::Value) {}
}

/// Everything a node implementation needs to run one execution.
pub struct NodeContext {
    pub node_id: String,
    pub workflow_id: String,
    pub organization_id: String,
    pub inputs: HashMap<String, EngineValue>,
    pub env: HashMap<String, String>,
    pub secrets: Arc<dyn SecretProvider>,
    pub integrations: Arc<dyn IntegrationProvider>,
    pub progress: Arc<dyn ProgressSink>,
    pub http_request: Option<HttpRequestPayload>,
    pub email_message: Option<EmailMessagePayload>,
    pub queue_message: Option<QueueMessagePayload>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub cancellation: CancellationToken,
}

impl NodeContext {
    pub fn input(&self, name: &str) -> Option<&EngineValue> {
        self.inputs.get(name)
    }
}

/// Convenience builder for tests and for the runtime façade's default
/// wiring; real hosts will supply their own secrets/integrations providers.
pub struct NodeContextBuilder {
    ctx: NodeContext,
}

impl NodeContextBuilder {
    pub fn new(node_id: impl Into<String>, workflow_id: impl Into<String>, organization_id: impl Into<String>) -> Self {
        Self {
            ctx: NodeContext {
                node_id: node_id.into(),
                workflow_id: workflow_id.into(),
                organization_id: organization_id.into(),
                inputs: HashMap::new(),
                env: HashMap::new(),
                secrets: Arc::new(NoSecrets),
                integrations: Arc::new(NoIntegrations),
                progress: Arc::new(NoOpProgressSink),
                http_request: None,
                email_message: None,
                queue_message: None,
                scheduled_time: None,
                cancellation: CancellationToken::new(),
            },
        }
    }

    pub fn inputs(mut self, inputs: HashMap<String, EngineValue>) -> Self {
        self.ctx.inputs = inputs;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.ctx.cancellation = token;
        self
    }

    pub fn secrets(mut self, secrets: Arc<dyn SecretProvider>) -> Self {
        self.ctx.secrets = secrets;
        self
    }

    pub fn integrations(mut self, integrations: Arc<dyn IntegrationProvider>) -> Self {
        self.ctx.integrations = integrations;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.ctx.progress = progress;
        self
    }

    pub fn http_request(mut self, payload: Option<HttpRequestPayload>) -> Self {
        self.ctx.http_request = payload;
        self
    }

    pub fn email_message(mut self, payload: Option<EmailMessagePayload>) -> Self {
        self.ctx.email_message = payload;
        self
    }

    pub fn queue_message(mut self, payload: Option<QueueMessagePayload>) -> Self {
        self.ctx.queue_message = payload;
        self
    }

    pub fn scheduled_time(mut self, time: Option<DateTime<Utc>>) -> Self {
        self.ctx.scheduled_time = time;
        self
    }

    pub fn build(self) -> NodeContext {
        self.ctx
    }
}

/// The result of one node execution: completed-with-outputs or
/// error-with-message. There is no third variant — `skipped` is a scheduler
/// decision made before `execute` is ever called.
pub type NodeResult = Result<HashMap<String, EngineValue>, String>;

/// A node implementation bound to a specific graph node.
#[async_trait]
pub trait NodeExecutable: Send + Sync {
    async fn execute(&self, ctx: NodeContext) -> NodeResult;
}

/// Builds a fresh `NodeExecutable` for a graph node of a known type.
pub trait NodeFactory: Send + Sync {
    fn create(&self, node: &Node) -> Box<dyn NodeExecutable>;
}

impl<F> NodeFactory for F
where
    F: Fn(&Node) -> Box<dyn NodeExecutable> + Send + Sync,
{
    fn create(&self, node: &Node) -> Box<dyn NodeExecutable> {
        self(node)
    }
}

/// Process-wide, immutable (after startup) catalog of node types.
#[derive(Default)]
pub struct NodeRegistry {
    descriptors: HashMap<String, NodeDescriptor>,
    factories: HashMap<String, Arc<dyn NodeFactory>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: NodeDescriptor, factory: Arc<dyn NodeFactory>) {
        self.factories.insert(descriptor.node_type.clone(), factory);
        self.descriptors.insert(descriptor.node_type.clone(), descriptor);
    }

    pub fn descriptor(&self, node_type: &str) -> Option<&NodeDescriptor> {
        self.descriptors.get(node_type)
    }

    pub fn is_registered(&self, node_type: &str) -> bool {
        self.descriptors.contains_key(node_type)
    }

    pub fn create_executable(&self, node: &Node) -> Option<Box<dyn NodeExecutable>> {
        self.factories.get(&node.node_type).map(|factory| factory.create(node))
    }

    pub fn list_descriptors(&self) -> Vec<&NodeDescriptor> {
        self.descriptors.values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoNode;

    #[async_trait]
    impl NodeExecutable for EchoNode {
        async fn execute(&self, ctx: NodeContext) -> NodeResult {
            Ok(ctx.inputs)
        }
    }

    #[test]
    fn register_and_lookup_roundtrips() {
        let mut registry = NodeRegistry::new();
        registry.register(
            NodeDescriptor::new("core.echo", "Echo"),
            Arc::new(|_: &Node| Box::new(EchoNode) as Box<dyn NodeExecutable>),
        );

        assert!(registry.is_registered("core.echo"));
        assert!(!registry.is_registered("core.missing"));

        let node = Node::new("n1", "core.echo", "Echo");
        assert!(registry.create_executable(&node).is_some());
        assert_eq!(registry.list_descriptors().len(), 1);
    }
}
