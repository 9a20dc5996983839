//! End-to-end scenarios driving the `Runtime` façade over a registry with
//! the built-in `core.*` catalog, exercising linear scheduling, error
//! propagation, conditional skip, binary round-trip, cycle refusal, and
//! cancellation.

use std::sync::Arc;
use std::time::Duration;

use flowgraph_engine::{InMemoryCreditService, InMemoryExecutionStore, NodeRegistry, ObjectStore, Runtime, RuntimeParams};
use flowgraph_model::{
    Edge, Node, NodeExecutionStatus, NodeInput, NodeOutput, ParameterType as PT, TriggerType, WireValue, Workflow, WorkflowExecutionStatus,
};
use tokio_util::sync::CancellationToken;

fn registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    flowgraph_engine::nodes::register_builtins(&mut registry);
    registry
}

fn number_input(id: &str, value: f64) -> Node {
    Node::new(id, "core.numberInput", id)
        .with_inputs(vec![NodeInput::new("value", PT::Number).required().with_value(WireValue::number(value))])
        .with_outputs(vec![NodeOutput::new("value", PT::Number)])
}

fn boolean_input(id: &str, value: bool) -> Node {
    Node::new(id, "core.booleanInput", id)
        .with_inputs(vec![NodeInput::new("value", PT::Boolean).required().with_value(WireValue::boolean(value))])
        .with_outputs(vec![NodeOutput::new("value", PT::Boolean)])
}

fn addition(id: &str) -> Node {
    Node::new(id, "core.addition", id)
        .with_inputs(vec![
            NodeInput::new("a", PT::Number).required(),
            NodeInput::new("b", PT::Number).required(),
        ])
        .with_outputs(vec![NodeOutput::new("result", PT::Number)])
}

fn multiplication(id: &str, literal_b: f64) -> Node {
    Node::new(id, "core.multiplication", id)
        .with_inputs(vec![
            NodeInput::new("a", PT::Number).required(),
            NodeInput::new("b", PT::Number).required().with_value(WireValue::number(literal_b)),
        ])
        .with_outputs(vec![NodeOutput::new("result", PT::Number)])
}

fn division(id: &str) -> Node {
    Node::new(id, "core.division", id)
        .with_inputs(vec![
            NodeInput::new("a", PT::Number).required(),
            NodeInput::new("b", PT::Number).required(),
        ])
        .with_outputs(vec![NodeOutput::new("result", PT::Number)])
}

fn conditional_fork(id: &str) -> Node {
    Node::new(id, "core.conditionalFork", id)
        .with_inputs(vec![NodeInput::new("condition", PT::Boolean).required(), NodeInput::new("value", PT::Any)])
        .with_outputs(vec![NodeOutput::new("true", PT::Any), NodeOutput::new("false", PT::Any)])
}

async fn run(workflow: Workflow, credits: Arc<InMemoryCreditService>) -> flowgraph_model::WorkflowExecution {
    let registry = registry();
    let object_store = ObjectStore::in_memory();
    let execution_store = Arc::new(InMemoryExecutionStore::new());
    let runtime = Runtime::new(&registry, &object_store, credits, execution_store);
    runtime
        .run(RuntimeParams::new(workflow, "org-1"), "e1", CancellationToken::new())
        .await
        .expect("runtime always returns Ok")
}

#[tokio::test]
async fn linear_math_seed_scenario() {
    let workflow = Workflow::new("w1", "h1", "Linear math", TriggerType::Manual)
        .with_nodes(vec![number_input("n1", 10.0), number_input("n2", 5.0), addition("n3")])
        .with_edges(vec![Edge::new("n1", "value", "n3", "a"), Edge::new("n2", "value", "n3", "b")]);

    let execution = run(workflow, Arc::new(InMemoryCreditService::new())).await;

    assert_eq!(execution.status, WorkflowExecutionStatus::Completed);
    for id in ["n1", "n2", "n3"] {
        assert_eq!(execution.node_execution(id).unwrap().status, NodeExecutionStatus::Completed);
    }
    let result = execution.node_execution("n3").unwrap().outputs.get("result").unwrap();
    assert_eq!(result.as_f64(), Some(15.0));
}

#[tokio::test]
async fn division_by_zero_propagates_to_downstream_seed_scenario() {
    let workflow = Workflow::new("w1", "h1", "Division", TriggerType::Manual)
        .with_nodes(vec![
            number_input("n1", 10.0),
            number_input("n2", 0.0),
            division("n3"),
            addition("n4"),
        ])
        .with_edges(vec![
            Edge::new("n1", "value", "n3", "a"),
            Edge::new("n2", "value", "n3", "b"),
            Edge::new("n3", "result", "n4", "a"),
            Edge::new("n1", "value", "n4", "b"),
        ]);

    let execution = run(workflow, Arc::new(InMemoryCreditService::new())).await;

    assert_eq!(execution.status, WorkflowExecutionStatus::Error);
    let n3 = execution.node_execution("n3").unwrap();
    assert_eq!(n3.status, NodeExecutionStatus::Error);
    assert_eq!(n3.error.as_deref(), Some("Division by zero is not allowed"));
    let n4 = execution.node_execution("n4").unwrap();
    assert_eq!(n4.status, NodeExecutionStatus::Error);
    assert!(n4.error.as_deref().unwrap().contains("n3"));
}

#[tokio::test]
async fn conditional_fork_skips_untaken_branch_seed_scenario() {
    let workflow = Workflow::new("w1", "h1", "Conditional fork", TriggerType::Manual)
        .with_nodes(vec![
            boolean_input("n1", false),
            number_input("n2", 7.0),
            conditional_fork("n3"),
            multiplication("n4", 2.0),
            multiplication("n5", 3.0),
        ])
        .with_edges(vec![
            Edge::new("n1", "value", "n3", "condition"),
            Edge::new("n2", "value", "n3", "value"),
            Edge::new("n3", "true", "n4", "a"),
            Edge::new("n3", "false", "n5", "a"),
        ]);

    let execution = run(workflow, Arc::new(InMemoryCreditService::new())).await;

    assert_eq!(execution.status, WorkflowExecutionStatus::Completed);
    assert_eq!(execution.node_execution("n4").unwrap().status, NodeExecutionStatus::Skipped);
    let n5 = execution.node_execution("n5").unwrap();
    assert_eq!(n5.status, NodeExecutionStatus::Completed);
    assert_eq!(n5.outputs.get("result").unwrap().as_f64(), Some(21.0));
}

#[tokio::test]
async fn binary_round_trip_seed_scenario() {
    let node = Node::new("n1", "core.imageEmit", "n1")
        .with_inputs(vec![NodeInput::new("mimeType", PT::String).with_value(WireValue::string("image/png"))])
        .with_outputs(vec![NodeOutput::new("image", PT::Image)]);
    let workflow = Workflow::new("w1", "h1", "Binary round-trip", TriggerType::Manual).with_nodes(vec![node]);

    let registry = registry();
    let object_store = ObjectStore::in_memory();
    let execution_store = Arc::new(InMemoryExecutionStore::new());
    let runtime = Runtime::new(&registry, &object_store, Arc::new(InMemoryCreditService::new()), execution_store);
    let execution = runtime
        .run(RuntimeParams::new(workflow, "org-1"), "e1", CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(execution.status, WorkflowExecutionStatus::Completed);
    let wire = execution.node_execution("n1").unwrap().outputs.get("image").unwrap();
    let reference = wire.as_object_reference().expect("image output should be a wire object reference");
    assert_eq!(reference.mime_type, "image/png");

    let record = object_store.read_object(reference).await.unwrap();
    assert_eq!(record.data, vec![0x89u8; 100]);
    assert_eq!(record.metadata.execution_id.as_deref(), Some("e1"));
}

#[tokio::test]
async fn cycle_detection_refuses_to_start_seed_scenario() {
    let make = |id: &str| {
        Node::new(id, "core.numberInput", id)
            .with_inputs(vec![NodeInput::new("value", PT::Number).required()])
            .with_outputs(vec![NodeOutput::new("value", PT::Number)])
    };
    let workflow = Workflow::new("w1", "h1", "Cyclic", TriggerType::Manual)
        .with_nodes(vec![make("a"), make("b"), make("c")])
        .with_edges(vec![
            Edge::new("a", "value", "b", "value"),
            Edge::new("b", "value", "c", "value"),
            Edge::new("c", "value", "a", "value"),
        ]);

    let execution = run(workflow, Arc::new(InMemoryCreditService::new())).await;

    assert_eq!(execution.status, WorkflowExecutionStatus::Error);
    assert!(execution.node_executions.is_empty());
    assert!(execution.error.as_deref().unwrap().contains("cycle"));
}

#[tokio::test]
async fn cancellation_aborts_the_run_seed_scenario() {
    let node = Node::new("n1", "core.delay", "n1")
        .with_inputs(vec![NodeInput::new("millis", PT::Number).with_value(WireValue::number(60_000.0))])
        .with_outputs(vec![]);
    let workflow = Workflow::new("w1", "h1", "Long-running", TriggerType::Manual).with_nodes(vec![node]);

    let registry = registry();
    let object_store = ObjectStore::in_memory();
    let execution_store = Arc::new(InMemoryExecutionStore::new());
    let credits = Arc::new(InMemoryCreditService::with_balance("org-1", 100));
    let runtime = Runtime::new(&registry, &object_store, credits.clone(), execution_store);

    let cancellation = CancellationToken::new();
    let cancel_handle = cancellation.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_handle.cancel();
    });

    let execution = runtime
        .run(RuntimeParams::new(workflow, "org-1"), "e1", cancellation)
        .await
        .unwrap();

    assert_eq!(execution.status, WorkflowExecutionStatus::Error);
    assert_eq!(execution.error.as_deref(), Some("aborted"));
    assert_eq!(credits.balance("org-1"), 100 - execution.total_usage());
}
