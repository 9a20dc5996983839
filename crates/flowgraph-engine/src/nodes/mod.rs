//! The built-in `core.*` node catalog (§4.3.1 of SPEC_FULL.md).
//!
//! Individual node families (CSV, geo, image processing, LLM, HTTP
//! collaborator nodes, ...) are explicitly out of scope; this catalog exists
//! only to exercise the scheduler's invariants and the seed test scenarios.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flowgraph_model::{BinaryData, EngineValue, Node};

use crate::registry::{NodeContext, NodeDescriptor, NodeExecutable, NodeRegistry, NodeResult, ParameterSlot};
use flowgraph_model::ParameterType as PT;

struct ValueInputNode;

#[async_trait]
impl NodeExecutable for ValueInputNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let value = ctx.input("value").cloned().unwrap_or_else(EngineValue::null);
        let mut outputs = HashMap::new();
        outputs.insert("value".to_string(), value);
        Ok(outputs)
    }
}

fn require_number(ctx: &NodeContext, name: &str) -> Result<f64, String> {
    ctx.input(name)
        .and_then(EngineValue::as_f64)
        .ok_or_else(|| format!("missing or non-numeric input '{name}'"))
}

struct AdditionNode;

#[async_trait]
impl NodeExecutable for AdditionNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let a = require_number(&ctx, "a")?;
        let b = require_number(&ctx, "b")?;
        let mut outputs = HashMap::new();
        outputs.insert("result".to_string(), EngineValue::number(a + b));
        Ok(outputs)
    }
}

struct MultiplicationNode;

#[async_trait]
impl NodeExecutable for MultiplicationNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let a = require_number(&ctx, "a")?;
        let b = require_number(&ctx, "b")?;
        let mut outputs = HashMap::new();
        outputs.insert("result".to_string(), EngineValue::number(a * b));
        Ok(outputs)
    }
}

struct DivisionNode;

#[async_trait]
impl NodeExecutable for DivisionNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let a = require_number(&ctx, "a")?;
        let b = require_number(&ctx, "b")?;
        if b == 0.0 {
            return Err("Division by zero is not allowed".to_string());
        }
        let mut outputs = HashMap::new();
        outputs.insert("result".to_string(), EngineValue::number(a / b));
        Ok(outputs)
    }
}

/// The scheduler-aware conditional fork primitive (§4.5). Emits exactly one
/// of `true`/`false`; the scheduler interprets the absent output as a skip
/// signal for whatever is wired to it.
pub struct ConditionalForkNode;

#[async_trait]
impl NodeExecutable for ConditionalForkNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let condition = ctx
            .input("condition")
            .and_then(EngineValue::as_bool)
            .ok_or_else(|| "missing or non-boolean input 'condition'".to_string())?;
        let value = ctx.input("value").cloned().unwrap_or_else(EngineValue::null);

        let mut outputs = HashMap::new();
        if condition {
            outputs.insert("true".to_string(), value);
        } else {
            outputs.insert("false".to_string(), value);
        }
        Ok(outputs)
    }
}

/// The scheduler-aware conditional join primitive (§4.5). Forwards whichever
/// of `true`/`false` the scheduler resolved as bound.
pub struct ConditionalJoinNode;

#[async_trait]
impl NodeExecutable for ConditionalJoinNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let value = ctx
            .input("true")
            .or_else(|| ctx.input("false"))
            .cloned()
            .ok_or_else(|| "conditional join had neither input bound".to_string())?;
        let mut outputs = HashMap::new();
        outputs.insert("value".to_string(), value);
        Ok(outputs)
    }
}

struct DelayNode;

#[async_trait]
impl NodeExecutable for DelayNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let millis = ctx.input("millis").and_then(EngineValue::as_f64).unwrap_or(1000.0);
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_millis(millis as u64)) => Ok(HashMap::new()),
            _ = ctx.cancellation.cancelled() => Err("aborted".to_string()),
        }
    }
}

struct ImageEmitNode;

#[async_trait]
impl NodeExecutable for ImageEmitNode {
    async fn execute(&self, ctx: NodeContext) -> NodeResult {
        let mime_type = ctx
            .input("mimeType")
            .and_then(|v| match v {
                EngineValue::Json(serde_json::Value::String(s)) => Some(s.clone()),
                _ => None,
            })
            .unwrap_or_else(|| "image/png".to_string());

        // A fixed-length stand-in payload; the node catalog for real image
        // encoders is out of scope here, only the binary plumbing is tested.
        let data = vec![0x89u8; 100];

        let mut outputs = HashMap::new();
        outputs.insert("image".to_string(), EngineValue::Binary(BinaryData { data, mime_type }));
        Ok(outputs)
    }
}

fn executable_factory<N: NodeExecutable + Default + 'static>() -> Arc<dyn crate::registry::NodeFactory> {
    Arc::new(move |_node: &Node| Box::new(N::default()) as Box<dyn NodeExecutable>)
}

macro_rules! unit_default {
    ($ty:ty) => {
        impl Default for $ty {
            fn default() -> Self {
                $ty
            }
        }
    };
}

unit_default!(ValueInputNode);
unit_default!(AdditionNode);
unit_default!(MultiplicationNode);
unit_default!(DivisionNode);
unit_default!(ConditionalForkNode);
unit_default!(ConditionalJoinNode);
unit_default!(DelayNode);
unit_default!(ImageEmitNode);

/// Registers every `core.*` node type with its descriptor and factory.
pub fn register_builtins(registry: &mut NodeRegistry) {
    registry.register(
        NodeDescriptor::new("core.numberInput", "Number")
            .description("A literal number value.")
            .inputs(vec![ParameterSlot::new("value", PT::Number).required()])
            .outputs(vec![ParameterSlot::new("value", PT::Number)]),
        executable_factory::<ValueInputNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.booleanInput", "Boolean")
            .description("A literal boolean value.")
            .inputs(vec![ParameterSlot::new("value", PT::Boolean).required()])
            .outputs(vec![ParameterSlot::new("value", PT::Boolean)]),
        executable_factory::<ValueInputNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.stringInput", "String")
            .description("A literal string value.")
            .inputs(vec![ParameterSlot::new("value", PT::String).required()])
            .outputs(vec![ParameterSlot::new("value", PT::String)]),
        executable_factory::<ValueInputNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.addition", "Add")
            .description("a + b")
            .inputs(vec![
                ParameterSlot::new("a", PT::Number).required(),
                ParameterSlot::new("b", PT::Number).required(),
            ])
            .outputs(vec![ParameterSlot::new("result", PT::Number)]),
        executable_factory::<AdditionNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.multiplication", "Multiply")
            .description("a * b")
            .inputs(vec![
                ParameterSlot::new("a", PT::Number).required(),
                ParameterSlot::new("b", PT::Number).required(),
            ])
            .outputs(vec![ParameterSlot::new("result", PT::Number)]),
        executable_factory::<MultiplicationNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.division", "Divide")
            .description("a / b; errors on division by zero.")
            .inputs(vec![
                ParameterSlot::new("a", PT::Number).required(),
                ParameterSlot::new("b", PT::Number).required(),
            ])
            .outputs(vec![ParameterSlot::new("result", PT::Number)]),
        executable_factory::<DivisionNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.conditionalFork", "Conditional Fork")
            .description("Routes `value` to `true` or `false` based on `condition`.")
            .inputs(vec![
                ParameterSlot::new("condition", PT::Boolean).required(),
                ParameterSlot::new("value", PT::Any),
            ])
            .outputs(vec![
                ParameterSlot::new("true", PT::Any),
                ParameterSlot::new("false", PT::Any),
            ]),
        executable_factory::<ConditionalForkNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.conditionalJoin", "Conditional Join")
            .description("Forwards whichever of `true`/`false` is bound.")
            .inputs(vec![ParameterSlot::new("true", PT::Any), ParameterSlot::new("false", PT::Any)])
            .outputs(vec![ParameterSlot::new("value", PT::Any)]),
        executable_factory::<ConditionalJoinNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.delay", "Delay")
            .description("Sleeps for `millis`, honoring cancellation.")
            .compute_cost(1)
            .inputs(vec![ParameterSlot::new("millis", PT::Number)])
            .outputs(vec![]),
        executable_factory::<DelayNode>(),
    );

    registry.register(
        NodeDescriptor::new("core.imageEmit", "Emit image")
            .description("Emits a fixed-size binary payload for round-trip testing.")
            .inputs(vec![ParameterSlot::new("mimeType", PT::String)])
            .outputs(vec![ParameterSlot::new("image", PT::Image)]),
        executable_factory::<ImageEmitNode>(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NodeContextBuilder;

    #[tokio::test]
    async fn division_by_zero_is_a_node_error() {
        let mut inputs = HashMap::new();
        inputs.insert("a".to_string(), EngineValue::number(10.0));
        inputs.insert("b".to_string(), EngineValue::number(0.0));
        let ctx = NodeContextBuilder::new("n3", "w1", "org-1").inputs(inputs).build();

        let err = DivisionNode.execute(ctx).await.unwrap_err();
        assert_eq!(err, "Division by zero is not allowed");
    }

    #[tokio::test]
    async fn conditional_fork_emits_exactly_one_output() {
        let mut inputs = HashMap::new();
        inputs.insert("condition".to_string(), EngineValue::boolean(false));
        inputs.insert("value".to_string(), EngineValue::number(7.0));
        let ctx = NodeContextBuilder::new("n3", "w1", "org-1").inputs(inputs).build();

        let outputs = ConditionalForkNode.execute(ctx).await.unwrap();
        assert!(!outputs.contains_key("true"));
        assert_eq!(outputs.get("false").and_then(EngineValue::as_f64), Some(7.0));
    }

    #[test]
    fn builtins_register_without_panicking() {
        let mut registry = NodeRegistry::new();
        register_builtins(&mut registry);
        assert!(registry.is_registered("core.addition"));
        assert!(registry.is_registered("core.conditionalJoin"));
        assert_eq!(registry.list_descriptors().len(), 10);
    }
}
