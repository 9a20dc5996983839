//! Validator (C4): pure static checks on a workflow graph, per §4.4.

use std::collections::HashMap;

use flowgraph_model::Workflow;
use serde::{Deserialize, Serialize};

use crate::registry::NodeRegistry;

/// One validation failure. `validate` accumulates every error it finds
/// rather than stopping at the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ValidationError {
    #[serde(rename_all = "camelCase")]
    CycleDetected { node_id: String },
    #[serde(rename_all = "camelCase")]
    TypeMismatch {
        source_node_id: String,
        source_output: String,
        target_node_id: String,
        target_input: String,
    },
    #[serde(rename_all = "camelCase")]
    InvalidConnection { message: String },
    #[serde(rename_all = "camelCase")]
    DuplicateConnection { target_node_id: String, target_input: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::CycleDetected { node_id } => write!(f, "cycle detected at node '{node_id}'"),
            ValidationError::TypeMismatch {
                source_node_id,
                source_output,
                target_node_id,
                target_input,
            } => write!(
                f,
                "type mismatch: {source_node_id}.{source_output} -> {target_node_id}.{target_input}"
            ),
            ValidationError::InvalidConnection { message } => write!(f, "invalid connection: {message}"),
            ValidationError::DuplicateConnection {
                target_node_id,
                target_input,
            } => write!(f, "duplicate connection into {target_node_id}.{target_input}"),
        }
    }
}

/// Runs every check in §4.4, in order, accumulating all errors found.
/// Pure: no I/O, no side effects.
pub fn validate(workflow: &Workflow, registry: &NodeRegistry) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let node_index = workflow.node_index();

    // Check 1: every node type is registered.
    for node in &workflow.nodes {
        if !registry.is_registered(&node.node_type) {
            errors.push(ValidationError::InvalidConnection {
                message: format!("node '{}' has unregistered type '{}'", node.id, node.node_type),
            });
        }
    }

    // Check 2: every edge references existing nodes and existing output/input names.
    // Check 3: edge types are compatible.
    for edge in &workflow.edges {
        let source = node_index.get(edge.source_node_id.as_str());
        let target = node_index.get(edge.target_node_id.as_str());

        let (Some(source), Some(target)) = (source, target) else {
            errors.push(ValidationError::InvalidConnection {
                message: format!(
                    "edge references missing node(s): {} -> {}",
                    edge.source_node_id, edge.target_node_id
                ),
            });
            continue;
        };

        let source_output = source.output(&edge.source_output);
        let target_input = target.input(&edge.target_input);

        let (Some(source_output), Some(target_input)) = (source_output, target_input) else {
            errors.push(ValidationError::InvalidConnection {
                message: format!(
                    "edge references missing output/input: {}.{} -> {}.{}",
                    edge.source_node_id, edge.source_output, edge.target_node_id, edge.target_input
                ),
            });
            continue;
        };

        if !target_input.param_type.accepts(source_output.param_type) {
            errors.push(ValidationError::TypeMismatch {
                source_node_id: edge.source_node_id.clone(),
                source_output: edge.source_output.clone(),
                target_node_id: edge.target_node_id.clone(),
                target_input: edge.target_input.clone(),
            });
        }
    }

    // Check 4: no duplicate edges into a non-repeated input.
    let mut incoming_counts: HashMap<(&str, &str), usize> = HashMap::new();
    for edge in &workflow.edges {
        *incoming_counts
            .entry((edge.target_node_id.as_str(), edge.target_input.as_str()))
            .or_insert(0) += 1;
    }
    for ((target_node_id, target_input), count) in &incoming_counts {
        if *count <= 1 {
            continue;
        }
        let Some(node) = node_index.get(*target_node_id) else {
            continue;
        };
        let is_repeated = node.input(target_input).map(|i| i.repeated).unwrap_or(false);
        if !is_repeated {
            errors.push(ValidationError::DuplicateConnection {
                target_node_id: target_node_id.to_string(),
                target_input: target_input.to_string(),
            });
        }
    }

    // Check 5: every required input is literally bound or targeted by an edge.
    for node in &workflow.nodes {
        for input in &node.inputs {
            if !input.required {
                continue;
            }
            let has_literal = input.value.is_some();
            let has_edge = workflow
                .edges
                .iter()
                .any(|e| e.target_node_id == node.id && e.target_input == input.name);
            if !has_literal && !has_edge {
                errors.push(ValidationError::InvalidConnection {
                    message: format!("required input '{}' on node '{}' is unbound", input.name, node.id),
                });
            }
        }
    }

    // Check 6: cycle detection via DFS with a recursion stack.
    if let Some(node_id) = find_cycle(workflow) {
        errors.push(ValidationError::CycleDetected { node_id });
    }

    errors
}

fn find_cycle(workflow: &Workflow) -> Option<String> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &workflow.edges {
        children
            .entry(edge.source_node_id.as_str())
            .or_default()
            .push(edge.target_node_id.as_str());
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        node_id: &'a str,
        children: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
        stack: &mut Vec<&'a str>,
    ) -> Option<String> {
        match marks.get(node_id) {
            Some(Mark::Done) => return None,
            Some(Mark::Visiting) => return Some(node_id.to_string()),
            None => {}
        }
        marks.insert(node_id, Mark::Visiting);
        stack.push(node_id);
        if let Some(next) = children.get(node_id) {
            for &child in next {
                if let Some(cycle_node) = visit(child, children, marks, stack) {
                    return Some(cycle_node);
                }
            }
        }
        stack.pop();
        marks.insert(node_id, Mark::Done);
        None
    }

    let mut stack = Vec::new();
    for node in &workflow.nodes {
        if let Some(cycle_node) = visit(&node.id, &children, &mut marks, &mut stack) {
            return Some(cycle_node);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::register_builtins;
    use flowgraph_model::{Edge, Node, NodeInput, NodeOutput, ParameterType, TriggerType, WireValue, Workflow};

    fn registry() -> NodeRegistry {
        let mut r = NodeRegistry::new();
        register_builtins(&mut r);
        r
    }

    #[test]
    fn cycle_is_detected() {
        let nodes = vec![
            Node::new("a", "core.numberInput", "A")
                .with_inputs(vec![NodeInput::new("value", ParameterType::Number).required()])
                .with_outputs(vec![NodeOutput::new("value", ParameterType::Number)]),
            Node::new("b", "core.numberInput", "B")
                .with_inputs(vec![NodeInput::new("value", ParameterType::Number).required()])
                .with_outputs(vec![NodeOutput::new("value", ParameterType::Number)]),
            Node::new("c", "core.numberInput", "C")
                .with_inputs(vec![NodeInput::new("value", ParameterType::Number).required()])
                .with_outputs(vec![NodeOutput::new("value", ParameterType::Number)]),
        ];
        let edges = vec![
            Edge::new("a", "value", "b", "value"),
            Edge::new("b", "value", "c", "value"),
            Edge::new("c", "value", "a", "value"),
        ];
        let workflow = Workflow::new("w1", "h1", "Cyclic", TriggerType::Manual)
            .with_nodes(nodes)
            .with_edges(edges);

        let errors = validate(&workflow, &registry());
        assert!(errors.iter().any(|e| matches!(e, ValidationError::CycleDetected { .. })));
    }

    #[test]
    fn unregistered_node_type_is_reported() {
        let workflow = Workflow::new("w1", "h1", "Bad", TriggerType::Manual)
            .with_nodes(vec![Node::new("a", "core.doesNotExist", "A")]);
        let errors = validate(&workflow, &registry());
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn validate_is_pure_and_deterministic() {
        let workflow = Workflow::new("w1", "h1", "Simple", TriggerType::Manual).with_nodes(vec![Node::new(
            "a",
            "core.numberInput",
            "A",
        )
        .with_inputs(vec![NodeInput::new("value", ParameterType::Number)
            .required()
            .with_value(WireValue::number(1.0))])
        .with_outputs(vec![NodeOutput::new("value", ParameterType::Number)])]);

        let first = validate(&workflow, &registry());
        let second = validate(&workflow, &registry());
        assert_eq!(first, second);
        assert!(first.is_empty());
    }
}
