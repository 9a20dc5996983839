//! The workflow graph itself: trigger type, nodes, and edges.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::node::Node;

/// How a workflow is triggered externally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Manual,
    HttpWebhook,
    HttpRequest,
    EmailMessage,
    Scheduled,
    QueueMessage,
}

impl FromStr for TriggerType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(TriggerType::Manual),
            "http_webhook" => Ok(TriggerType::HttpWebhook),
            "http_request" => Ok(TriggerType::HttpRequest),
            "email_message" => Ok(TriggerType::EmailMessage),
            "scheduled" => Ok(TriggerType::Scheduled),
            "queue_message" => Ok(TriggerType::QueueMessage),
            other => Err(ModelError::UnknownTriggerType(other.to_string())),
        }
    }
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Manual => "manual",
            TriggerType::HttpWebhook => "http_webhook",
            TriggerType::HttpRequest => "http_request",
            TriggerType::EmailMessage => "email_message",
            TriggerType::Scheduled => "scheduled",
            TriggerType::QueueMessage => "queue_message",
        }
    }
}

impl std::fmt::Display for TriggerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed link carrying one node's output to another node's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source_node_id: String,
    pub source_output: String,
    pub target_node_id: String,
    pub target_input: String,
}

impl Edge {
    pub fn new(
        source_node_id: impl Into<String>,
        source_output: impl Into<String>,
        target_node_id: impl Into<String>,
        target_input: impl Into<String>,
    ) -> Self {
        Self {
            source_node_id: source_node_id.into(),
            source_output: source_output.into(),
            target_node_id: target_node_id.into(),
            target_input: target_input.into(),
        }
    }
}

/// An immutable (per execution) workflow graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub handle: String,
    pub name: String,
    pub trigger_type: TriggerType,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Workflow {
    pub fn new(
        id: impl Into<String>,
        handle: impl Into<String>,
        name: impl Into<String>,
        trigger_type: TriggerType,
    ) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            name: name.into(),
            trigger_type,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<Node>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }

    /// Index nodes by id. Later duplicates win, matching how the runtime
    /// would see them if the host allowed a malformed graph through; the
    /// validator is what actually rejects dangling/duplicate references.
    pub fn node_index(&self) -> HashMap<&str, &Node> {
        self.nodes.iter().map(|n| (n.id.as_str(), n)).collect()
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges whose target is the given node and input name.
    pub fn edges_into(&self, node_id: &str, input_name: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.target_node_id == node_id && e.target_input == input_name)
            .collect()
    }

    /// Edges whose source is the given node and output name.
    pub fn edges_from(&self, node_id: &str, output_name: &str) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| e.source_node_id == node_id && e.source_output == output_name)
            .collect()
    }
}
