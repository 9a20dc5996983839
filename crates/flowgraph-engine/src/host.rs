//! Collaborator interfaces the engine consumes but never implements (§6).
//!
//! These are the narrow surfaces a host application wires up: relational
//! lookups on workflows/deployments, secret/integration providers, and the
//! trigger payload shapes seeded into a run. None of this is the engine's
//! concern beyond the trait boundary.

use async_trait::async_trait;
use flowgraph_model::Workflow;
use std::collections::HashMap;

/// A minimal finder over the host's `workflows` table. The engine never
/// performs CRUD beyond lookups.
#[async_trait]
pub trait WorkflowFinder: Send + Sync {
    async fn find_workflow(&self, id: &str, organization_id: &str) -> Option<Workflow>;
}

/// A minimal finder over the host's `deployments` table.
#[async_trait]
pub trait DeploymentFinder: Send + Sync {
    async fn find_deployment_workflow(&self, deployment_id: &str, organization_id: &str) -> Option<Workflow>;
}

/// Per-node secret lookup, passed into every node's `context`.
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, name: &str) -> Option<String>;
}

/// Details of a configured third-party integration.
#[derive(Debug, Clone)]
pub struct IntegrationInfo {
    pub id: String,
    pub kind: String,
    pub config: HashMap<String, String>,
}

/// Per-node integration lookup, passed into every node's `context`.
/// Unlike `SecretProvider`, an unavailable integration is an error, not an
/// absent value (§4.3).
#[async_trait]
pub trait IntegrationProvider: Send + Sync {
    async fn get_integration(&self, id: &str) -> Result<IntegrationInfo, String>;
}

/// A no-op pair used when a host has nothing to wire up (tests, and any
/// workflow that does not reference secrets/integrations).
pub struct NoSecrets;

#[async_trait]
impl SecretProvider for NoSecrets {
    async fn get_secret(&self, _name: &str) -> Option<String> {
        None
    }
}

pub struct NoIntegrations;

#[async_trait]
impl IntegrationProvider for NoIntegrations {
    async fn get_integration(&self, id: &str) -> Result<IntegrationInfo, String> {
        Err(format!("no integration configured: {id}"))
    }
}

/// The inbound HTTP request that triggered an `http_request`/`http_webhook`
/// workflow.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestPayload {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// The inbound email that triggered an `email_message` workflow.
#[derive(Debug, Clone, Default)]
pub struct EmailMessagePayload {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// The inbound queue message that triggered a `queue_message` workflow.
#[derive(Debug, Clone, Default)]
pub struct QueueMessagePayload {
    pub body: Vec<u8>,
}
