//! The minimal HTTP surface: a health check and a synchronous execution
//! endpoint. Request validation, auth, and workflow/deployment lookup are
//! host concerns the real deployment wires in front of this binary.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use flowgraph_engine::{Runtime, RuntimeConfig, RuntimeParams};
use flowgraph_model::Workflow;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/executions", post(run_execution))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunExecutionRequest {
    workflow: Workflow,
    organization_id: String,
    #[serde(default = "default_true")]
    compute_credits: bool,
}

fn default_true() -> bool {
    true
}

async fn run_execution(State(state): State<AppState>, Json(request): Json<RunExecutionRequest>) -> impl IntoResponse {
    let mut params = RuntimeParams::new(request.workflow, request.organization_id);
    params.compute_credits = request.compute_credits;

    let runtime = Runtime::new(
        &state.registry,
        &state.object_store,
        state.credit_service.clone(),
        state.execution_store.clone(),
    )
    .with_config(RuntimeConfig::from_env());

    let execution_id = uuid::Uuid::now_v7().to_string();
    let execution = runtime.run(params, execution_id, CancellationToken::new()).await;

    match execution {
        Ok(execution) => (StatusCode::OK, Json(execution)).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}
