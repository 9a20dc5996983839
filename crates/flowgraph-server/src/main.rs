//! Binary entry point: wires the engine's `Runtime` to a minimal HTTP
//! surface (a health check and a synchronous "run this workflow" endpoint).
//! Everything else an n8n-shaped deployment needs — auth, workflow/deployment
//! CRUD, webhook routing — lives on the host side of the collaborator traits
//! in `flowgraph_engine::host` and is out of scope here.

mod config;
mod routes;
mod state;

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    info!(addr = %config.bind_addr, database = config.database_url.is_some(), "starting flowgraph-server");

    let state = AppState::new(&config).await?;
    let app = routes::router(state);

    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
