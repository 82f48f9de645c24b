use std::env;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use admitflow_backend::core;
use admitflow_backend::server;
use admitflow_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let state = AppState::initialize().await?;
    core::logging::init(&state.paths);

    match state.llm.health_check().await {
        Ok(true) => tracing::info!("LLM provider reachable"),
        _ => tracing::warn!("LLM provider unreachable; chat turns will degrade until it recovers"),
    }

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.config.server.port);
    let bind_addr = format!("0.0.0.0:{}", port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state.clone());

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
