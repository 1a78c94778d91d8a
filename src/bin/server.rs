//! Task-queue coordination server.
//!
//! Binds the REST API, spawns the lease-expiry sweeper, and shuts down
//! gracefully on ctrl-c.

use anyhow::Context;
use std::sync::Arc;
use taskqueue_core::config::CoreConfig;
use taskqueue_core::web::{self, state::AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    taskqueue_core::logging::init_structured_logging();

    let config = CoreConfig::load().context("failed to load configuration")?;
    let bind_address = config.web.bind_address.clone();
    let state = AppState::build(config);

    let sweeper = Arc::clone(&state.claim_coordinator).spawn_sweeper();

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(address = %bind_address, "task queue server listening");

    axum::serve(listener, web::create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.abort();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
