//! Clinica server entry point
//!
//! Loads configuration, sets up logging, connects the store and serves the
//! REST API until SIGINT/SIGTERM.

use anyhow::Context;
use clinica::{api::create_router, config::Config, logging, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;

    let _logging_guard =
        logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.logging.deployment_environment,
        "Starting Clinica server"
    );

    let addr = config
        .socket_addr()
        .context("Failed to determine socket address")?;
    tracing::info!(
        listen_addr = %addr,
        memory_store = config.database.is_memory(),
        "Configuration loaded"
    );

    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind TCP listener on {addr}"))?;
    tracing::info!("Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server terminated unexpectedly");
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let sigint = tokio::signal::ctrl_c();
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigint => tracing::info!("SIGINT received, shutting down"),
                _ = sigterm.recv() => tracing::info!("SIGTERM received, shutting down"),
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable; waiting for SIGINT only");
            if let Err(e) = sigint.await {
                tracing::error!(error = %e, "Failed to listen for SIGINT");
            }
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for CTRL+C");
    }
    tracing::info!("Shutdown signal received, shutting down");
}
