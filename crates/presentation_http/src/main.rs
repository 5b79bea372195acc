//! API starter HTTP server
//!
//! Main entry point for the HTTP API server.

use std::{future::IntoFuture, sync::Arc, time::Duration};

use infrastructure::{AppConfig, init_tracing};
use presentation_http::{
    RateLimiterState,
    middleware::spawn_sweep_task,
    routes::{create_app, rate_limiter_config},
    state::AppState,
};
use tokio::{net::TcpListener, signal, sync::Notify};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_tracing(config.log_format)?;

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!(
        env = %config.app_env,
        host = %config.host,
        port = config.port,
        rate_limit_enabled = config.rate_limit_enabled,
        auth_configured = config.auth_token().is_some(),
        "Configuration loaded"
    );

    let state = AppState::in_memory(config.clone());

    let limiter_config = rate_limiter_config(&state);
    let rate_limiter = Arc::new(RateLimiterState::new(
        limiter_config.points,
        limiter_config.window,
    ));
    let sweeper = (limiter_config.enabled && config.rate_limit_sweep_secs > 0).then(|| {
        spawn_sweep_task(
            Arc::clone(&rate_limiter),
            Duration::from_secs(config.rate_limit_sweep_secs),
        )
    });

    let app = create_app(state, rate_limiter);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!("API docs: http://{}/api/v1/redoc", addr);

    let shutdown_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let draining = Arc::new(Notify::new());
    let signalled = Arc::clone(&draining);
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        signalled.notify_one();
    });

    tokio::select! {
        result = server.into_future() => result?,
        () = async {
            draining.notified().await;
            info!("Waiting up to {:?} for connections to close...", shutdown_timeout);
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            warn!(?shutdown_timeout, "Connections did not drain in time, exiting");
        }
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }

    info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
