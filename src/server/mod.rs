//! Axum-based HTTP server for speech-gateway.
//!
//! This module dials the backend, mounts the gateway behind an axum router
//! and serves it until Ctrl+C or SIGTERM.
//!
//! # Components
//!
//! - `handlers`: The catch-all handler that hands requests to the gateway.
//! - `middleware`: Request ID tracking.
//! - `routes`: The router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use routes::{create_router, AppState};

use crate::backend::dial;
use crate::config::AppConfig;
use crate::error::Result;
use crate::gateway::new_gateway;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

/// Dial the backend and serve the gateway on the configured address.
pub async fn run(config: AppConfig) -> Result<()> {
    let channel = dial(&config.backend)?;

    let default_timeout = match config.backend.request_timeout_seconds {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };
    let gateway = new_gateway(channel)?.with_default_timeout(default_timeout);
    let app = create_router(&config, gateway)?;

    let addr = config.server.bind_addr();
    info!("Starting server on {}", addr);
    let listener = TcpListener::bind(&addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
