//! Planning Poker Room Service
//!
//! Serves the real-time WebSocket channel, the room code endpoint, health
//! probes and Prometheus metrics from a single listener.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment
//! 2. Initialize Prometheus metrics recorder
//! 3. Initialize actor system (`RoomControllerHandle`)
//! 4. Bind the listener and mark the service ready
//! 5. Serve until SIGTERM or Ctrl+C
//!
//! # Shutdown Flow
//!
//! 1. Mark not ready so new sockets go elsewhere
//! 2. Shut down the actor tree (connections receive a close frame)
//! 3. Stop the HTTP server

#![warn(clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use poker_service::actors::{ActorMetrics, RoomControllerHandle};
use poker_service::config::Config;
use poker_service::gateway::{build_router, AppState};
use poker_service::observability::{init_metrics_recorder, HealthState};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "poker_service=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Poker Service");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(
        instance_id = %config.instance_id,
        bind_address = %config.bind_address,
        socket_path = %config.socket_path,
        max_rooms = config.max_rooms,
        connection_buffer = config.connection_buffer,
        shutdown_grace_seconds = config.shutdown_grace_seconds,
        "Configuration loaded successfully"
    );

    // Must happen before any metrics are recorded
    let prometheus_handle = init_metrics_recorder().map_err(|e| {
        error!(error = %e, "Failed to install Prometheus metrics recorder");
        e
    })?;

    let health_state = Arc::new(HealthState::new());
    let actor_metrics = ActorMetrics::new();

    let controller = RoomControllerHandle::new(
        config.instance_id.clone(),
        config.max_rooms,
        Arc::clone(&actor_metrics),
    );
    info!("Actor system initialized");

    let state = AppState {
        controller: controller.clone(),
        health: Arc::clone(&health_state),
        metrics: actor_metrics,
        connection_buffer: config.connection_buffer,
    };
    let app = build_router(state, &config.socket_path, prometheus_handle);

    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(error = %e, addr = %config.bind_address, "Invalid bind address");
        format!("Invalid bind address: {e}")
    })?;

    // Bind before marking ready to fail fast on bind errors
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind listener");
        format!("Failed to bind listener to {addr}: {e}")
    })?;
    health_state.set_ready();
    info!(addr = %addr, socket_path = %config.socket_path, "Poker Service listening");

    let shutdown_health = Arc::clone(&health_state);
    let shutdown_controller = controller.clone();
    let grace = config.shutdown_grace();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("Shutdown signal received, initiating graceful shutdown...");

            // Mark as not ready immediately so traffic drains
            shutdown_health.set_not_ready();

            // Cancels every connection, so upgraded sockets let the server finish
            if let Err(e) = shutdown_controller.shutdown(grace).await {
                warn!(error = %e, "Actor system shutdown error");
            }
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Server failed");
            e
        })?;

    info!("Poker Service shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation failure is unrecoverable"
        )]
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        #[expect(
            clippy::expect_used,
            reason = "Signal handler installation failure is unrecoverable"
        )]
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
