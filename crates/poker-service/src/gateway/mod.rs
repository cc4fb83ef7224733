//! HTTP and WebSocket surface.
//!
//! Defines the Axum router and application state. Everything is served from
//! one listener:
//!
//! - `<socket_path>` - WebSocket upgrade for the real-time channel
//! - `POST /api/rooms` - allocate an unused room code
//! - `GET /api/rooms/:room_id` - snapshot of a live room
//! - `/health`, `/ready` - probes
//! - `/metrics` - Prometheus text

pub mod rooms;
pub mod socket;

use crate::actors::{ActorMetrics, RoomControllerHandle};
use crate::observability::{health_router, HealthState};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub controller: RoomControllerHandle,
    pub health: Arc<HealthState>,
    pub metrics: Arc<ActorMetrics>,
    /// Outbound mailbox size for each new connection.
    pub connection_buffer: usize,
}

/// Build the application routes.
///
/// CORS is permissive: browsers on any origin may open the socket.
pub fn build_router(state: AppState, socket_path: &str, metrics_handle: PrometheusHandle) -> Router {
    let health = Arc::clone(&state.health);

    let api_routes = Router::new()
        .route(socket_path, get(socket::socket_handler))
        .route("/api/rooms", post(rooms::create_room))
        .route("/api/rooms/:room_id", get(rooms::get_room))
        .with_state(state);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics_handle);

    api_routes
        .merge(health_router(health))
        .merge(metrics_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn metrics_handler(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
