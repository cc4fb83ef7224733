//! HTTP route integration tests.
//!
//! Drives the full router with `tower::ServiceExt::oneshot`; no listener is
//! bound.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use metrics_exporter_prometheus::PrometheusBuilder;
use poker_service::actors::RoomControllerHandle;
use poker_service::gateway::{build_router, AppState};
use poker_service::observability::HealthState;
use poker_test_utils::{join, spawn_controller, TestConnection, SCENARIO_ROOM};
use serde_json::Value;
use tower::util::ServiceExt;

struct TestApp {
    router: Router,
    controller: RoomControllerHandle,
    health: Arc<HealthState>,
    metrics: Arc<poker_service::actors::ActorMetrics>,
}

impl TestApp {
    fn new(max_rooms: usize) -> Self {
        let (controller, metrics) = spawn_controller(max_rooms);
        let health = Arc::new(HealthState::new());
        let state = AppState {
            controller: controller.clone(),
            health: Arc::clone(&health),
            metrics: Arc::clone(&metrics),
            connection_buffer: 16,
        };
        // Not installed globally, so tests can build as many as they like
        let handle = PrometheusBuilder::new().build_recorder().handle();

        Self {
            router: build_router(state, "/api/socket", handle),
            controller,
            health,
            metrics,
        }
    }

    async fn request(&self, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body.to_vec())
    }

    async fn json(&self, method: Method, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.request(method, uri).await;
        (status, serde_json::from_slice(&body).expect("body should be JSON"))
    }
}

#[tokio::test]
async fn test_create_room_returns_unused_code() {
    let app = TestApp::new(16);

    let (status, body) = app.json(Method::POST, "/api/rooms").await;

    assert_eq!(status, StatusCode::OK);
    let code = body["roomId"].as_str().unwrap();
    assert_eq!(code.len(), 6);
    assert!(code
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));

    app.controller.cancel();
}

#[tokio::test]
async fn test_create_room_at_capacity_is_unavailable() {
    let app = TestApp::new(1);
    let alice = TestConnection::new("conn-alice", &app.metrics);
    app.controller
        .dispatch(alice.handle(), SCENARIO_ROOM.to_string(), join("Alice"))
        .await
        .unwrap();

    let (status, body) = app.json(Method::POST, "/api/rooms").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "CAPACITY_EXCEEDED");
    assert_eq!(body["error"]["retryable"], true);

    app.controller.cancel();
}

#[tokio::test]
async fn test_get_room_snapshot() {
    let app = TestApp::new(16);
    let alice = TestConnection::new("conn-alice", &app.metrics);
    app.controller
        .dispatch(alice.handle(), SCENARIO_ROOM.to_string(), join("Alice"))
        .await
        .unwrap();

    let (status, body) = app
        .json(Method::GET, &format!("/api/rooms/{SCENARIO_ROOM}"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], SCENARIO_ROOM);
    assert_eq!(body["host"]["id"], "conn-alice");
    assert_eq!(body["host"]["socketId"], "conn-alice");
    assert_eq!(body["users"].as_array().unwrap().len(), 1);
    assert!(body.get("currentVotingSession").is_none());

    app.controller.cancel();
}

#[tokio::test]
async fn test_get_missing_room_is_not_found() {
    let app = TestApp::new(16);

    let (status, body) = app.json(Method::GET, "/api/rooms/NOPE42").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["retryable"], false);

    app.controller.cancel();
}

#[tokio::test]
async fn test_probes_follow_health_state() {
    let app = TestApp::new(16);

    let (status, _) = app.request(Method::GET, "/health").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.request(Method::GET, "/ready").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    app.health.set_ready();
    let (status, _) = app.request(Method::GET, "/ready").await;
    assert_eq!(status, StatusCode::OK);

    app.controller.cancel();
}

#[tokio::test]
async fn test_metrics_endpoint_renders_text() {
    let app = TestApp::new(16);

    let (status, body) = app.request(Method::GET, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).is_ok());

    app.controller.cancel();
}

#[tokio::test]
async fn test_socket_route_requires_upgrade() {
    let app = TestApp::new(16);

    let (status, _) = app.request(Method::GET, "/api/socket").await;

    assert!(status.is_client_error(), "plain GET should be rejected, got {status}");

    app.controller.cancel();
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = TestApp::new(16);

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/rooms")
        .header(header::ORIGIN, "http://example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .expect("Failed to build request");

    let response = app.router.clone().oneshot(request).await.unwrap();

    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));

    app.controller.cancel();
}
