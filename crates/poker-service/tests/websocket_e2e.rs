//! End-to-end tests over a real WebSocket.
//!
//! Binds the full router on an ephemeral port and talks to it with
//! `tokio-tungstenite` clients.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::float_cmp,
    clippy::indexing_slicing
)]

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;
use poker_service::actors::{ActorMetrics, RoomControllerHandle};
use poker_service::gateway::{build_router, AppState};
use poker_service::observability::HealthState;
use poker_test_utils::{spawn_controller, WsTestClient, SCENARIO_ROOM};
use serde_json::json;

struct TestServer {
    url: String,
    controller: RoomControllerHandle,
    metrics: Arc<ActorMetrics>,
}

impl TestServer {
    async fn spawn() -> Self {
        let (controller, metrics) = spawn_controller(16);
        let state = AppState {
            controller: controller.clone(),
            health: Arc::new(HealthState::new()),
            metrics: Arc::clone(&metrics),
            connection_buffer: 64,
        };
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let app = build_router(state, "/api/socket", handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("ws://{addr}/api/socket"),
            controller,
            metrics,
        }
    }

    async fn client(&self) -> WsTestClient {
        WsTestClient::connect(&self.url).await
    }
}

#[tokio::test]
async fn test_connected_frame_carries_unique_ids() {
    let server = TestServer::spawn().await;

    let alice = server.client().await;
    let bob = server.client().await;

    assert!(!alice.id.is_empty());
    assert_ne!(alice.id, bob.id);

    server.controller.cancel();
}

#[tokio::test]
async fn test_estimation_round_over_the_wire() {
    let server = TestServer::spawn().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;

    alice
        .send("joinRoom", json!({"roomId": SCENARIO_ROOM, "userName": "Alice"}))
        .await;
    let room = alice.expect_event("roomJoined").await;
    assert_eq!(room["host"]["socketId"], alice.id.as_str());
    assert_eq!(room["users"][0]["isHost"], true);

    bob.send("joinRoom", json!({"roomId": SCENARIO_ROOM, "userName": "Bob"}))
        .await;
    let room = bob.expect_event("roomJoined").await;
    assert_eq!(room["users"][1]["name"], "Bob");
    assert_eq!(room["users"][1]["isHost"], false);
    let user = alice.expect_event("userJoined").await;
    assert_eq!(user["id"], bob.id.as_str());
    alice.expect_event("roomUpdated").await;

    alice.send("startVoting", json!(SCENARIO_ROOM)).await;
    for client in [&mut alice, &mut bob] {
        let session = client.expect_event("votingStarted").await;
        assert_eq!(session["isActive"], true);
        assert_eq!(session["id"].as_str().unwrap().len(), 6);
        client.expect_event("roomUpdated").await;
    }

    alice
        .send("submitVote", json!({"roomId": SCENARIO_ROOM, "value": 5}))
        .await;
    for client in [&mut alice, &mut bob] {
        let vote = client.expect_event("voteReceived").await;
        assert_eq!(vote["value"], 5);
        assert_eq!(vote["userName"], "Alice");
        client.expect_event("roomUpdated").await;
    }

    bob.send("submitVote", json!({"roomId": SCENARIO_ROOM, "value": 8}))
        .await;
    for client in [&mut alice, &mut bob] {
        client.expect_event("voteReceived").await;
        client.expect_event("roomUpdated").await;
    }

    alice.send("endVoting", json!(SCENARIO_ROOM)).await;
    for client in [&mut alice, &mut bob] {
        let data = client.expect_event("votingEnded").await;
        assert_eq!(data[0]["isActive"], false);
        assert_eq!(
            data[1],
            json!({
                "totalVotes": 2,
                "average": 6.5,
                "min": 5,
                "max": 8,
                "distribution": {"5": 1, "8": 1}
            })
        );
        client.expect_event("roomUpdated").await;
    }

    server.controller.cancel();
}

#[tokio::test]
async fn test_malformed_frames_keep_the_socket_open() {
    let server = TestServer::spawn().await;
    let mut alice = server.client().await;

    alice.send_raw("not json").await;
    alice.send("castSpell", json!(SCENARIO_ROOM)).await;
    alice
        .send("submitVote", json!({"roomId": SCENARIO_ROOM, "value": 4}))
        .await;
    alice
        .send("joinRoom", json!({"roomId": SCENARIO_ROOM, "userName": "   "}))
        .await;

    alice
        .send("joinRoom", json!({"roomId": SCENARIO_ROOM, "userName": "Alice"}))
        .await;
    let room = alice.expect_event("roomJoined").await;
    assert_eq!(room["users"].as_array().unwrap().len(), 1);

    server.controller.cancel();
}

#[tokio::test]
async fn test_socket_close_leaves_rooms() {
    let server = TestServer::spawn().await;
    let mut alice = server.client().await;
    let mut bob = server.client().await;

    alice
        .send("joinRoom", json!({"roomId": SCENARIO_ROOM, "userName": "Alice"}))
        .await;
    alice.expect_event("roomJoined").await;
    bob.send("joinRoom", json!({"roomId": SCENARIO_ROOM, "userName": "Bob"}))
        .await;
    bob.expect_event("roomJoined").await;
    alice.expect_event("userJoined").await;
    alice.expect_event("roomUpdated").await;

    let bob_id = bob.id.clone();
    bob.close().await;

    let left = alice.expect_event("userLeft").await;
    assert_eq!(left, json!(bob_id));
    let room = alice.expect_event("roomUpdated").await;
    assert_eq!(room["users"].as_array().unwrap().len(), 1);

    // Host leaving empties the room
    alice.close().await;
    for _ in 0..50 {
        if server.metrics.connection_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(server
        .controller
        .get_room(SCENARIO_ROOM.to_string())
        .await
        .unwrap()
        .is_none());
    assert_eq!(server.metrics.connection_count(), 0);

    server.controller.cancel();
}

#[tokio::test]
async fn test_shutdown_closes_sockets_as_going_away() {
    let server = TestServer::spawn().await;
    let mut alice = server.client().await;

    server
        .controller
        .shutdown(Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(alice.expect_close().await, Some(1001));
}
