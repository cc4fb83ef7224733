//! Room HTTP handlers.

use super::AppState;
use crate::errors::PokerError;
use axum::{
    extract::{Path, State},
    Json,
};
use poker_protocol::Room;
use serde::Serialize;
use tracing::{debug, instrument};

/// Response body for `POST /api/rooms`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: String,
}

/// Handler for `POST /api/rooms`.
///
/// Returns a code that no live room uses. The room itself is created by the
/// first `joinRoom` that names it.
///
/// # Errors
///
/// - `Draining` (503) during shutdown
/// - `CapacityExceeded` (503) when the registry is full
#[instrument(skip_all, name = "poker.gateway.create_room")]
pub async fn create_room(
    State(state): State<AppState>,
) -> Result<Json<CreateRoomResponse>, PokerError> {
    let room_id = state.controller.allocate_room_id().await?;

    debug!(target: "poker.gateway", room_id = %room_id, "Room code allocated");

    Ok(Json(CreateRoomResponse { room_id }))
}

/// Handler for `GET /api/rooms/:room_id`.
///
/// # Errors
///
/// - `RoomNotFound` (404) when no live room has this id
#[instrument(skip_all, name = "poker.gateway.get_room")]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
) -> Result<Json<Room>, PokerError> {
    state
        .controller
        .get_room(room_id.clone())
        .await?
        .map(Json)
        .ok_or(PokerError::RoomNotFound(room_id))
}
