//! Poker service error types.
//!
//! Errors never reach clients over the real-time channel: rejected intents
//! are silent no-ops. These types cover actor plumbing, configuration and the
//! small HTTP surface, where they map to status codes via `IntoResponse`.
//! Internal details are logged server-side but not exposed to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use poker_protocol::ProtocolError;
use serde::Serialize;
use thiserror::Error;

/// Poker service error type.
///
/// Maps to HTTP status codes:
/// - `Internal`, `Config`: 500 Internal Server Error
/// - `RoomNotFound`: 404 Not Found
/// - `Protocol`: 400 Bad Request
/// - `CapacityExceeded`, `Draining`: 503 Service Unavailable
#[derive(Debug, Error)]
pub enum PokerError {
    /// Actor channel failure or other internal fault.
    #[error("Internal error: {0}")]
    Internal(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Room not found.
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Registry holds the configured maximum number of rooms.
    #[error("Room capacity exceeded")]
    CapacityExceeded,

    /// Service is shutting down.
    #[error("Service is draining")]
    Draining,

    /// Inbound frame could not be decoded.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl PokerError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            PokerError::Internal(_) | PokerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PokerError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            PokerError::Protocol(_) => StatusCode::BAD_REQUEST,
            PokerError::CapacityExceeded | PokerError::Draining => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns a client-safe error message (no internal details).
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            PokerError::Internal(_) | PokerError::Config(_) => {
                "An internal error occurred".to_string()
            }
            PokerError::RoomNotFound(_) => "Room not found".to_string(),
            PokerError::CapacityExceeded => "Server is at capacity, please try again".to_string(),
            PokerError::Draining => "Server is shutting down, please reconnect".to_string(),
            PokerError::Protocol(_) => "Malformed request".to_string(),
        }
    }

    /// Whether a client may reasonably retry the same request later.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PokerError::CapacityExceeded | PokerError::Draining | PokerError::Internal(_)
        )
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
    retryable: bool,
}

impl IntoResponse for PokerError {
    fn into_response(self) -> Response {
        let code = match &self {
            PokerError::Internal(detail) | PokerError::Config(detail) => {
                tracing::error!(target: "poker.errors", error = %detail, "Internal failure");
                "INTERNAL_ERROR"
            }
            PokerError::RoomNotFound(_) => "NOT_FOUND",
            PokerError::Protocol(_) => "BAD_REQUEST",
            PokerError::CapacityExceeded => "CAPACITY_EXCEEDED",
            PokerError::Draining => "DRAINING",
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code,
                message: self.client_message(),
                retryable: self.is_retryable(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}
