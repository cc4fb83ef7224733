//! WebSocket gateway.
//!
//! Each upgraded socket gets a fresh connection id, a `ConnectionActor` that
//! owns the write half, and a read loop in the upgrade task. The read loop
//! decodes frames into intents and hands them to the controller. Frames that
//! fail to decode are dropped; they never close the socket.
//!
//! When the read half ends, for whatever reason, the connection leaves every
//! room it joined.

use super::AppState;
use crate::actors::{ConnectionActor, ConnectionHandle, RoomIntent};
use crate::errors::PokerError;
use crate::observability::metrics as prom;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::StreamExt;
use poker_protocol::{decode_client_event, ServerEvent};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Largest message the transport will assemble. Frames above the codec limit
/// but below this are decoded and dropped like any other bad frame.
const MAX_TRANSPORT_MESSAGE: usize = 64 * 1024;

/// Time allowed for the writer to flush its close frame.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Handler for the WebSocket route.
pub async fn socket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.max_message_size(MAX_TRANSPORT_MESSAGE)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Decode a text frame into a target room and a validated intent.
///
/// # Errors
///
/// Returns `PokerError::Protocol` when the frame is oversized, malformed, or
/// carries an invalid display name.
pub fn parse_frame(text: &str) -> Result<(String, RoomIntent), PokerError> {
    let event = decode_client_event(text)?;
    Ok(RoomIntent::from_client_event(event)?)
}

#[instrument(skip_all, name = "poker.gateway.socket")]
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let cancel_token = state.controller.child_token();
    let (sink, mut stream) = socket.split();

    let (connection, receiver) = ConnectionHandle::channel(
        connection_id.clone(),
        state.connection_buffer,
        cancel_token.clone(),
        Arc::clone(&state.metrics),
    );
    let writer = ConnectionActor::spawn(
        connection_id.clone(),
        receiver,
        sink,
        cancel_token.clone(),
        Arc::clone(&state.metrics),
    );
    state.metrics.connection_created();

    info!(target: "poker.gateway", connection_id = %connection_id, "Connection opened");

    connection.deliver(Arc::new(ServerEvent::Connected {
        id: connection_id.clone(),
    }));

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => break,

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_frame(&state, &connection, &text).await,
                Some(Ok(Message::Close(_))) | None => break,
                // Binary frames are not part of the protocol; pings are answered by the transport
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(
                        target: "poker.gateway",
                        connection_id = %connection_id,
                        error = %e,
                        "Socket read failed"
                    );
                    break;
                }
            },
        }
    }

    // On shutdown the controller tears rooms down itself
    if cancel_token.is_cancelled() {
        debug!(target: "poker.gateway", connection_id = %connection_id, "Skipping disconnect during shutdown");
    } else if let Err(e) = state.controller.disconnect(connection_id.clone()).await {
        warn!(
            target: "poker.gateway",
            connection_id = %connection_id,
            error = %e,
            "Failed to notify controller of disconnect"
        );
    }

    if connection.close("connection closed".to_string()).await.is_err() {
        debug!(target: "poker.gateway", connection_id = %connection_id, "Writer already stopped");
    }
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
        connection.cancel();
        debug!(target: "poker.gateway", connection_id = %connection_id, "Writer drain timed out");
    }
    state.metrics.connection_closed();

    info!(target: "poker.gateway", connection_id = %connection_id, "Connection closed");
}

async fn handle_frame(state: &AppState, connection: &ConnectionHandle, text: &str) {
    let (room_id, intent) = match parse_frame(text) {
        Ok(parsed) => parsed,
        Err(e) => {
            debug!(
                target: "poker.gateway",
                connection_id = %connection.connection_id(),
                error = %e,
                "Dropping undecodable frame"
            );
            return;
        }
    };

    prom::record_intent(intent.name());

    if let Err(e) = state
        .controller
        .dispatch(connection.clone(), room_id, intent)
        .await
    {
        warn!(
            target: "poker.gateway",
            connection_id = %connection.connection_id(),
            error = %e,
            "Failed to dispatch intent"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use poker_protocol::{ProtocolError, VoteValue, MAX_FRAME_LEN};

    #[test]
    fn test_parse_frame_join() {
        let (room_id, intent) =
            parse_frame(r#"{"event":"joinRoom","data":{"roomId":"AB12CD","userName":"Alice"}}"#)
                .unwrap();
        assert_eq!(room_id, "AB12CD");
        assert_eq!(intent.name(), "joinRoom");
    }

    #[test]
    fn test_parse_frame_vote() {
        let (room_id, intent) =
            parse_frame(r#"{"event":"changeVote","data":{"roomId":"R","value":13}}"#).unwrap();
        assert_eq!(room_id, "R");
        assert_eq!(intent, RoomIntent::ChangeVote(VoteValue::Thirteen));
    }

    #[test]
    fn test_parse_frame_rejects_bad_input() {
        let blank_name = parse_frame(r#"{"event":"joinRoom","data":{"roomId":"R","userName":" "}}"#);
        assert!(matches!(
            blank_name,
            Err(PokerError::Protocol(ProtocolError::InvalidName(_)))
        ));

        let off_deck = parse_frame(r#"{"event":"submitVote","data":{"roomId":"R","value":4}}"#);
        assert!(matches!(
            off_deck,
            Err(PokerError::Protocol(ProtocolError::Malformed(_)))
        ));

        let oversized = parse_frame(&"x".repeat(MAX_FRAME_LEN + 1));
        assert!(matches!(
            oversized,
            Err(PokerError::Protocol(ProtocolError::FrameTooLarge(_)))
        ));
    }
}
