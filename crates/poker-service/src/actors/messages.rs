//! Message types for actor communication.
//!
//! All inter-actor communication uses strongly-typed message passing via `tokio::sync::mpsc`.
//! Response patterns use `tokio::sync::oneshot` for request-reply semantics.

use crate::errors::PokerError;
use poker_protocol::{ClientEvent, ProtocolError, Room, ServerEvent, UserName, VoteValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use super::connection::ConnectionHandle;

/// Longest accepted room id, in bytes.
pub const MAX_ROOM_ID_LEN: usize = 64;

/// A validated client intent, minus the room it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomIntent {
    Join { name: UserName },
    StartVoting,
    EndVoting,
    SubmitVote(VoteValue),
    ChangeVote(VoteValue),
    Leave,
}

impl RoomIntent {
    /// Split a decoded client event into its target room and a validated
    /// intent.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidName`] when a join carries a name that
    /// fails [`UserName::parse`].
    pub fn from_client_event(event: ClientEvent) -> Result<(String, Self), ProtocolError> {
        let parsed = match event {
            ClientEvent::JoinRoom { room_id, user_name } => (
                room_id,
                RoomIntent::Join {
                    name: UserName::parse(&user_name)?,
                },
            ),
            ClientEvent::StartVoting(room_id) => (room_id, RoomIntent::StartVoting),
            ClientEvent::EndVoting(room_id) => (room_id, RoomIntent::EndVoting),
            ClientEvent::SubmitVote { room_id, value } => (room_id, RoomIntent::SubmitVote(value)),
            ClientEvent::ChangeVote { room_id, value } => (room_id, RoomIntent::ChangeVote(value)),
            ClientEvent::LeaveRoom(room_id) => (room_id, RoomIntent::Leave),
        };
        Ok(parsed)
    }

    /// Intent name for logs and metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            RoomIntent::Join { .. } => "joinRoom",
            RoomIntent::StartVoting => "startVoting",
            RoomIntent::EndVoting => "endVoting",
            RoomIntent::SubmitVote(_) => "submitVote",
            RoomIntent::ChangeVote(_) => "changeVote",
            RoomIntent::Leave => "leaveRoom",
        }
    }
}

/// Whether a room id is acceptable as a registry key.
#[must_use]
pub fn is_valid_room_id(room_id: &str) -> bool {
    !room_id.is_empty() && room_id.len() <= MAX_ROOM_ID_LEN
}

/// Messages sent to `RoomControllerActor`.
#[derive(Debug)]
pub enum ControllerMessage {
    /// Route an intent from a connection to its room.
    Dispatch {
        connection: ConnectionHandle,
        room_id: String,
        intent: RoomIntent,
    },

    /// A socket closed: leave every room the connection belongs to.
    Disconnect { connection_id: String },

    /// Snapshot of a live room.
    GetRoom {
        room_id: String,
        /// Response channel for the snapshot, `None` when the room is absent.
        respond_to: oneshot::Sender<Option<Room>>,
    },

    /// Pick a room code not currently in use.
    AllocateRoomId {
        respond_to: oneshot::Sender<Result<String, PokerError>>,
    },

    /// Get current status (for health checks and tests).
    GetStatus {
        respond_to: oneshot::Sender<ControllerStatus>,
    },

    /// Initiate graceful shutdown (SIGTERM received).
    Shutdown {
        /// How long to wait for each room actor to stop.
        deadline: Duration,
        respond_to: oneshot::Sender<Result<(), PokerError>>,
    },
}

/// Messages sent to `RoomActor`.
#[derive(Debug)]
pub enum RoomMessage {
    /// A connection joins (or rejoins) the room.
    Join {
        connection: ConnectionHandle,
        name: UserName,
    },

    StartVoting {
        connection_id: String,
    },

    EndVoting {
        connection_id: String,
    },

    SubmitVote {
        connection_id: String,
        value: VoteValue,
    },

    ChangeVote {
        connection_id: String,
        value: VoteValue,
    },

    /// Explicit leave or disconnect.
    Leave {
        connection_id: String,
    },

    /// Get the current room snapshot.
    GetState {
        respond_to: oneshot::Sender<Option<Room>>,
    },

    /// The room was removed from the registry. Sent after the final `Leave`.
    Close,
}

/// Messages sent to `ConnectionActor`.
#[derive(Debug)]
pub enum ConnectionMessage {
    /// Write an event to the socket. Shared between all recipients of a
    /// broadcast.
    Deliver(Arc<ServerEvent>),

    /// Close the socket.
    Close { reason: String },
}

/// Controller status for health checks.
#[derive(Debug, Clone)]
pub struct ControllerStatus {
    /// Live rooms.
    pub room_count: usize,
    /// Room memberships across all rooms.
    pub member_count: usize,
    /// Open sockets.
    pub connection_count: usize,
    /// Whether the controller is draining.
    pub is_draining: bool,
    /// Controller mailbox backlog at the last sample.
    pub mailbox_depth: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_join_intent_validates_name() {
        let (room_id, intent) = RoomIntent::from_client_event(ClientEvent::JoinRoom {
            room_id: "AB12CD".to_string(),
            user_name: "  Alice ".to_string(),
        })
        .unwrap();
        assert_eq!(room_id, "AB12CD");
        assert_eq!(
            intent,
            RoomIntent::Join {
                name: UserName::parse("Alice").unwrap()
            }
        );
        assert_eq!(intent.name(), "joinRoom");

        let result = RoomIntent::from_client_event(ClientEvent::JoinRoom {
            room_id: "AB12CD".to_string(),
            user_name: "   ".to_string(),
        });
        assert!(matches!(result, Err(ProtocolError::InvalidName(_))));
    }

    #[test]
    fn test_intent_names_match_wire_names() {
        let events = [
            ClientEvent::StartVoting("R".to_string()),
            ClientEvent::EndVoting("R".to_string()),
            ClientEvent::SubmitVote {
                room_id: "R".to_string(),
                value: VoteValue::Five,
            },
            ClientEvent::ChangeVote {
                room_id: "R".to_string(),
                value: VoteValue::Unknown,
            },
            ClientEvent::LeaveRoom("R".to_string()),
        ];
        for event in events {
            let wire_name = event.name();
            let (room_id, intent) = RoomIntent::from_client_event(event).unwrap();
            assert_eq!(room_id, "R");
            assert_eq!(intent.name(), wire_name);
        }
    }

    #[test]
    fn test_room_id_bounds() {
        assert!(is_valid_room_id("AB12CD"));
        assert!(is_valid_room_id(&"x".repeat(MAX_ROOM_ID_LEN)));
        assert!(!is_valid_room_id(""));
        assert!(!is_valid_room_id(&"x".repeat(MAX_ROOM_ID_LEN + 1)));
    }
}
