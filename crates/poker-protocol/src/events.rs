//! Named events exchanged over the real-time channel.

use crate::entities::{Room, RoomStats, User, Vote, VotingSession};
use crate::vote::VoteValue;
use serde::{Deserialize, Serialize};

/// Intents sent by a client.
///
/// The implicit `disconnect` intent has no frame; the gateway raises it when
/// the socket closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    #[serde(rename_all = "camelCase")]
    JoinRoom { room_id: String, user_name: String },

    StartVoting(String),

    EndVoting(String),

    #[serde(rename_all = "camelCase")]
    SubmitVote { room_id: String, value: VoteValue },

    #[serde(rename_all = "camelCase")]
    ChangeVote { room_id: String, value: VoteValue },

    LeaveRoom(String),
}

impl ClientEvent {
    /// Event name as it appears on the wire. Bounded, safe for metric labels.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinRoom { .. } => "joinRoom",
            ClientEvent::StartVoting(_) => "startVoting",
            ClientEvent::EndVoting(_) => "endVoting",
            ClientEvent::SubmitVote { .. } => "submitVote",
            ClientEvent::ChangeVote { .. } => "changeVote",
            ClientEvent::LeaveRoom(_) => "leaveRoom",
        }
    }
}

/// Events broadcast by the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the identity the server assigned.
    Connected { id: String },

    RoomJoined(Room),

    UserJoined(User),

    /// Carries the id of the member who left.
    UserLeft(String),

    VotingStarted(VotingSession),

    /// Encoded as `data: [session, stats]`.
    VotingEnded(VotingSession, RoomStats),

    VoteReceived(Vote),

    VoteChanged(Vote),

    RoomUpdated(Room),
}

impl ServerEvent {
    /// Event name as it appears on the wire.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::RoomJoined(_) => "roomJoined",
            ServerEvent::UserJoined(_) => "userJoined",
            ServerEvent::UserLeft(_) => "userLeft",
            ServerEvent::VotingStarted(_) => "votingStarted",
            ServerEvent::VotingEnded(..) => "votingEnded",
            ServerEvent::VoteReceived(_) => "voteReceived",
            ServerEvent::VoteChanged(_) => "voteChanged",
            ServerEvent::RoomUpdated(_) => "roomUpdated",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_client_event_struct_payloads() {
        let event: ClientEvent = serde_json::from_value(json!({
            "event": "joinRoom",
            "data": {"roomId": "AB12CD", "userName": "Alice"}
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room_id: "AB12CD".to_string(),
                user_name: "Alice".to_string(),
            }
        );
        assert_eq!(event.name(), "joinRoom");

        let event: ClientEvent = serde_json::from_value(json!({
            "event": "submitVote",
            "data": {"roomId": "AB12CD", "value": 13}
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::SubmitVote {
                room_id: "AB12CD".to_string(),
                value: VoteValue::Thirteen,
            }
        );
    }

    #[test]
    fn test_client_event_bare_room_id_payloads() {
        for (name, expected) in [
            ("startVoting", ClientEvent::StartVoting("R1".to_string())),
            ("endVoting", ClientEvent::EndVoting("R1".to_string())),
            ("leaveRoom", ClientEvent::LeaveRoom("R1".to_string())),
        ] {
            let event: ClientEvent =
                serde_json::from_value(json!({"event": name, "data": "R1"})).unwrap();
            assert_eq!(event, expected);
            assert_eq!(event.name(), name);
        }
    }

    #[test]
    fn test_client_event_rejects_off_deck_vote() {
        let result = serde_json::from_value::<ClientEvent>(json!({
            "event": "changeVote",
            "data": {"roomId": "AB12CD", "value": 4}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_client_event_rejects_unknown_event() {
        let result =
            serde_json::from_value::<ClientEvent>(json!({"event": "kickUser", "data": "R1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_single_argument_payload() {
        let value = serde_json::to_value(ServerEvent::UserLeft("conn-b".to_string())).unwrap();
        assert_eq!(value, json!({"event": "userLeft", "data": "conn-b"}));

        let value = serde_json::to_value(ServerEvent::Connected {
            id: "conn-a".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"event": "connected", "data": {"id": "conn-a"}}));
    }

    #[test]
    fn test_voting_ended_carries_two_arguments() {
        let session = VotingSession {
            id: "S1".to_string(),
            is_active: false,
            votes: Vec::new(),
            started_at: Utc::now(),
            ended_at: Some(Utc::now()),
        };
        let event = ServerEvent::VotingEnded(session, RoomStats::default());
        assert_eq!(event.name(), "votingEnded");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], json!("votingEnded"));
        let args = value["data"].as_array().unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args[0]["id"], json!("S1"));
        assert_eq!(args[1]["distribution"], json!({}));
        assert_eq!(args[1]["totalVotes"], json!(0));
    }
}
