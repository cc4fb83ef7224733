//! Entity shapes carried in event payloads.
//!
//! Field names and nesting are part of the interop contract with existing
//! browser clients, hence the camelCase renames and the redundant
//! `User::socket_id`.

use crate::vote::VoteValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A member of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Connection identity of the member.
    pub id: String,
    pub name: String,
    pub is_host: bool,
    /// Always equal to `id`; clients locate themselves by this field.
    pub socket_id: String,
}

/// A single estimate within a voting session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: String,
    /// Name of the voter at the time the vote was cast.
    pub user_name: String,
    pub value: VoteValue,
    pub timestamp: DateTime<Utc>,
}

/// One round of estimation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingSession {
    pub id: String,
    pub is_active: bool,
    /// Votes in the order they were first cast.
    pub votes: Vec<Vote>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Full room snapshot, sent on every membership or session change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub name: String,
    pub host: User,
    /// Members in join order.
    pub users: Vec<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_voting_session: Option<VotingSession>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates revealed when a round ends.
///
/// `average`, `min` and `max` only consider numeric cards; `distribution`
/// counts every card, keyed by its literal (`"5"`, `"?"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStats {
    pub total_votes: usize,
    pub average: f64,
    pub min: u8,
    pub max: u8,
    pub distribution: BTreeMap<VoteValue, usize>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn alice() -> User {
        User {
            id: "conn-a".to_string(),
            name: "Alice".to_string(),
            is_host: true,
            socket_id: "conn-a".to_string(),
        }
    }

    #[test]
    fn test_user_wire_shape() {
        let value = serde_json::to_value(alice()).unwrap();
        assert_eq!(
            value,
            json!({"id": "conn-a", "name": "Alice", "isHost": true, "socketId": "conn-a"})
        );
    }

    #[test]
    fn test_room_omits_absent_session() {
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let room = Room {
            id: "AB12CD".to_string(),
            name: "Room AB12CD".to_string(),
            host: alice(),
            users: vec![alice()],
            current_voting_session: None,
            created_at,
        };

        let value = serde_json::to_value(&room).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("currentVotingSession"));
        assert_eq!(object["createdAt"], json!("2024-05-01T12:00:00Z"));
        assert_eq!(object["host"]["isHost"], json!(true));
    }

    #[test]
    fn test_session_ended_at_only_when_ended() {
        let started_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut session = VotingSession {
            id: "S1".to_string(),
            is_active: true,
            votes: vec![Vote {
                user_id: "conn-a".to_string(),
                user_name: "Alice".to_string(),
                value: VoteValue::Unknown,
                timestamp: started_at,
            }],
            started_at,
            ended_at: None,
        };

        let value = serde_json::to_value(&session).unwrap();
        assert!(value.get("endedAt").is_none());
        assert_eq!(value["votes"][0]["value"], json!("?"));
        assert_eq!(value["votes"][0]["userName"], json!("Alice"));

        session.is_active = false;
        session.ended_at = Some(started_at);
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value["isActive"], json!(false));
        assert_eq!(value["endedAt"], json!("2024-05-01T12:00:00Z"));

        let decoded: VotingSession = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_stats_distribution_keys_are_literals() {
        let stats = RoomStats {
            total_votes: 3,
            average: 6.5,
            min: 5,
            max: 8,
            distribution: BTreeMap::from([
                (VoteValue::Unknown, 1),
                (VoteValue::Eight, 1),
                (VoteValue::Five, 1),
            ]),
        };

        let encoded = serde_json::to_string(&stats).unwrap();
        assert_eq!(
            encoded,
            r#"{"totalVotes":3,"average":6.5,"min":5,"max":8,"distribution":{"5":1,"8":1,"?":1}}"#
        );
    }
}
