//! Room and voting-session state machine.
//!
//! `RoomState` is plain data: it is owned by exactly one `RoomActor`, which
//! serializes every mutation. Each operation applies its guards, mutates, and
//! returns the events to broadcast together with who should receive them.
//! Rejected operations (wrong state, not host, not a member) return no events.
//!
//! Events are built from post-mutation state, so every snapshot reflects the
//! change that produced it.

use crate::stats;
use chrono::{DateTime, Utc};
use poker_protocol::{Room, ServerEvent, User, UserName, Vote, VoteValue, VotingSession};

/// Who receives an outbound event, relative to the requesting connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only the requester.
    Sender,
    /// Every current member except the requester.
    Others,
    /// Every current member.
    All,
}

/// An event produced by a state transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub event: ServerEvent,
    pub audience: Audience,
}

impl Outbound {
    fn new(event: ServerEvent, audience: Audience) -> Self {
        Self { event, audience }
    }
}

#[derive(Debug, Clone)]
struct Member {
    id: String,
    name: String,
}

/// State of a single room.
#[derive(Debug)]
pub struct RoomState {
    id: String,
    created_at: DateTime<Utc>,
    /// Connection id of the host. `None` only while the room has no members.
    host: Option<String>,
    /// Members in join order.
    members: Vec<Member>,
    session: Option<VotingSession>,
}

impl RoomState {
    /// Create an empty room. The first member to join becomes host.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            host: None,
            members: Vec::new(),
            session: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_member(&self, connection_id: &str) -> bool {
        self.members.iter().any(|m| m.id == connection_id)
    }

    /// Member connection ids in join order.
    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.id.as_str())
    }

    #[must_use]
    pub fn host_id(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn session(&self) -> Option<&VotingSession> {
        self.session.as_ref()
    }

    /// Full room snapshot, or `None` when the room has no members.
    #[must_use]
    pub fn snapshot(&self) -> Option<Room> {
        let host_id = self.host.as_deref()?;
        let users: Vec<User> = self.members.iter().map(|m| self.user(m)).collect();
        let host = users.iter().find(|u| u.id == host_id)?.clone();

        Some(Room {
            id: self.id.clone(),
            name: format!("Room {}", self.id),
            host,
            users,
            current_voting_session: self.session.clone(),
            created_at: self.created_at,
        })
    }

    fn user(&self, member: &Member) -> User {
        User {
            id: member.id.clone(),
            name: member.name.clone(),
            is_host: self.host.as_deref() == Some(member.id.as_str()),
            socket_id: member.id.clone(),
        }
    }

    fn member(&self, connection_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == connection_id)
    }

    fn is_host(&self, connection_id: &str) -> bool {
        self.host.as_deref() == Some(connection_id)
    }

    fn room_updated(&self, audience: Audience) -> Option<Outbound> {
        self.snapshot()
            .map(|room| Outbound::new(ServerEvent::RoomUpdated(room), audience))
    }

    /// Add the connection as a member. The first member becomes host.
    ///
    /// Joining again with the same connection leaves membership unchanged
    /// but repeats the join announcements.
    pub fn join(&mut self, connection_id: &str, name: UserName) -> Vec<Outbound> {
        if !self.is_member(connection_id) {
            self.members.push(Member {
                id: connection_id.to_string(),
                name: name.into_inner(),
            });
        }
        if self.host.is_none() {
            self.host = Some(connection_id.to_string());
        }

        let (Some(room), Some(member)) = (self.snapshot(), self.member(connection_id)) else {
            return Vec::new();
        };
        let user = self.user(member);

        vec![
            Outbound::new(ServerEvent::RoomJoined(room.clone()), Audience::Sender),
            Outbound::new(ServerEvent::UserJoined(user), Audience::Others),
            Outbound::new(ServerEvent::RoomUpdated(room), Audience::Others),
        ]
    }

    /// Open a new voting round, replacing any current session. Host only.
    pub fn start_voting(&mut self, connection_id: &str, session_id: String) -> Vec<Outbound> {
        if !self.is_host(connection_id) {
            return Vec::new();
        }

        let session = VotingSession {
            id: session_id,
            is_active: true,
            votes: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        };
        self.session = Some(session.clone());

        let mut out = vec![Outbound::new(
            ServerEvent::VotingStarted(session),
            Audience::All,
        )];
        out.extend(self.room_updated(Audience::All));
        out
    }

    /// Close the active round and reveal statistics. Host only.
    pub fn end_voting(&mut self, connection_id: &str) -> Vec<Outbound> {
        if !self.is_host(connection_id) {
            return Vec::new();
        }
        let Some(session) = self.session.as_mut().filter(|s| s.is_active) else {
            return Vec::new();
        };

        session.is_active = false;
        session.ended_at = Some(Utc::now());
        let stats = stats::compute(&session.votes);
        let ended = session.clone();

        let mut out = vec![Outbound::new(
            ServerEvent::VotingEnded(ended, stats),
            Audience::All,
        )];
        out.extend(self.room_updated(Audience::All));
        out
    }

    /// Record a vote, replacing the member's earlier vote in this round.
    pub fn submit_vote(&mut self, connection_id: &str, value: VoteValue) -> Vec<Outbound> {
        self.record_vote(connection_id, value, false)
    }

    /// Replace the member's existing vote. Without an earlier vote this is a
    /// no-op.
    pub fn change_vote(&mut self, connection_id: &str, value: VoteValue) -> Vec<Outbound> {
        self.record_vote(connection_id, value, true)
    }

    fn record_vote(
        &mut self,
        connection_id: &str,
        value: VoteValue,
        require_existing: bool,
    ) -> Vec<Outbound> {
        let Some(member) = self.member(connection_id) else {
            return Vec::new();
        };
        let vote = Vote {
            user_id: member.id.clone(),
            user_name: member.name.clone(),
            value,
            timestamp: Utc::now(),
        };

        let Some(session) = self.session.as_mut().filter(|s| s.is_active) else {
            return Vec::new();
        };

        let event = match session
            .votes
            .iter_mut()
            .find(|v| v.user_id == connection_id)
        {
            Some(existing) => {
                *existing = vote.clone();
                ServerEvent::VoteChanged(vote)
            }
            None if require_existing => return Vec::new(),
            None => {
                session.votes.push(vote.clone());
                ServerEvent::VoteReceived(vote)
            }
        };

        let mut out = vec![Outbound::new(event, Audience::All)];
        out.extend(self.room_updated(Audience::All));
        out
    }

    /// Remove the connection from the room.
    ///
    /// If the host leaves, the earliest-joined remaining member takes over.
    /// Votes already cast stay in the session.
    pub fn leave(&mut self, connection_id: &str) -> Vec<Outbound> {
        let Some(position) = self.members.iter().position(|m| m.id == connection_id) else {
            return Vec::new();
        };
        let departed = self.members.remove(position);

        if self.is_host(&departed.id) {
            self.host = self.members.first().map(|m| m.id.clone());
        }

        let mut out = vec![Outbound::new(
            ServerEvent::UserLeft(departed.id),
            Audience::Others,
        )];
        out.extend(self.room_updated(Audience::Others));
        out
    }
}
