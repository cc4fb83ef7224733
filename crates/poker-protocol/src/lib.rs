//! Wire protocol for the planning poker room service.
//!
//! The real-time channel carries JSON text frames of the shape
//! `{"event": <name>, "data": <payload>}`. Single-argument events carry the
//! bare value as `data`; `votingEnded` carries `[session, stats]`.
//!
//! - [`entities`] - `User`, `Vote`, `VotingSession`, `Room`, `RoomStats`
//! - [`vote`] - the fixed estimate deck ([`VoteValue`])
//! - [`name`] - validated display names ([`UserName`])
//! - [`events`] - client intents and server broadcasts
//! - [`codec`] - frame encode/decode with size limits

#![warn(clippy::pedantic)]

pub mod codec;
pub mod entities;
pub mod events;
pub mod name;
pub mod vote;

pub use codec::{decode_client_event, encode_server_event, ProtocolError, MAX_FRAME_LEN};
pub use entities::{Room, RoomStats, User, Vote, VotingSession};
pub use events::{ClientEvent, ServerEvent};
pub use name::UserName;
pub use vote::VoteValue;
