//! Test data fixtures.

use poker_protocol::{UserName, VoteValue};
use poker_service::actors::{ActorMetrics, RoomControllerHandle, RoomIntent};
use std::sync::Arc;

/// The room code used by the walkthrough scenarios.
pub const SCENARIO_ROOM: &str = "AB12CD";

/// A validated display name.
///
/// # Panics
///
/// Panics if `raw` is not a valid name.
#[must_use]
pub fn name(raw: &str) -> UserName {
    UserName::parse(raw).expect("fixture name should be valid")
}

#[must_use]
pub fn join(raw_name: &str) -> RoomIntent {
    RoomIntent::Join {
        name: name(raw_name),
    }
}

#[must_use]
pub fn vote(value: VoteValue) -> RoomIntent {
    RoomIntent::SubmitVote(value)
}

#[must_use]
pub fn change(value: VoteValue) -> RoomIntent {
    RoomIntent::ChangeVote(value)
}

/// Spawn a controller with fresh metrics.
#[must_use]
pub fn spawn_controller(max_rooms: usize) -> (RoomControllerHandle, Arc<ActorMetrics>) {
    let metrics = ActorMetrics::new();
    let controller =
        RoomControllerHandle::new("poker-test".to_string(), max_rooms, Arc::clone(&metrics));
    (controller, metrics)
}
