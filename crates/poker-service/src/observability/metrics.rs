//! Metrics definitions for the poker service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `poker_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `actor_type`: 3 values (controller, room, connection)
//! - `intent`: 6 values (the client event names)
//! - `kind`: received, changed
//! - `phase`: started, ended
//!
//! Room ids and connection ids are never used as labels.

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Room & Connection Metrics (Gauges)
// ============================================================================

/// Set the number of rooms in the registry.
///
/// Metric: `poker_rooms_active`
/// Labels: none
pub fn set_rooms_active(count: usize) {
    // usize to f64 conversion is safe for realistic room counts (< 2^53)
    #[allow(clippy::cast_precision_loss)]
    gauge!("poker_rooms_active").set(count as f64);
}

/// Set the number of open sockets.
///
/// Metric: `poker_connections_active`
/// Labels: none
pub fn set_connections_active(count: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("poker_connections_active").set(count as f64);
}

/// Set the mailbox backlog for an actor type.
///
/// Metric: `poker_actor_mailbox_depth`
/// Labels: `actor_type` (controller, room, connection)
///
/// High values indicate the actor is falling behind.
pub fn set_actor_mailbox_depth(actor_type: &str, depth: usize) {
    #[allow(clippy::cast_precision_loss)]
    gauge!("poker_actor_mailbox_depth", "actor_type" => actor_type.to_string())
        .set(depth as f64);
}

// ============================================================================
// Voting Metrics (Counters)
// ============================================================================

/// Record an inbound client intent after decoding.
///
/// Metric: `poker_intents_total`
/// Labels: `intent`
pub fn record_intent(intent: &str) {
    counter!("poker_intents_total", "intent" => intent.to_string()).increment(1);
}

/// Record a vote accepted by a room.
///
/// Metric: `poker_votes_total`
/// Labels: `kind` (received, changed)
pub fn record_vote(kind: &str) {
    counter!("poker_votes_total", "kind" => kind.to_string()).increment(1);
}

/// Record a voting round transition.
///
/// Metric: `poker_voting_rounds_total`
/// Labels: `phase` (started, ended)
pub fn record_voting_round(phase: &str) {
    counter!("poker_voting_rounds_total", "phase" => phase.to_string()).increment(1);
}

// ============================================================================
// Operational Metrics
// ============================================================================

/// Record an outbound event dropped because a connection mailbox was full.
///
/// Metric: `poker_events_dropped_total`
/// Labels: none
///
/// Non-zero values indicate slow clients.
pub fn record_event_dropped() {
    counter!("poker_events_dropped_total").increment(1);
}

/// Record an actor panic event.
///
/// Metric: `poker_actor_panics_total`
/// Labels: `actor_type`
///
/// ALERT: Any non-zero value indicates a bug and should trigger investigation.
pub fn record_actor_panic(actor_type: &str) {
    counter!("poker_actor_panics_total", "actor_type" => actor_type.to_string()).increment(1);
}
