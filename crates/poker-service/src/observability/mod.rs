//! Observability for the poker service.
//!
//! All instrumentation uses `#[instrument(skip_all)]` with explicit fields.
//! User names and vote values never appear in logs or labels.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `poker_rooms_active` | Gauge | none | Rooms in the registry |
//! | `poker_connections_active` | Gauge | none | Open sockets |
//! | `poker_actor_mailbox_depth` | Gauge | `actor_type` | Backpressure indicator |
//! | `poker_intents_total` | Counter | `intent` | Inbound client intents |
//! | `poker_votes_total` | Counter | `kind` | Votes received or changed |
//! | `poker_voting_rounds_total` | Counter | `phase` | Rounds started or ended |
//! | `poker_events_dropped_total` | Counter | none | Events lost to slow sockets |
//! | `poker_actor_panics_total` | Counter | `actor_type` | Actor panics |

pub mod health;
pub mod metrics;

// Re-exports for convenience
pub use health::{health_router, HealthState};
pub use metrics::{
    init_metrics_recorder, record_actor_panic, record_event_dropped, record_intent,
    record_vote, record_voting_round, set_actor_mailbox_depth, set_connections_active,
    set_rooms_active,
};
