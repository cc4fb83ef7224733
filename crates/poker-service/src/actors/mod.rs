//! Actor model implementation for the poker service.
//!
//! ```text
//! RoomControllerActor (singleton per instance)
//! ├── owns the room registry and the connection -> rooms index
//! └── supervises N RoomActors
//!     └── RoomActor (one per live room)
//!         ├── owns room state (members, host, voting session)
//!         └── holds a ConnectionHandle per member
//!
//! ConnectionActor (one per websocket, spawned by the gateway)
//! └── drains its mailbox onto the socket
//! ```
//!
//! # Key Design Decisions
//!
//! - **Single writer per room**: every mutation of a room runs on its actor
//! - **Controller-owned membership**: creation and teardown decisions are made
//!   where the member sets live, so a room cannot be deleted under a join
//! - **Non-blocking fan-out**: room actors deliver with `try_send`; a slow
//!   socket loses events instead of stalling the room
//! - **CancellationToken propagation**: parent actors pass child tokens for
//!   graceful shutdown
//!
//! # Modules
//!
//! - [`controller`] - `RoomControllerActor` singleton that supervises rooms
//! - [`room`] - `RoomActor` per live room
//! - [`connection`] - `ConnectionActor` per websocket
//! - [`messages`] - Message types for actor communication
//! - [`metrics`] - Mailbox monitoring and actor metrics

pub mod connection;
pub mod controller;
pub mod messages;
pub mod metrics;
pub mod room;

// Re-export primary types
pub use connection::{ConnectionActor, ConnectionHandle};
pub use controller::{RoomControllerActor, RoomControllerHandle};
pub use messages::*;
pub use metrics::{ActorMetrics, ActorType, MailboxLevel, MailboxMonitor};
pub use room::{RoomActor, RoomActorHandle};
