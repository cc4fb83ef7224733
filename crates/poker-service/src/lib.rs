//! Planning Poker Room Service Library
//!
//! A stateful WebSocket server that lets a small team estimate work items
//! together:
//!
//! - Rooms are created on the first join and removed when the last member leaves
//! - The first member becomes host; hosting passes to the earliest remaining member
//! - The host opens and closes voting rounds
//! - Members vote from a fixed deck; closing a round reveals summary statistics
//!
//! # Architecture
//!
//! ```text
//! gateway (axum WebSocket)
//!   └── RoomControllerActor (registry, membership index)
//!         └── RoomActor (one per live room, owns RoomState)
//!               └── ConnectionHandle -> ConnectionActor -> socket
//! ```
//!
//! # Modules
//!
//! - [`actors`] - Actor hierarchy
//! - [`room`] - Per-room state machine, free of I/O
//! - [`stats`] - Vote statistics
//! - [`room_code`] - Room and session code generation
//! - [`gateway`] - HTTP and WebSocket surface
//! - [`config`] - Service configuration from environment
//! - [`errors`] - Error types with HTTP status mapping
//! - [`observability`] - Metrics and health endpoints

pub mod actors;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod observability;
pub mod room;
pub mod room_code;
pub mod stats;
