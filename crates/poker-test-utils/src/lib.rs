//! # Poker Test Utilities
//!
//! Shared test utilities for the poker service.
//!
//! ## Modules
//!
//! - `connection` - In-process connection whose outbound events can be read back
//! - `fixtures` - Names, intents and a ready-made controller
//! - `ws_client` - WebSocket client speaking the JSON event protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use poker_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let (controller, metrics) = spawn_controller(16);
//!     let mut alice = TestConnection::new("conn-a", &metrics);
//!
//!     controller
//!         .dispatch(alice.handle(), "AB12CD".to_string(), join("Alice"))
//!         .await
//!         .unwrap();
//!
//!     let joined = alice.expect_event("roomJoined").await;
//! }
//! ```

pub mod connection;
pub mod fixtures;
pub mod ws_client;

pub use connection::TestConnection;
pub use fixtures::*;
pub use ws_client::WsTestClient;
