//! In-process stand-in for a socket.
//!
//! Wraps a `ConnectionHandle` and keeps its mailbox, so tests read exactly
//! what a room actor delivered without running a `ConnectionActor`.

use poker_protocol::ServerEvent;
use poker_service::actors::{ActorMetrics, ConnectionHandle, ConnectionMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How long `next_event` waits before failing the test.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(1);

/// How long `assert_silent` listens for stray events.
pub const SILENCE_WINDOW: Duration = Duration::from_millis(50);

/// A connection whose outbound events can be read back.
pub struct TestConnection {
    handle: ConnectionHandle,
    inbox: mpsc::Receiver<ConnectionMessage>,
}

impl TestConnection {
    /// Create a connection with a roomy mailbox.
    #[must_use]
    pub fn new(connection_id: &str, metrics: &Arc<ActorMetrics>) -> Self {
        Self::with_buffer(connection_id, 64, metrics)
    }

    /// Create a connection with a specific mailbox size.
    #[must_use]
    pub fn with_buffer(connection_id: &str, buffer: usize, metrics: &Arc<ActorMetrics>) -> Self {
        let (handle, inbox) = ConnectionHandle::channel(
            connection_id.to_string(),
            buffer,
            CancellationToken::new(),
            Arc::clone(metrics),
        );
        Self { handle, inbox }
    }

    /// A clone of the handle, for dispatching intents.
    #[must_use]
    pub fn handle(&self) -> ConnectionHandle {
        self.handle.clone()
    }

    #[must_use]
    pub fn id(&self) -> &str {
        self.handle.connection_id()
    }

    /// Wait for the next delivered event.
    ///
    /// # Panics
    ///
    /// Panics if nothing arrives within [`EVENT_TIMEOUT`] or the connection
    /// was asked to close.
    pub async fn next_event(&mut self) -> ServerEvent {
        let message = tokio::time::timeout(EVENT_TIMEOUT, self.inbox.recv())
            .await
            .unwrap_or_else(|_| panic!("{}: no event within {EVENT_TIMEOUT:?}", self.id()))
            .unwrap_or_else(|| panic!("{}: mailbox closed", self.id()));

        match message {
            ConnectionMessage::Deliver(event) => (*event).clone(),
            ConnectionMessage::Close { reason } => {
                panic!("{}: expected event, got close ({reason})", self.id())
            }
        }
    }

    /// Wait for the next event and check its name.
    ///
    /// # Panics
    ///
    /// Panics if the next event has a different name.
    pub async fn expect_event(&mut self, name: &str) -> ServerEvent {
        let event = self.next_event().await;
        assert_eq!(event.name(), name, "{}: unexpected event {event:?}", self.id());
        event
    }

    /// Events already in the mailbox, without waiting.
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(message) = self.inbox.try_recv() {
            if let ConnectionMessage::Deliver(event) = message {
                events.push((*event).clone());
            }
        }
        events
    }

    /// Assert nothing is delivered for a short window.
    ///
    /// # Panics
    ///
    /// Panics if any message arrives.
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(message)) = tokio::time::timeout(SILENCE_WINDOW, self.inbox.recv()).await {
            panic!("{}: expected silence, got {message:?}", self.id());
        }
    }
}
