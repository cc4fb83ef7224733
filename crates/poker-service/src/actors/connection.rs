//! `ConnectionActor` - per-socket writer actor.
//!
//! Each `ConnectionActor`:
//! - Owns the write half of exactly one WebSocket
//! - Drains a bounded mailbox of outbound events and writes them as text frames
//! - Closes the socket on request or when the controller's token is cancelled
//!
//! Room actors hold a cloned `ConnectionHandle` per member and deliver with
//! `try_send`, so a slow client can never stall a room. When the mailbox is
//! full the event is dropped for that connection only.
//!
//! # Lifecycle
//!
//! 1. Spawned by the gateway right after the WebSocket upgrade
//! 2. Runs until the socket write fails, `Close` is received, or cancellation
//! 3. The gateway's read loop raises the disconnect that removes the
//!    connection from its rooms

use crate::errors::PokerError;

use super::messages::ConnectionMessage;
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};

use axum::extract::ws::{close_code, CloseFrame, Message};
use futures::{Sink, SinkExt};
use poker_protocol::{encode_server_event, ServerEvent};
use std::borrow::Cow;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Handle to a `ConnectionActor`.
#[derive(Clone, Debug)]
pub struct ConnectionHandle {
    sender: mpsc::Sender<ConnectionMessage>,
    cancel_token: CancellationToken,
    connection_id: String,
    metrics: Arc<ActorMetrics>,
}

impl ConnectionHandle {
    /// Create a handle and the mailbox it feeds.
    ///
    /// The receiver is handed to [`ConnectionActor::spawn`]; tests may read
    /// it directly instead.
    #[must_use]
    pub fn channel(
        connection_id: String,
        buffer: usize,
        cancel_token: CancellationToken,
        metrics: Arc<ActorMetrics>,
    ) -> (Self, mpsc::Receiver<ConnectionMessage>) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let handle = Self {
            sender,
            cancel_token,
            connection_id,
            metrics,
        };
        (handle, receiver)
    }

    /// Get the connection ID.
    #[must_use]
    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    /// Queue an event without waiting.
    ///
    /// Returns `false` if the event was dropped, either because the mailbox
    /// is full or because the connection is gone.
    pub fn deliver(&self, event: Arc<ServerEvent>) -> bool {
        match self.sender.try_send(ConnectionMessage::Deliver(event)) {
            Ok(()) => true,
            Err(TrySendError::Full(ConnectionMessage::Deliver(event))) => {
                self.metrics.record_event_dropped();
                warn!(
                    target: "poker.actor.connection",
                    connection_id = %self.connection_id,
                    event = event.name(),
                    "Outbound mailbox full, event dropped"
                );
                false
            }
            Err(TrySendError::Full(_)) => {
                self.metrics.record_event_dropped();
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(
                    target: "poker.actor.connection",
                    connection_id = %self.connection_id,
                    "Connection gone, event discarded"
                );
                false
            }
        }
    }

    /// Ask the actor to close the socket.
    ///
    /// # Errors
    ///
    /// Returns `PokerError::Internal` if the actor has already stopped.
    pub async fn close(&self, reason: String) -> Result<(), PokerError> {
        self.sender
            .send(ConnectionMessage::Close { reason })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))
    }

    /// Cancel the connection actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

/// The `ConnectionActor` implementation.
///
/// Generic over the socket write half so tests can substitute an in-memory
/// sink.
pub struct ConnectionActor<S> {
    connection_id: String,
    receiver: mpsc::Receiver<ConnectionMessage>,
    sink: S,
    /// Cancellation token (child of the controller's token).
    cancel_token: CancellationToken,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl<S> ConnectionActor<S>
where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: Display,
{
    /// Spawn the actor over an existing mailbox.
    ///
    /// Returns the task join handle.
    pub fn spawn(
        connection_id: String,
        receiver: mpsc::Receiver<ConnectionMessage>,
        sink: S,
        cancel_token: CancellationToken,
        metrics: Arc<ActorMetrics>,
    ) -> JoinHandle<()> {
        let actor = Self {
            mailbox: MailboxMonitor::new(ActorType::Connection, &connection_id),
            connection_id,
            receiver,
            sink,
            cancel_token,
            metrics,
        };

        tokio::spawn(actor.run())
    }

    /// Run the actor message loop.
    #[instrument(
        skip_all,
        name = "poker.actor.connection",
        fields(connection_id = %self.connection_id)
    )]
    async fn run(mut self) {
        debug!(
            target: "poker.actor.connection",
            connection_id = %self.connection_id,
            "ConnectionActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    debug!(
                        target: "poker.actor.connection",
                        connection_id = %self.connection_id,
                        "ConnectionActor received cancellation signal"
                    );
                    self.close_socket(close_code::AWAY, "server shutting down").await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.observe_backlog(self.receiver.len());
                            let should_exit = self.handle_message(message).await;
                            self.mailbox.record_processed();

                            if should_exit {
                                break;
                            }
                        }
                        None => {
                            debug!(
                                target: "poker.actor.connection",
                                connection_id = %self.connection_id,
                                "ConnectionActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "poker.actor.connection",
            connection_id = %self.connection_id,
            messages_processed = self.mailbox.messages_processed(),
            peak_mailbox_depth = self.mailbox.peak_depth(),
            "ConnectionActor stopped"
        );
    }

    /// Handle a single message. Returns true if the actor should exit.
    async fn handle_message(&mut self, message: ConnectionMessage) -> bool {
        match message {
            ConnectionMessage::Deliver(event) => !self.write_event(&event).await,
            ConnectionMessage::Close { reason } => {
                self.close_socket(close_code::NORMAL, &reason).await;
                true
            }
        }
    }

    /// Write one event. Returns false once the socket is unusable.
    async fn write_event(&mut self, event: &ServerEvent) -> bool {
        let frame = match encode_server_event(event) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    target: "poker.actor.connection",
                    connection_id = %self.connection_id,
                    event = event.name(),
                    error = %e,
                    "Failed to encode event"
                );
                return true;
            }
        };

        match self.sink.send(Message::Text(frame)).await {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    target: "poker.actor.connection",
                    connection_id = %self.connection_id,
                    error = %e,
                    "Socket write failed, stopping"
                );
                false
            }
        }
    }

    async fn close_socket(&mut self, code: u16, reason: &str) {
        let frame = CloseFrame {
            code,
            reason: Cow::Owned(reason.to_string()),
        };
        if let Err(e) = self.sink.send(Message::Close(Some(frame))).await {
            debug!(
                target: "poker.actor.connection",
                connection_id = %self.connection_id,
                error = %e,
                "Close frame not sent"
            );
        }
    }
}
