//! `RoomActor` - per-room actor that owns room state.
//!
//! Each `RoomActor`:
//! - Owns the `RoomState` for one room id and is its only writer
//! - Holds a `ConnectionHandle` per member for broadcasting
//! - Resolves each transition's audience against current membership and
//!   delivers without blocking
//!
//! The controller decides when a room dies. It sends `Close` after the final
//! `Leave`, so the actor never observes a message for a room it no longer
//! owns.

use crate::errors::PokerError;
use crate::observability::metrics as prom;
use crate::room::{Audience, Outbound, RoomState};
use crate::room_code;

use super::connection::ConnectionHandle;
use super::messages::RoomMessage;
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};

use poker_protocol::{Room, ServerEvent, UserName, VoteValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Default channel buffer size for the room mailbox.
const ROOM_CHANNEL_BUFFER: usize = 500;

/// Handle to a `RoomActor`.
#[derive(Clone, Debug)]
pub struct RoomActorHandle {
    sender: mpsc::Sender<RoomMessage>,
    cancel_token: CancellationToken,
}

impl RoomActorHandle {
    /// Add a connection to the room.
    pub async fn join(
        &self,
        connection: ConnectionHandle,
        name: UserName,
    ) -> Result<(), PokerError> {
        self.send(RoomMessage::Join { connection, name }).await
    }

    pub async fn start_voting(&self, connection_id: String) -> Result<(), PokerError> {
        self.send(RoomMessage::StartVoting { connection_id }).await
    }

    pub async fn end_voting(&self, connection_id: String) -> Result<(), PokerError> {
        self.send(RoomMessage::EndVoting { connection_id }).await
    }

    pub async fn submit_vote(
        &self,
        connection_id: String,
        value: VoteValue,
    ) -> Result<(), PokerError> {
        self.send(RoomMessage::SubmitVote {
            connection_id,
            value,
        })
        .await
    }

    pub async fn change_vote(
        &self,
        connection_id: String,
        value: VoteValue,
    ) -> Result<(), PokerError> {
        self.send(RoomMessage::ChangeVote {
            connection_id,
            value,
        })
        .await
    }

    /// Remove a connection from the room.
    pub async fn leave(&self, connection_id: String) -> Result<(), PokerError> {
        self.send(RoomMessage::Leave { connection_id }).await
    }

    /// Get the current room snapshot.
    pub async fn get_state(&self) -> Result<Option<Room>, PokerError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.send(RoomMessage::GetState { respond_to: tx }).await?;

        rx.await
            .map_err(|e| PokerError::Internal(format!("response receive failed: {e}")))
    }

    /// Stop the actor once every queued message is processed.
    pub async fn close(&self) -> Result<(), PokerError> {
        self.send(RoomMessage::Close).await
    }

    /// Cancel the room actor.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    async fn send(&self, message: RoomMessage) -> Result<(), PokerError> {
        self.sender
            .send(message)
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))
    }
}

/// The `RoomActor` implementation.
pub struct RoomActor {
    room_id: String,
    receiver: mpsc::Receiver<RoomMessage>,
    /// Cancellation token (child of controller's token).
    cancel_token: CancellationToken,
    state: RoomState,
    /// Outbound handles of current members, by connection id.
    connections: HashMap<String, ConnectionHandle>,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl RoomActor {
    /// Spawn a new room actor with an empty room.
    ///
    /// Returns a handle and the task join handle.
    pub fn spawn(
        room_id: String,
        cancel_token: CancellationToken,
        metrics: Arc<ActorMetrics>,
    ) -> (RoomActorHandle, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(ROOM_CHANNEL_BUFFER);

        let actor = Self {
            room_id: room_id.clone(),
            receiver,
            cancel_token: cancel_token.clone(),
            state: RoomState::new(room_id.clone()),
            connections: HashMap::new(),
            metrics,
            mailbox: MailboxMonitor::new(ActorType::Room, &room_id),
        };

        let task_handle = tokio::spawn(actor.run());

        let handle = RoomActorHandle {
            sender,
            cancel_token,
        };

        (handle, task_handle)
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "poker.actor.room", fields(room_id = %self.room_id))]
    async fn run(mut self) {
        info!(
            target: "poker.actor.room",
            room_id = %self.room_id,
            "RoomActor started"
        );

        loop {
            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "poker.actor.room",
                        room_id = %self.room_id,
                        "RoomActor received cancellation signal"
                    );
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(RoomMessage::Close) => {
                            debug!(
                                target: "poker.actor.room",
                                room_id = %self.room_id,
                                "RoomActor closed by controller"
                            );
                            break;
                        }
                        Some(message) => {
                            self.mailbox.observe_backlog(self.receiver.len());
                            self.handle_message(message);
                            self.mailbox.record_processed();
                        }
                        None => {
                            info!(
                                target: "poker.actor.room",
                                room_id = %self.room_id,
                                "RoomActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "poker.actor.room",
            room_id = %self.room_id,
            members = self.state.member_count(),
            messages_processed = self.mailbox.messages_processed(),
            peak_mailbox_depth = self.mailbox.peak_depth(),
            "RoomActor stopped"
        );
    }

    /// Handle a single message.
    fn handle_message(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join { connection, name } => {
                let connection_id = connection.connection_id().to_string();
                self.connections.insert(connection_id.clone(), connection);
                let out = self.state.join(&connection_id, name);
                debug!(
                    target: "poker.actor.room",
                    room_id = %self.room_id,
                    connection_id = %connection_id,
                    members = self.state.member_count(),
                    "Member joined"
                );
                self.broadcast(&connection_id, out);
            }

            RoomMessage::StartVoting { connection_id } => {
                let session_id = room_code::generate_room_id();
                let out = self.state.start_voting(&connection_id, session_id);
                self.broadcast(&connection_id, out);
            }

            RoomMessage::EndVoting { connection_id } => {
                let out = self.state.end_voting(&connection_id);
                self.broadcast(&connection_id, out);
            }

            RoomMessage::SubmitVote {
                connection_id,
                value,
            } => {
                let out = self.state.submit_vote(&connection_id, value);
                self.broadcast(&connection_id, out);
            }

            RoomMessage::ChangeVote {
                connection_id,
                value,
            } => {
                let out = self.state.change_vote(&connection_id, value);
                self.broadcast(&connection_id, out);
            }

            RoomMessage::Leave { connection_id } => {
                let out = self.state.leave(&connection_id);
                self.connections.remove(&connection_id);
                debug!(
                    target: "poker.actor.room",
                    room_id = %self.room_id,
                    connection_id = %connection_id,
                    members = self.state.member_count(),
                    "Member left"
                );
                self.broadcast(&connection_id, out);
            }

            RoomMessage::GetState { respond_to } => {
                let _ = respond_to.send(self.state.snapshot());
            }

            // Intercepted by the run loop
            RoomMessage::Close => {}
        }
    }

    /// Deliver each event to its audience, resolved against current members.
    fn broadcast(&self, requester: &str, out: Vec<Outbound>) {
        for Outbound { event, audience } in out {
            record_event(&event);
            let event = Arc::new(event);

            let mut delivered = 0usize;
            let mut dropped = 0usize;
            for member_id in self.state.member_ids() {
                let included = match audience {
                    Audience::Sender => member_id == requester,
                    Audience::Others => member_id != requester,
                    Audience::All => true,
                };
                if !included {
                    continue;
                }
                let Some(connection) = self.connections.get(member_id) else {
                    continue;
                };
                if connection.deliver(Arc::clone(&event)) {
                    delivered += 1;
                } else {
                    dropped += 1;
                }
            }

            debug!(
                target: "poker.actor.room",
                room_id = %self.room_id,
                event = event.name(),
                delivered,
                dropped,
                "Event broadcast"
            );
        }
    }
}

fn record_event(event: &ServerEvent) {
    match event {
        ServerEvent::VoteReceived(_) => prom::record_vote("received"),
        ServerEvent::VoteChanged(_) => prom::record_vote("changed"),
        ServerEvent::VotingStarted(_) => prom::record_voting_round("started"),
        ServerEvent::VotingEnded(..) => prom::record_voting_round("ended"),
        _ => {}
    }
}
