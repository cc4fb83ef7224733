//! `RoomControllerActor` - singleton registry and supervisor for room actors.
//!
//! The `RoomControllerActor` is the top-level actor in the hierarchy:
//!
//! - Singleton per service instance
//! - Owns the room registry: room id to `RoomActor`, plus each room's member set
//! - Keeps the reverse index connection id to room ids, so a disconnect only
//!   touches the rooms that connection is in
//! - Creates a room on the first join and removes it when its last member
//!   leaves
//! - Owns the root `CancellationToken` for graceful shutdown
//! - Monitors child actor health (panic detection via `JoinHandle`)
//!
//! Every join and leave passes through here, so the member sets are
//! authoritative. When a set empties the room is removed from the map in the
//! same step and a `Close` is queued behind the final `Leave`. A later join
//! to the same id gets a fresh actor.
//!
//! # Graceful Shutdown
//!
//! On SIGTERM, the controller:
//! 1. Sets `accepting_new = false`
//! 2. Cancels the root `CancellationToken` (propagates to rooms and connections)
//! 3. Waits for room actors to stop, bounded by the shutdown deadline

use crate::errors::PokerError;
use crate::room_code;

use super::connection::ConnectionHandle;
use super::messages::{is_valid_room_id, ControllerMessage, ControllerStatus, RoomIntent};
use super::metrics::{ActorMetrics, ActorType, MailboxMonitor};
use super::room::{RoomActor, RoomActorHandle};

use poker_protocol::{Room, UserName};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Default channel buffer size for the controller mailbox.
const CONTROLLER_CHANNEL_BUFFER: usize = 1000;

/// Default time to wait for room actors during shutdown.
const DEFAULT_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(10);

/// Time to wait for a removed room actor to finish.
const ROOM_CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Codes tried before giving up on finding an unused one.
const ALLOCATE_ATTEMPTS: usize = 16;

/// Handle to the `RoomControllerActor`.
///
/// This is the public interface for interacting with the controller.
#[derive(Clone, Debug)]
pub struct RoomControllerHandle {
    sender: mpsc::Sender<ControllerMessage>,
    cancel_token: CancellationToken,
}

impl RoomControllerHandle {
    /// Create a new `RoomControllerActor` and return a handle to it.
    ///
    /// This spawns the actor task and returns immediately.
    ///
    /// # Arguments
    ///
    /// * `instance_id` - Service instance ID, for logs
    /// * `max_rooms` - Registry capacity; joins that would create more rooms are dropped
    /// * `metrics` - Shared actor metrics
    #[must_use]
    pub fn new(instance_id: String, max_rooms: usize, metrics: Arc<ActorMetrics>) -> Self {
        let (sender, receiver) = mpsc::channel(CONTROLLER_CHANNEL_BUFFER);
        let cancel_token = CancellationToken::new();

        let actor = RoomControllerActor::new(
            instance_id,
            max_rooms,
            receiver,
            cancel_token.clone(),
            metrics,
        );

        tokio::spawn(actor.run());

        Self {
            sender,
            cancel_token,
        }
    }

    /// Route a validated intent to its room.
    ///
    /// Fire-and-forget: rejected intents produce no events and no error.
    pub async fn dispatch(
        &self,
        connection: ConnectionHandle,
        room_id: String,
        intent: RoomIntent,
    ) -> Result<(), PokerError> {
        self.sender
            .send(ControllerMessage::Dispatch {
                connection,
                room_id,
                intent,
            })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))
    }

    /// Remove the connection from every room it belongs to.
    pub async fn disconnect(&self, connection_id: String) -> Result<(), PokerError> {
        self.sender
            .send(ControllerMessage::Disconnect { connection_id })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))
    }

    /// Snapshot of a live room, `None` if no such room exists.
    pub async fn get_room(&self, room_id: String) -> Result<Option<Room>, PokerError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::GetRoom {
                room_id,
                respond_to: tx,
            })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| PokerError::Internal(format!("response receive failed: {e}")))
    }

    /// Pick a room code that is not currently in use.
    ///
    /// The code is not reserved; the room is created by its first join.
    pub async fn allocate_room_id(&self) -> Result<String, PokerError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::AllocateRoomId { respond_to: tx })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| PokerError::Internal(format!("response receive failed: {e}")))?
    }

    /// Get the current controller status.
    pub async fn get_status(&self) -> Result<ControllerStatus, PokerError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::GetStatus { respond_to: tx })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| PokerError::Internal(format!("response receive failed: {e}")))
    }

    /// Initiate graceful shutdown.
    pub async fn shutdown(&self, deadline: Duration) -> Result<(), PokerError> {
        let (tx, rx) = tokio::sync::oneshot::channel();
        self.sender
            .send(ControllerMessage::Shutdown {
                deadline,
                respond_to: tx,
            })
            .await
            .map_err(|e| PokerError::Internal(format!("channel send failed: {e}")))?;

        rx.await
            .map_err(|e| PokerError::Internal(format!("response receive failed: {e}")))?
    }

    /// Cancel the actor (for immediate shutdown).
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// Check if the actor is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Get a child token for connection actors.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }
}

/// Internal state for a managed room.
struct ManagedRoom {
    handle: RoomActorHandle,
    /// Join handle for monitoring the actor task.
    task_handle: JoinHandle<()>,
    /// Connection ids currently in the room.
    members: HashSet<String>,
}

/// The `RoomControllerActor` implementation.
pub struct RoomControllerActor {
    instance_id: String,
    receiver: mpsc::Receiver<ControllerMessage>,
    /// Cancellation token (root).
    cancel_token: CancellationToken,
    /// Live rooms by id.
    rooms: HashMap<String, ManagedRoom>,
    /// Rooms each connection belongs to.
    memberships: HashMap<String, HashSet<String>>,
    max_rooms: usize,
    /// Whether the controller is accepting new rooms.
    accepting_new: bool,
    shutdown_deadline: Duration,
    metrics: Arc<ActorMetrics>,
    mailbox: MailboxMonitor,
}

impl RoomControllerActor {
    fn new(
        instance_id: String,
        max_rooms: usize,
        receiver: mpsc::Receiver<ControllerMessage>,
        cancel_token: CancellationToken,
        metrics: Arc<ActorMetrics>,
    ) -> Self {
        let mailbox = MailboxMonitor::new(ActorType::Controller, &instance_id);

        Self {
            instance_id,
            receiver,
            cancel_token,
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            max_rooms,
            accepting_new: true,
            shutdown_deadline: DEFAULT_SHUTDOWN_DEADLINE,
            metrics,
            mailbox,
        }
    }

    /// Run the actor message loop.
    #[instrument(skip_all, name = "poker.actor.controller", fields(instance_id = %self.instance_id))]
    async fn run(mut self) {
        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            max_rooms = self.max_rooms,
            "RoomControllerActor started"
        );

        loop {
            // Check for terminated room actors
            self.check_room_health().await;

            tokio::select! {
                () = self.cancel_token.cancelled() => {
                    info!(
                        target: "poker.actor.controller",
                        instance_id = %self.instance_id,
                        "RoomControllerActor received cancellation signal"
                    );
                    self.graceful_shutdown().await;
                    break;
                }

                msg = self.receiver.recv() => {
                    match msg {
                        Some(message) => {
                            self.mailbox.observe_backlog(self.receiver.len());
                            self.handle_message(message).await;
                            self.mailbox.record_processed();
                        }
                        None => {
                            info!(
                                target: "poker.actor.controller",
                                instance_id = %self.instance_id,
                                "RoomControllerActor channel closed, exiting"
                            );
                            break;
                        }
                    }
                }
            }
        }

        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            rooms_remaining = self.rooms.len(),
            messages_processed = self.mailbox.messages_processed(),
            peak_mailbox_depth = self.mailbox.peak_depth(),
            "RoomControllerActor stopped"
        );
    }

    /// Handle a single message.
    async fn handle_message(&mut self, message: ControllerMessage) {
        match message {
            ControllerMessage::Dispatch {
                connection,
                room_id,
                intent,
            } => {
                self.handle_dispatch(connection, room_id, intent).await;
            }

            ControllerMessage::Disconnect { connection_id } => {
                self.handle_disconnect(&connection_id).await;
            }

            ControllerMessage::GetRoom {
                room_id,
                respond_to,
            } => {
                let room = self.get_room(&room_id).await;
                let _ = respond_to.send(room);
            }

            ControllerMessage::AllocateRoomId { respond_to } => {
                let _ = respond_to.send(self.allocate_room_id());
            }

            ControllerMessage::GetStatus { respond_to } => {
                let _ = respond_to.send(self.get_status());
            }

            ControllerMessage::Shutdown {
                deadline,
                respond_to,
            } => {
                let result = self.initiate_shutdown(deadline);
                let _ = respond_to.send(result);
            }
        }
    }

    async fn handle_dispatch(
        &mut self,
        connection: ConnectionHandle,
        room_id: String,
        intent: RoomIntent,
    ) {
        if !is_valid_room_id(&room_id) {
            debug!(
                target: "poker.actor.controller",
                connection_id = %connection.connection_id(),
                intent = intent.name(),
                "Intent with invalid room id dropped"
            );
            return;
        }

        let connection_id = connection.connection_id().to_string();
        let intent_name = intent.name();
        match intent {
            RoomIntent::Join { name } => self.join_room(connection, room_id, name).await,
            RoomIntent::Leave => self.leave_room(&connection_id, &room_id).await,
            RoomIntent::StartVoting => {
                if let Some(room) = self.room_handle(&room_id, intent_name) {
                    self.report(&room_id, room.start_voting(connection_id).await);
                }
            }
            RoomIntent::EndVoting => {
                if let Some(room) = self.room_handle(&room_id, intent_name) {
                    self.report(&room_id, room.end_voting(connection_id).await);
                }
            }
            RoomIntent::SubmitVote(value) => {
                if let Some(room) = self.room_handle(&room_id, intent_name) {
                    self.report(&room_id, room.submit_vote(connection_id, value).await);
                }
            }
            RoomIntent::ChangeVote(value) => {
                if let Some(room) = self.room_handle(&room_id, intent_name) {
                    self.report(&room_id, room.change_vote(connection_id, value).await);
                }
            }
        }
    }

    /// Handle of a live room. Intents for absent rooms are no-ops.
    fn room_handle(&self, room_id: &str, intent: &'static str) -> Option<RoomActorHandle> {
        let handle = self.rooms.get(room_id).map(|managed| managed.handle.clone());
        if handle.is_none() {
            debug!(
                target: "poker.actor.controller",
                room_id = %room_id,
                intent,
                "Intent for unknown room dropped"
            );
        }
        handle
    }

    fn report(&self, room_id: &str, result: Result<(), PokerError>) {
        if let Err(e) = result {
            warn!(
                target: "poker.actor.controller",
                instance_id = %self.instance_id,
                room_id = %room_id,
                error = %e,
                "Failed to forward intent to room actor"
            );
        }
    }

    /// Add a connection to a room, creating the room if needed.
    async fn join_room(&mut self, connection: ConnectionHandle, room_id: String, name: UserName) {
        if !self.rooms.contains_key(&room_id) && !self.create_room(&room_id) {
            return;
        }
        let Some(managed) = self.rooms.get_mut(&room_id) else {
            return;
        };

        let connection_id = connection.connection_id().to_string();
        managed.members.insert(connection_id.clone());
        self.memberships
            .entry(connection_id)
            .or_default()
            .insert(room_id.clone());

        let result = managed.handle.join(connection, name).await;
        self.report(&room_id, result);
    }

    /// Spawn a room actor. Returns false if the registry refuses new rooms.
    fn create_room(&mut self, room_id: &str) -> bool {
        if !self.accepting_new {
            debug!(
                target: "poker.actor.controller",
                room_id = %room_id,
                "Draining, new room not created"
            );
            return false;
        }
        if self.rooms.len() >= self.max_rooms {
            warn!(
                target: "poker.actor.controller",
                instance_id = %self.instance_id,
                room_id = %room_id,
                max_rooms = self.max_rooms,
                "Room capacity reached, join dropped"
            );
            return false;
        }

        let (handle, task_handle) = RoomActor::spawn(
            room_id.to_string(),
            self.cancel_token.child_token(),
            Arc::clone(&self.metrics),
        );
        self.rooms.insert(
            room_id.to_string(),
            ManagedRoom {
                handle,
                task_handle,
                members: HashSet::new(),
            },
        );
        self.metrics.room_created();

        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            room_id = %room_id,
            total_rooms = self.rooms.len(),
            "Room created"
        );
        true
    }

    /// Remove a connection from one room, deleting the room if it empties.
    async fn leave_room(&mut self, connection_id: &str, room_id: &str) {
        let Some(managed) = self.rooms.get_mut(room_id) else {
            return;
        };
        if !managed.members.remove(connection_id) {
            return;
        }

        if let Some(rooms) = self.memberships.get_mut(connection_id) {
            rooms.remove(room_id);
            if rooms.is_empty() {
                self.memberships.remove(connection_id);
            }
        }

        let result = managed.handle.leave(connection_id.to_string()).await;
        let now_empty = managed.members.is_empty();
        self.report(room_id, result);

        if now_empty {
            self.remove_room(room_id).await;
        }
    }

    async fn handle_disconnect(&mut self, connection_id: &str) {
        let rooms = self.memberships.remove(connection_id).unwrap_or_default();
        debug!(
            target: "poker.actor.controller",
            connection_id = %connection_id,
            rooms = rooms.len(),
            "Connection disconnected"
        );

        for room_id in rooms {
            self.leave_room(connection_id, &room_id).await;
        }
    }

    /// Remove an empty room.
    ///
    /// The room actor is closed through its mailbox, so it finishes the
    /// final leave broadcast first. Waiting for the task happens in the
    /// background to avoid blocking the message loop.
    async fn remove_room(&mut self, room_id: &str) {
        let Some(managed) = self.rooms.remove(room_id) else {
            return;
        };

        if let Err(e) = managed.handle.close().await {
            debug!(
                target: "poker.actor.controller",
                room_id = %room_id,
                error = %e,
                "Room actor already stopped"
            );
        }

        let room_id_owned = room_id.to_string();
        let instance_id = self.instance_id.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(ROOM_CLEANUP_TIMEOUT, managed.task_handle).await {
                Ok(Ok(())) => {
                    debug!(
                        target: "poker.actor.controller",
                        instance_id = %instance_id,
                        room_id = %room_id_owned,
                        "Room actor task completed cleanly"
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        target: "poker.actor.controller",
                        instance_id = %instance_id,
                        room_id = %room_id_owned,
                        error = ?e,
                        "Room actor task panicked during removal"
                    );
                }
                Err(_) => {
                    warn!(
                        target: "poker.actor.controller",
                        instance_id = %instance_id,
                        room_id = %room_id_owned,
                        "Room actor task cleanup timed out"
                    );
                }
            }
        });

        self.metrics.room_removed();

        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            room_id = %room_id,
            total_rooms = self.rooms.len(),
            "Room removed"
        );
    }

    async fn get_room(&self, room_id: &str) -> Option<Room> {
        let managed = self.rooms.get(room_id)?;
        match managed.handle.get_state().await {
            Ok(room) => room,
            Err(e) => {
                warn!(
                    target: "poker.actor.controller",
                    instance_id = %self.instance_id,
                    room_id = %room_id,
                    error = %e,
                    "Failed to query room actor state"
                );
                None
            }
        }
    }

    fn allocate_room_id(&self) -> Result<String, PokerError> {
        if !self.accepting_new {
            return Err(PokerError::Draining);
        }
        if self.rooms.len() >= self.max_rooms {
            return Err(PokerError::CapacityExceeded);
        }

        (0..ALLOCATE_ATTEMPTS)
            .map(|_| room_code::generate_room_id())
            .find(|code| !self.rooms.contains_key(code))
            .ok_or_else(|| PokerError::Internal("no unused room code found".to_string()))
    }

    fn get_status(&self) -> ControllerStatus {
        ControllerStatus {
            room_count: self.rooms.len(),
            member_count: self.rooms.values().map(|m| m.members.len()).sum(),
            connection_count: self.metrics.connection_count(),
            is_draining: !self.accepting_new,
            mailbox_depth: self.mailbox.current_depth(),
        }
    }

    fn initiate_shutdown(&mut self, deadline: Duration) -> Result<(), PokerError> {
        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            room_count = self.rooms.len(),
            deadline_secs = deadline.as_secs(),
            "Initiating graceful shutdown"
        );

        self.accepting_new = false;
        self.shutdown_deadline = deadline;

        // Cancel the root token (propagates to all children)
        self.cancel_token.cancel();

        Ok(())
    }

    async fn graceful_shutdown(&mut self) {
        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            room_count = self.rooms.len(),
            "Performing graceful shutdown"
        );

        self.accepting_new = false;

        // Already done via parent token, but be explicit
        for managed in self.rooms.values() {
            managed.handle.cancel();
        }

        for (room_id, managed) in self.rooms.drain() {
            match tokio::time::timeout(self.shutdown_deadline, managed.task_handle).await {
                Ok(Ok(())) => {
                    debug!(
                        target: "poker.actor.controller",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        "Room actor completed cleanly"
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        target: "poker.actor.controller",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        error = ?e,
                        "Room actor task panicked during shutdown"
                    );
                }
                Err(_) => {
                    warn!(
                        target: "poker.actor.controller",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        "Room actor shutdown timed out"
                    );
                }
            }
            self.metrics.room_removed();
        }
        self.memberships.clear();

        info!(
            target: "poker.actor.controller",
            instance_id = %self.instance_id,
            "Graceful shutdown complete"
        );
    }

    /// Check health of managed room actors.
    async fn check_room_health(&mut self) {
        let failed_rooms: Vec<String> = self
            .rooms
            .iter()
            .filter(|(_, managed)| managed.task_handle.is_finished())
            .map(|(room_id, _)| room_id.clone())
            .collect();

        for room_id in failed_rooms {
            let Some(managed) = self.rooms.remove(&room_id) else {
                continue;
            };
            warn!(
                target: "poker.actor.controller",
                instance_id = %self.instance_id,
                room_id = %room_id,
                members = managed.members.len(),
                "Room actor task finished unexpectedly"
            );

            for connection_id in &managed.members {
                if let Some(rooms) = self.memberships.get_mut(connection_id) {
                    rooms.remove(&room_id);
                    if rooms.is_empty() {
                        self.memberships.remove(connection_id);
                    }
                }
            }

            match managed.task_handle.await {
                Ok(()) => {
                    info!(
                        target: "poker.actor.controller",
                        instance_id = %self.instance_id,
                        room_id = %room_id,
                        "Room actor exited cleanly"
                    );
                }
                Err(join_error) => {
                    if join_error.is_panic() {
                        error!(
                            target: "poker.actor.controller",
                            instance_id = %self.instance_id,
                            room_id = %room_id,
                            error = ?join_error,
                            "Room actor panicked - room state lost"
                        );
                        self.metrics.record_panic(ActorType::Room);
                    }
                }
            }

            self.metrics.room_removed();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::actors::messages::ConnectionMessage;

    fn connection(
        id: &str,
        metrics: &Arc<ActorMetrics>,
    ) -> (ConnectionHandle, mpsc::Receiver<ConnectionMessage>) {
        ConnectionHandle::channel(
            id.to_string(),
            64,
            CancellationToken::new(),
            Arc::clone(metrics),
        )
    }

    fn join(name: &str) -> RoomIntent {
        RoomIntent::Join {
            name: UserName::parse(name).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_controller_join_creates_room() {
        let metrics = ActorMetrics::new();
        let handle = RoomControllerHandle::new("poker-test-001".to_string(), 10, Arc::clone(&metrics));
        let (alice, _inbox) = connection("conn-a", &metrics);

        handle
            .dispatch(alice, "AB12CD".to_string(), join("Alice"))
            .await
            .unwrap();

        let room = handle.get_room("AB12CD".to_string()).await.unwrap().unwrap();
        assert_eq!(room.id, "AB12CD");
        assert_eq!(room.host.id, "conn-a");

        let status = handle.get_status().await.unwrap();
        assert_eq!(status.room_count, 1);
        assert_eq!(status.member_count, 1);
        assert!(!status.is_draining);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_get_nonexistent_room() {
        let handle = RoomControllerHandle::new("poker-test-002".to_string(), 10, ActorMetrics::new());

        let room = handle.get_room("NOPE".to_string()).await.unwrap();
        assert!(room.is_none());

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_last_leave_removes_room() {
        let metrics = ActorMetrics::new();
        let handle = RoomControllerHandle::new("poker-test-003".to_string(), 10, Arc::clone(&metrics));
        let (alice, _inbox) = connection("conn-a", &metrics);

        handle
            .dispatch(alice.clone(), "R1".to_string(), join("Alice"))
            .await
            .unwrap();
        handle
            .dispatch(alice, "R1".to_string(), RoomIntent::Leave)
            .await
            .unwrap();

        assert!(handle.get_room("R1".to_string()).await.unwrap().is_none());
        assert_eq!(handle.get_status().await.unwrap().room_count, 0);
        assert_eq!(metrics.room_count(), 0);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_disconnect_leaves_every_room() {
        let metrics = ActorMetrics::new();
        let handle = RoomControllerHandle::new("poker-test-004".to_string(), 10, Arc::clone(&metrics));
        let (alice, _a) = connection("conn-a", &metrics);
        let (bob, _b) = connection("conn-b", &metrics);

        for room_id in ["R1", "R2"] {
            handle
                .dispatch(alice.clone(), room_id.to_string(), join("Alice"))
                .await
                .unwrap();
        }
        handle
            .dispatch(bob, "R2".to_string(), join("Bob"))
            .await
            .unwrap();

        handle.disconnect("conn-a".to_string()).await.unwrap();

        assert!(handle.get_room("R1".to_string()).await.unwrap().is_none());
        let r2 = handle.get_room("R2".to_string()).await.unwrap().unwrap();
        assert_eq!(r2.users.len(), 1);
        assert_eq!(r2.host.id, "conn-b");

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_capacity_drops_new_rooms() {
        let metrics = ActorMetrics::new();
        let handle = RoomControllerHandle::new("poker-test-005".to_string(), 1, Arc::clone(&metrics));
        let (alice, _a) = connection("conn-a", &metrics);
        let (bob, _b) = connection("conn-b", &metrics);

        handle
            .dispatch(alice, "R1".to_string(), join("Alice"))
            .await
            .unwrap();
        handle
            .dispatch(bob.clone(), "R2".to_string(), join("Bob"))
            .await
            .unwrap();
        assert!(handle.get_room("R2".to_string()).await.unwrap().is_none());

        // Existing rooms still accept members
        handle
            .dispatch(bob, "R1".to_string(), join("Bob"))
            .await
            .unwrap();
        let r1 = handle.get_room("R1".to_string()).await.unwrap().unwrap();
        assert_eq!(r1.users.len(), 2);

        let result = handle.allocate_room_id().await;
        assert!(matches!(result, Err(PokerError::CapacityExceeded)));

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_invalid_room_id_dropped() {
        let metrics = ActorMetrics::new();
        let handle = RoomControllerHandle::new("poker-test-006".to_string(), 10, Arc::clone(&metrics));
        let (alice, _a) = connection("conn-a", &metrics);

        handle
            .dispatch(alice, String::new(), join("Alice"))
            .await
            .unwrap();
        assert_eq!(handle.get_status().await.unwrap().room_count, 0);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_allocate_room_id() {
        let handle = RoomControllerHandle::new("poker-test-007".to_string(), 10, ActorMetrics::new());

        let code = handle.allocate_room_id().await.unwrap();
        assert_eq!(code.len(), room_code::CODE_LEN);

        handle.cancel();
    }

    #[tokio::test]
    async fn test_controller_shutdown() {
        let metrics = ActorMetrics::new();
        let handle = RoomControllerHandle::new("poker-test-008".to_string(), 10, Arc::clone(&metrics));
        let (alice, _a) = connection("conn-a", &metrics);
        handle
            .dispatch(alice, "R1".to_string(), join("Alice"))
            .await
            .unwrap();

        let result = handle.shutdown(Duration::from_secs(1)).await;
        assert!(result.is_ok());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_cancelled());
        assert_eq!(metrics.room_count(), 0);
    }

    #[tokio::test]
    async fn test_controller_cancellation_token() {
        let handle = RoomControllerHandle::new("poker-test-009".to_string(), 10, ActorMetrics::new());

        let child = handle.child_token();
        assert!(!child.is_cancelled());

        handle.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(handle.is_cancelled());
        assert!(child.is_cancelled());
    }
}
