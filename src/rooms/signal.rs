use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use super::{
    ChatLog, ChatMessage, ClientEvent, ConnectionId, ConnectionRegistry, Participant, RoomDirectory,
    RoomFull, RoomId, ServerEvent,
};

/// Queue of events waiting to be written to one client's socket.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    InRoom,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub connections: usize,
    pub rooms: usize,
    pub messages: usize,
}

/// Shared signaling state. Cloning hands out another handle to the same state.
///
/// Each operation holds one lock for its whole read-modify-write and never
/// awaits while holding it, so joins, departures and chat appends are atomic
/// with respect to each other.
#[derive(Clone, Default)]
pub struct Coordinator {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    registry: ConnectionRegistry,
    rooms: RoomDirectory,
    chat: ChatLog,
    outboxes: HashMap<ConnectionId, Outbox>,
}

impl Inner {
    fn deliver(&self, to: &ConnectionId, event: ServerEvent) {
        if let Some(outbox) = self.outboxes.get(to) {
            // a dropped receiver means the socket is already closing
            let _ = outbox.send(event);
        }
    }

    fn stats(&self) -> Stats {
        Stats {
            connections: self.outboxes.len(),
            rooms: self.rooms.room_count(),
            messages: self.chat.len(),
        }
    }

    /// Takes `conn` out of whatever room it sits in.
    fn vacate(&mut self, conn: &ConnectionId) -> Option<(RoomId, usize)> {
        let room_id = self.registry.remove(conn)?;
        let left = self.rooms.leave(&room_id, conn).len();
        Some((room_id, left))
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and queues the chat history as its first event.
    pub async fn connect(&self, outbox: Outbox) -> ConnectionId {
        let conn = ConnectionId::new();
        let mut inner = self.inner.lock().await;

        // queued before the outbox becomes visible to broadcasts
        let _ = outbox.send(ServerEvent::InitialMessages(inner.chat.snapshot()));
        inner.outboxes.insert(conn, outbox);

        info!(%conn, stats = ?inner.stats(), "connected");
        conn
    }

    pub async fn handle(&self, conn: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room_id, peer_id } => {
                let _ = self.join_room(conn, room_id, peer_id).await;
            }
            ClientEvent::LeaveRoom => self.leave_room(conn).await,
            ClientEvent::SendMessage { author, text } => {
                self.send_message(conn, author, text).await;
            }
        }
    }

    /// Seats `conn` in `room_id` and sends the new roster to everyone in it.
    ///
    /// Rejoining the current room only re-sends the roster to `conn`; the seat keeps
    /// the `peer_id` it was taken with and a different `peer_id` is ignored. A client
    /// with a new peer id has to `leave-room` first. Joining a different room moves
    /// `conn` out of its old one once the new seat is secured.
    pub async fn join_room(
        &self,
        conn: ConnectionId,
        room_id: RoomId,
        peer_id: String,
    ) -> Result<Vec<Participant>, RoomFull> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        if !inner.outboxes.contains_key(&conn) {
            debug!(%conn, "join from closed connection ignored");
            return Ok(Vec::new());
        }

        let previous = inner.registry.lookup(&conn).cloned();
        if previous.as_deref() == Some(room_id.as_str()) {
            let roster = inner.rooms.roster(&room_id).to_vec();
            inner.deliver(&conn, ServerEvent::AllUsers(roster.clone()));
            return Ok(roster);
        }

        let roster = match inner.rooms.join(&room_id, Participant::new(peer_id, conn)) {
            Ok(roster) => roster.clone(),
            Err(full) => {
                warn!(%conn, room = %room_id, "room full, join rejected");
                inner.deliver(&conn, ServerEvent::RoomFull);
                return Err(full);
            }
        };

        if let Some((old_room, left)) = previous.and_then(|_| inner.vacate(&conn)) {
            info!(%conn, room = %old_room, size = left, "moved out of room");
        }
        inner.registry.register(conn, room_id.clone());

        for participant in &roster {
            inner.deliver(&participant.connection_id, ServerEvent::AllUsers(roster.clone()));
        }

        info!(%conn, room = %room_id, size = roster.len(), "joined room");
        Ok(roster)
    }

    /// Explicit departure. Remaining members are not notified.
    pub async fn leave_room(&self, conn: ConnectionId) {
        let mut inner = self.inner.lock().await;
        if let Some((room_id, left)) = inner.vacate(&conn) {
            info!(%conn, room = %room_id, size = left, "left room");
        }
    }

    /// Appends to the chat log and relays the message to every connected client.
    pub async fn send_message(
        &self,
        conn: ConnectionId,
        author: String,
        text: String,
    ) -> Option<ChatMessage> {
        let mut inner = self.inner.lock().await;
        if !inner.outboxes.contains_key(&conn) {
            debug!(%conn, "message from closed connection ignored");
            return None;
        }

        let message = inner.chat.append(author, text).clone();
        for outbox in inner.outboxes.values() {
            let _ = outbox.send(ServerEvent::NewMessage(message.clone()));
        }

        debug!(%conn, id = message.id, recipients = inner.outboxes.len(), "relayed message");
        Some(message)
    }

    /// Forgets `conn`. Safe to call more than once.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let mut inner = self.inner.lock().await;
        let was_open = inner.outboxes.remove(&conn).is_some();

        if let Some((room_id, left)) = inner.vacate(&conn) {
            info!(%conn, room = %room_id, size = left, "left room");
        }
        if was_open {
            info!(%conn, stats = ?inner.stats(), "disconnected");
        }
    }

    pub async fn state(&self, conn: &ConnectionId) -> ConnectionState {
        let inner = self.inner.lock().await;
        if !inner.outboxes.contains_key(conn) {
            ConnectionState::Disconnected
        } else if inner.registry.lookup(conn).is_some() {
            ConnectionState::InRoom
        } else {
            ConnectionState::Connected
        }
    }

    pub async fn roster(&self, room_id: &str) -> Vec<Participant> {
        self.inner.lock().await.rooms.roster(room_id).to_vec()
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.inner.lock().await.chat.snapshot()
    }

    pub async fn stats(&self) -> Stats {
        self.inner.lock().await.stats()
    }
}
