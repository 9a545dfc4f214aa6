mod event;
mod msg;
mod registry;
mod room;
mod signal;
mod ws;

use std::fmt;

use axum::{Router, routing::get};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;

pub use event::{ClientEvent, ServerEvent};
pub use msg::{ChatLog, ChatMessage};
pub use registry::ConnectionRegistry;
pub use room::{Participant, ROOM_CAPACITY, RoomDirectory, RoomFull, Roster};
pub use signal::{ConnectionState, Coordinator, Outbox, Stats};

/// Caller-chosen room name, taken as-is.
pub type RoomId = String;

/// Identifies one live socket. Fresh for every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(ws::signal_ws))
}
