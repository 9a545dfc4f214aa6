use std::collections::HashMap;

use super::{ConnectionId, RoomId};

/// Which room each live connection has joined.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    rooms: HashMap<ConnectionId, RoomId>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, room_id: RoomId) {
        self.rooms.insert(connection_id, room_id);
    }

    pub fn lookup(&self, connection_id: &ConnectionId) -> Option<&RoomId> {
        self.rooms.get(connection_id)
    }

    /// Absent entries are fine, disconnect cleanup may run more than once.
    pub fn remove(&mut self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.rooms.remove(connection_id)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
