use std::{collections::HashMap, fmt};

use serde::Serialize;

use super::{ConnectionId, RoomId};

/// Most participants a single room will hold.
pub const ROOM_CAPACITY: usize = 10;

/// One connection's seat in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Handed to us by the client's peer-connection library, never interpreted.
    pub peer_id: String,
    pub connection_id: ConnectionId,
}

impl Participant {
    pub fn new(peer_id: impl Into<String>, connection_id: ConnectionId) -> Self {
        Self {
            peer_id: peer_id.into(),
            connection_id,
        }
    }
}

pub type Roster = Vec<Participant>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomFull {
    pub room_id: RoomId,
}

impl fmt::Display for RoomFull {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "room {:?} already has {ROOM_CAPACITY} participants", self.room_id)
    }
}

impl std::error::Error for RoomFull {}

/// Rosters by room. Rooms appear on first join and are kept even once empty.
#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomId, Roster>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `participant` to the room and returns the resulting roster.
    ///
    /// A full room is left untouched.
    pub fn join(&mut self, room_id: &str, participant: Participant) -> Result<&Roster, RoomFull> {
        if self.roster(room_id).len() >= ROOM_CAPACITY {
            return Err(RoomFull {
                room_id: room_id.to_owned(),
            });
        }

        let roster = self.rooms.entry(room_id.to_owned()).or_default();
        roster.push(participant);
        Ok(&*roster)
    }

    /// Drops the participant seated by `connection_id`, keeping everyone else in order.
    pub fn leave(&mut self, room_id: &str, connection_id: &ConnectionId) -> &[Participant] {
        match self.rooms.get_mut(room_id) {
            Some(roster) => {
                roster.retain(|p| p.connection_id != *connection_id);
                roster.as_slice()
            }
            None => &[],
        }
    }

    pub fn roster(&self, room_id: &str) -> &[Participant] {
        self.rooms.get(room_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(n: usize) -> Participant {
        Participant::new(format!("peer{n}"), ConnectionId::new())
    }

    #[test]
    fn first_join_creates_room() {
        let mut rooms = RoomDirectory::new();
        let p = seat(0);

        let roster = rooms.join("r1", p.clone()).unwrap();
        assert_eq!(roster, &vec![p]);
        assert_eq!(rooms.room_count(), 1);
    }

    #[test]
    fn joins_keep_order_up_to_capacity() {
        let mut rooms = RoomDirectory::new();
        let seats: Vec<_> = (0..ROOM_CAPACITY).map(seat).collect();

        for (k, p) in seats.iter().enumerate() {
            let roster = rooms.join("r1", p.clone()).unwrap();
            assert_eq!(roster.len(), k + 1);
        }
        assert_eq!(rooms.roster("r1"), seats.as_slice());

        let err = rooms.join("r1", seat(99)).unwrap_err();
        assert_eq!(err.room_id, "r1");
        assert_eq!(rooms.roster("r1"), seats.as_slice());
    }

    #[test]
    fn leave_preserves_order() {
        let mut rooms = RoomDirectory::new();
        let (a, b, c) = (seat(0), seat(1), seat(2));
        for p in [&a, &b, &c] {
            rooms.join("r1", p.clone()).unwrap();
        }

        let roster = rooms.leave("r1", &b.connection_id);
        assert_eq!(roster, &[a.clone(), c.clone()]);
        assert!(rooms.roster("r1").iter().all(|p| p.connection_id != b.connection_id));
    }

    #[test]
    fn leave_unknown_is_noop() {
        let mut rooms = RoomDirectory::new();
        assert!(rooms.leave("nowhere", &ConnectionId::new()).is_empty());
        assert_eq!(rooms.room_count(), 0);

        let a = seat(0);
        rooms.join("r1", a.clone()).unwrap();
        assert_eq!(rooms.leave("r1", &ConnectionId::new()), &[a]);
    }

    #[test]
    fn empty_rooms_stay() {
        let mut rooms = RoomDirectory::new();
        let a = seat(0);
        rooms.join("r1", a.clone()).unwrap();
        rooms.leave("r1", &a.connection_id);

        assert_eq!(rooms.room_count(), 1);
        assert!(rooms.roster("r1").is_empty());

        // freed seat can be taken again
        assert_eq!(rooms.join("r1", seat(1)).unwrap().len(), 1);
    }
}
