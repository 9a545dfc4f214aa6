//! Wire events. Every frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ChatMessage, Participant, RoomId};

/// Everything a client may send us.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinRoom { room_id: RoomId, peer_id: String },
    /// Carries no payload; `data` may be absent, `null` or an object.
    LeaveRoom,
    SendMessage { author: String, text: String },
}

impl ClientEvent {
    pub fn from_frame(frame: &[u8]) -> serde_json::Result<Self> {
        let mut value: Value = serde_json::from_slice(frame)?;

        // clients that always send an object must still be able to leave
        if let Some(fields) = value.as_object_mut() {
            let leaving = fields.get("event").and_then(Value::as_str) == Some("leave-room");
            if leaving && fields.get("data").is_some_and(Value::is_object) {
                fields.remove("data");
            }
        }

        serde_json::from_value(value)
    }
}

/// Everything we push to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    RoomFull,
    AllUsers(Vec<Participant>),
    InitialMessages(Vec<ChatMessage>),
    NewMessage(ChatMessage),
}

impl ServerEvent {
    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
