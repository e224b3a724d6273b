use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::actor::ActorId;
use crate::room::RoomId;

/// Unique identifier for a chat message, wrapping a UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// One utterance in a room. Immutable once created; append-only; ordered by
/// creation time within a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub room_id: RoomId,
    pub actor_id: ActorId,
    pub content: String,
    pub emotion: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A message joined with its speaking actor's display name, as loaded for
/// transcript rendering and API reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpokenMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub actor_name: String,
}

impl SpokenMessage {
    /// Render as a transcript line: `[name]: text`.
    pub fn transcript_line(&self) -> String {
        format!("[{}]: {}", self.actor_name, self.message.content)
    }
}
