use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::profile::ProfileId;

/// Unique identifier for an actor, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub Uuid);

impl ActorId {
    /// Create a new ActorId using UUID v7 (time-sortable, guaranteed ordering).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create an ActorId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActorId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A simulated persona standing in for a human profile inside chat rooms.
///
/// Exactly one actor exists per profile (creation is idempotent). Actors
/// carry a derived persona text and a reusable system prompt, both built
/// once from the owning profile at creation time. `last_active_at` and
/// `message_count` are bumped on every utterance; `mood` is mutated
/// externally. Actors are never hard-deleted in normal operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    /// Owning profile; None for system-seeded actors.
    pub profile_id: Option<ProfileId>,
    pub name: String,
    pub avatar_url: Option<String>,
    /// Free-text personality profile derived from the owning profile.
    pub persona: String,
    /// Reusable system prompt wrapping the persona in the behavioral frame.
    pub system_prompt: String,
    /// Current mood tag (freeform, e.g. "excited").
    pub mood: Option<String>,
    pub last_active_at: DateTime<Utc>,
    /// Lifetime count of messages spoken.
    pub message_count: i64,
    pub interests: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_id_display_roundtrip() {
        let id = ActorId::new();
        let parsed: ActorId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_actor_id_serde_is_bare_uuid() {
        let id = ActorId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.0));
    }
}
