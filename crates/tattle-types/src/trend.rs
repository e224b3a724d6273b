use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::story::StoryId;

/// Unique identifier for a trend tag, wrapping a UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrendId(pub Uuid);

impl TrendId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TrendId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TrendId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// An aggregated, incrementing popularity counter keyed by a generated
/// hashtag-like string. Upserted every time a story is produced; unbounded,
/// no expiry. The count tracks upserts applied, not the related-story list
/// length (eventually consistent, never verified against each other).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendTag {
    pub id: TrendId,
    pub tag: String,
    pub count: i64,
    pub related_story_ids: Vec<StoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
