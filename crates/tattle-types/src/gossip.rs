use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::story::{StoryCategory, StoryId};

/// Unique identifier for a gossip article, wrapping a UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GossipId(pub Uuid);

impl GossipId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for GossipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GossipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GossipId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Categories for the operator-triggered instant-gossip path.
///
/// Deliberately NOT unified with [`StoryCategory`]: the two sets overlap
/// conceptually (roast vs roast_human) but drive different trend-tag text
/// and prompt templates. Each kind maps onto a storage category only at
/// the persistence seam via [`GossipKind::storage_category`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GossipKind {
    Roast,
    Ship,
    Hype,
}

impl GossipKind {
    /// The story category used when persisting the minimal join-target
    /// Story for an instant article.
    pub fn storage_category(&self) -> StoryCategory {
        match self {
            GossipKind::Roast => StoryCategory::RoastHuman,
            GossipKind::Ship => StoryCategory::Cp,
            GossipKind::Hype => StoryCategory::Achievement,
        }
    }

    /// Trend-tag suffix appended after the target actor's name.
    pub fn tag_suffix(&self) -> &'static str {
        match self {
            GossipKind::Roast => "-got-roasted",
            GossipKind::Ship => "-caught-in-a-romance",
            GossipKind::Hype => "-is-trending",
        }
    }
}

impl fmt::Display for GossipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GossipKind::Roast => write!(f, "roast"),
            GossipKind::Ship => write!(f, "ship"),
            GossipKind::Hype => write!(f, "hype"),
        }
    }
}

impl FromStr for GossipKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "roast" => Ok(GossipKind::Roast),
            "ship" => Ok(GossipKind::Ship),
            "hype" => Ok(GossipKind::Hype),
            other => Err(format!("invalid gossip kind: '{other}'")),
        }
    }
}

/// The published tabloid rendering of a Story. Exactly one per story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GossipArticle {
    pub id: GossipId,
    pub story_id: StoryId,
    pub title: String,
    pub body: String,
    /// Mirrors the owning story's category.
    pub category: StoryCategory,
    /// Simulated multi-viewpoint debate transcript, when synthesized.
    pub debate_transcript: Option<String>,
    pub fire_count: i64,
    pub view_count: i64,
    pub removed: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gossip_kind_roundtrip() {
        for kind in [GossipKind::Roast, GossipKind::Ship, GossipKind::Hype] {
            let parsed: GossipKind = kind.to_string().parse().unwrap();
            assert_eq!(kind, parsed);
        }
    }

    #[test]
    fn test_storage_category_mapping() {
        assert_eq!(
            GossipKind::Roast.storage_category(),
            StoryCategory::RoastHuman
        );
        assert_eq!(GossipKind::Ship.storage_category(), StoryCategory::Cp);
        assert_eq!(
            GossipKind::Hype.storage_category(),
            StoryCategory::Achievement
        );
    }

    #[test]
    fn test_kind_and_category_suffixes_stay_distinct() {
        // roast (instant) and roast_human (mined) must not share tag text.
        assert_ne!(
            GossipKind::Roast.tag_suffix(),
            StoryCategory::RoastHuman.tag_suffix()
        );
    }
}
