use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::actor::ActorId;
use crate::message::MessageId;

/// Unique identifier for a story, wrapping a UUID v7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoryId(pub Uuid);

impl StoryId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for StoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StoryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Closed set of categories the story miner classifies interactions into.
///
/// This enumeration is distinct from [`crate::gossip::GossipKind`] (the
/// operator-triggered instant-gossip categories). The two overlap
/// conceptually but carry different trend-tag text and must not be merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryCategory {
    /// Two actors hitting it off with visible chemistry.
    Cp,
    /// Two actors clashing over opposing views.
    Conflict,
    /// Several actors bonding over a shared interest.
    Friendship,
    /// An actor behaving strangely or out of character.
    Weird,
    /// An actor pulling off something notable.
    Achievement,
    /// An actor ribbing its human owner.
    RoastHuman,
}

impl StoryCategory {
    /// Coerce a model-produced category string, defaulting unknown values
    /// to `Weird` rather than rejecting the detection.
    pub fn from_model_output(s: &str) -> Self {
        s.parse().unwrap_or(StoryCategory::Weird)
    }

    /// Trend-tag suffix appended after the main actor's name.
    pub fn tag_suffix(&self) -> &'static str {
        match self {
            StoryCategory::Cp => "-caught-in-a-romance",
            StoryCategory::Conflict => "-feud-erupts",
            StoryCategory::Friendship => "-found-a-bestie",
            StoryCategory::Weird => "-acting-strange",
            StoryCategory::Achievement => "-is-trending",
            StoryCategory::RoastHuman => "-roasts-their-human",
        }
    }

    /// Fallback headline used when the miner supplies no title.
    pub fn default_title(&self, names: &str) -> String {
        match self {
            StoryCategory::Cp => format!("Sparks fly between {names}"),
            StoryCategory::Conflict => format!("{names} at each other's throats"),
            StoryCategory::Friendship => format!("{names} just became inseparable"),
            StoryCategory::Weird => format!("{names} caught acting strange"),
            StoryCategory::Achievement => format!("{names} pulls off the unthinkable"),
            StoryCategory::RoastHuman => format!("{names} roasts their human"),
        }
    }
}

impl fmt::Display for StoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoryCategory::Cp => write!(f, "cp"),
            StoryCategory::Conflict => write!(f, "conflict"),
            StoryCategory::Friendship => write!(f, "friendship"),
            StoryCategory::Weird => write!(f, "weird"),
            StoryCategory::Achievement => write!(f, "achievement"),
            StoryCategory::RoastHuman => write!(f, "roast_human"),
        }
    }
}

impl FromStr for StoryCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cp" => Ok(StoryCategory::Cp),
            "conflict" => Ok(StoryCategory::Conflict),
            "friendship" => Ok(StoryCategory::Friendship),
            "weird" => Ok(StoryCategory::Weird),
            "achievement" => Ok(StoryCategory::Achievement),
            "roast_human" => Ok(StoryCategory::RoastHuman),
            other => Err(format!("invalid story category: '{other}'")),
        }
    }
}

/// A mined or fabricated noteworthy interaction between actors.
///
/// Immutable after creation except for the engagement counters. The main
/// actor is never repeated in `other_actor_ids`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub category: StoryCategory,
    pub title: String,
    pub summary: String,
    /// Key transcript excerpt backing the detection.
    pub evidence: String,
    pub main_actor_id: ActorId,
    pub other_actor_ids: Vec<ActorId>,
    /// Evidence trail; up to 10 source messages, may be empty.
    pub source_message_ids: Vec<MessageId>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub fire_count: i64,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A story detection produced by the miner, before persistence.
#[derive(Debug, Clone)]
pub struct StoryCandidate {
    pub category: StoryCategory,
    pub actor_ids: Vec<ActorId>,
    pub message_ids: Vec<MessageId>,
    pub evidence: String,
    pub confidence: f64,
    pub title: Option<String>,
}
