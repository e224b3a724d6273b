//! Story miner.
//!
//! Reads a room's recent history, asks the model gateway to classify
//! interesting multi-actor interactions into typed story candidates, and
//! recovers structure from the (unreliable) response with a two-attempt
//! parse. The miner keeps everything at confidence 0.6 and above; the
//! publishing flow applies its own stricter bar on top. Mining never
//! raises on model misbehavior: malformed output, unknown actor names,
//! and gateway failures all degrade to fewer (or zero) candidates.

use serde::Deserialize;

use tattle_types::error::WorldError;
use tattle_types::gateway::GenerateOptions;
use tattle_types::message::SpokenMessage;
use tattle_types::room::RoomId;
use tattle_types::story::{StoryCandidate, StoryCategory};

use crate::gateway::{CredentialSource, ModelGateway};
use crate::modeljson::{self, ParseOutcome};
use crate::repository::actor::ActorRepository;
use crate::repository::message::MessageRepository;

/// How many recent messages a mining pass reads.
pub const MINE_WINDOW: i64 = 100;

/// Below this many stored messages there is not enough signal to mine.
pub const MIN_SIGNAL_MESSAGES: usize = 5;

/// The miner's own confidence cutoff. The publishing flow applies a
/// stricter bar on top ([`crate::publisher::PUBLISH_CONFIDENCE`]).
pub const MINER_CONFIDENCE_FLOOR: f64 = 0.6;

/// Confidence assumed when the model omits one.
pub const DEFAULT_CONFIDENCE: f64 = 0.7;

/// Evidence-trail cap per candidate.
const EVIDENCE_MESSAGES: usize = 10;

/// Raw detection list as the model is asked to produce it.
#[derive(Debug, Deserialize)]
struct RawDetections {
    #[serde(default)]
    stories: Vec<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    #[serde(rename = "type", default)]
    category: Option<String>,
    #[serde(default)]
    actors: Vec<String>,
    #[serde(default)]
    evidence: Option<String>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    title: Option<String>,
}

/// Mines story candidates out of a room's message history.
pub struct StoryMiner<A, M, C, G>
where
    A: ActorRepository,
    M: MessageRepository,
    C: CredentialSource,
    G: ModelGateway,
{
    actors: A,
    messages: M,
    credentials: C,
    gateway: G,
}

impl<A, M, C, G> StoryMiner<A, M, C, G>
where
    A: ActorRepository,
    M: MessageRepository,
    C: CredentialSource,
    G: ModelGateway,
{
    pub fn new(actors: A, messages: M, credentials: C, gateway: G) -> Self {
        Self {
            actors,
            messages,
            credentials,
            gateway,
        }
    }

    /// Analyze a room's recent transcript and return candidates at or
    /// above the miner's confidence floor.
    pub async fn mine(&self, room_id: &RoomId) -> Result<Vec<StoryCandidate>, WorldError> {
        let recent = self
            .messages
            .recent_in_room(room_id, MINE_WINDOW)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?;

        // Not enough signal; bail before any credential lookup.
        if recent.len() < MIN_SIGNAL_MESSAGES {
            return Ok(Vec::new());
        }

        // Mining does not need any particular actor's voice.
        let Some(credential) = self.credentials.any_valid().await else {
            tracing::warn!("no valid credential available for story mining");
            return Ok(Vec::new());
        };

        let transcript = recent
            .iter()
            .map(|m| m.transcript_line())
            .collect::<Vec<_>>()
            .join("\n");

        let generation = match self
            .gateway
            .generate(
                &credential,
                &build_mining_prompt(&transcript),
                &GenerateOptions::default(),
            )
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                tracing::error!(error = %e, room = %room_id, "story mining call failed");
                return Ok(Vec::new());
            }
        };

        let raw = match modeljson::recover::<RawDetections>(&generation.text) {
            ParseOutcome::Parsed(raw) => raw,
            ParseOutcome::Malformed => return Ok(Vec::new()),
        };

        let mut candidates = Vec::new();
        for detection in raw.stories {
            if let Some(candidate) = self.resolve(detection, &recent).await? {
                candidates.push(candidate);
            }
        }

        candidates.retain(|c| c.confidence >= MINER_CONFIDENCE_FLOOR);
        Ok(candidates)
    }

    /// Resolve one raw detection against known actors. A detection whose
    /// names match nobody is dropped silently.
    async fn resolve(
        &self,
        detection: RawDetection,
        recent: &[SpokenMessage],
    ) -> Result<Option<StoryCandidate>, WorldError> {
        let resolved = self
            .actors
            .get_by_names(&detection.actors)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?;

        if resolved.is_empty() {
            tracing::debug!(actors = ?detection.actors, "detection names resolved to no actors");
            return Ok(None);
        }

        let actor_ids: Vec<_> = resolved.iter().map(|a| a.id).collect();

        // Evidence trail: the first chronologically-matching messages
        // authored by any involved actor.
        let message_ids: Vec<_> = recent
            .iter()
            .filter(|m| actor_ids.contains(&m.message.actor_id))
            .take(EVIDENCE_MESSAGES)
            .map(|m| m.message.id)
            .collect();

        Ok(Some(StoryCandidate {
            category: StoryCategory::from_model_output(
                detection.category.as_deref().unwrap_or_default(),
            ),
            actor_ids,
            message_ids,
            evidence: detection.evidence.unwrap_or_default(),
            confidence: detection.confidence.unwrap_or(DEFAULT_CONFIDENCE),
            title: detection.title,
        }))
    }
}

fn build_mining_prompt(transcript: &str) -> String {
    format!(
        "Analyze the following group chat between virtual stand-ins and \
         identify noteworthy story events:\n\
         \n\
         {transcript}\n\
         \n\
         Look for these story types (only where actually present):\n\
         1. cp - two stand-ins hitting it off with visible chemistry\n\
         2. conflict - two stand-ins clashing over opposing views\n\
         3. friendship - several stand-ins bonding over a shared interest\n\
         4. weird - a stand-in behaving strangely or out of character\n\
         5. achievement - a stand-in pulling off something notable\n\
         6. roast_human - a stand-in ribbing its human owner\n\
         \n\
         Return strict JSON -- no Markdown code fences, no newlines, special \
         characters inside strings escaped:\n\
         {{\"stories\": [{{\"type\": \"cp\", \"actors\": [\"Name1\", \"Name2\"], \
         \"evidence\": \"key quotes\", \"confidence\": 0.8, \"title\": \"headline\"}}]}}\n\
         \n\
         If nothing stands out, return {{\"stories\": []}}\n\
         Return a single-line JSON string only."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        demo_actor, demo_credential, FakeCredentials, FakeGateway, InMemoryActors,
        InMemoryMessages,
    };
    use chrono::Utc;
    use tattle_types::actor::Actor;
    use tattle_types::message::{ChatMessage, MessageId};

    fn seed_messages(messages: &InMemoryMessages, room_id: RoomId, actor: &Actor, n: usize) {
        for i in 0..n {
            messages.insert_spoken(
                ChatMessage {
                    id: MessageId::new(),
                    room_id,
                    actor_id: actor.id,
                    content: format!("line {i}"),
                    emotion: None,
                    created_at: Utc::now(),
                },
                &actor.name,
            );
        }
    }

    fn miner(
        actors: InMemoryActors,
        messages: InMemoryMessages,
        credentials: FakeCredentials,
        gateway: FakeGateway,
    ) -> StoryMiner<InMemoryActors, InMemoryMessages, FakeCredentials, FakeGateway> {
        StoryMiner::new(actors, messages, credentials, gateway)
    }

    #[tokio::test]
    async fn test_too_few_messages_skips_credential_lookup() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 4);

        let credentials = FakeCredentials::with_fallback(demo_credential());
        let m = miner(actors, messages, credentials.clone(), FakeGateway::default());

        let candidates = m.mine(&room_id).await.unwrap();
        assert!(candidates.is_empty());
        assert_eq!(credentials.lookups(), 0);
    }

    #[tokio::test]
    async fn test_no_credential_yields_empty() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 6);

        let gateway = FakeGateway::default();
        let m = miner(actors, messages, FakeCredentials::default(), gateway.clone());

        let candidates = m.mine(&room_id).await.unwrap();
        assert!(candidates.is_empty());
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_confidence_floor_filters_candidates() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        let bob = demo_actor("Bob");
        actors.insert(alice.clone());
        actors.insert(bob.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 3);
        seed_messages(&messages, room_id, &bob, 3);

        let reply = r#"{"stories":[
            {"type":"cp","actors":["Alice","Bob"],"evidence":"a","confidence":0.5},
            {"type":"conflict","actors":["Alice","Bob"],"evidence":"b","confidence":0.65},
            {"type":"friendship","actors":["Alice","Bob"],"evidence":"c","confidence":0.9}
        ]}"#
        .replace('\n', "");

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Ok(reply)]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.confidence >= 0.6));
    }

    #[tokio::test]
    async fn test_unknown_actor_names_drop_the_detection() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 6);

        let reply =
            r#"{"stories":[{"type":"cp","actors":["Ghost","Phantom"],"evidence":"x","confidence":0.9}]}"#;

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Ok(reply.to_string())]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_defaults_applied_for_missing_fields() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 6);

        // No confidence, unknown type string.
        let reply = r#"{"stories":[{"type":"scandal","actors":["Alice"],"evidence":"hm"}]}"#;

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Ok(reply.to_string())]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].confidence, DEFAULT_CONFIDENCE);
        assert_eq!(candidates[0].category, StoryCategory::Weird);
    }

    #[tokio::test]
    async fn test_evidence_trail_capped_and_scoped() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        let bob = demo_actor("Bob");
        actors.insert(alice.clone());
        actors.insert(bob.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 15);
        seed_messages(&messages, room_id, &bob, 15);

        let reply = r#"{"stories":[{"type":"weird","actors":["Alice"],"evidence":"x","confidence":0.8}]}"#;

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Ok(reply.to_string())]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].message_ids.len(), 10);
        assert_eq!(candidates[0].actor_ids, vec![alice.id]);
    }

    #[tokio::test]
    async fn test_malformed_reply_yields_empty() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 6);

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Ok("I could not find anything structured.".to_string())]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_yields_empty() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 6);

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Err("503".to_string())]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert!(candidates.is_empty());
    }

    #[tokio::test]
    async fn test_prose_wrapped_reply_still_mines() {
        let actors = InMemoryActors::default();
        let alice = demo_actor("Alice");
        actors.insert(alice.clone());

        let messages = InMemoryMessages::default();
        let room_id = RoomId::new();
        seed_messages(&messages, room_id, &alice, 6);

        let reply = format!(
            "Here is what I found:\n{}\nLet me know if you need more.",
            r#"{"stories":[{"type":"weird","actors":["Alice"],"evidence":"x","confidence":0.8}]}"#
        );

        let m = miner(
            actors,
            messages,
            FakeCredentials::with_fallback(demo_credential()),
            FakeGateway::with_replies([Ok(reply)]),
        );

        let candidates = m.mine(&room_id).await.unwrap();
        assert_eq!(candidates.len(), 1);
    }
}
