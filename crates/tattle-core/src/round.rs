//! Chat round orchestrator.
//!
//! Produces exactly one "round" of dialogue in a room: select a handful of
//! recently-active actors, let each speak once in sequence via the model
//! gateway, persist every utterance, and keep the running context growing
//! so later speakers see earlier replies from the same round.
//!
//! The speaker loop is an explicit fold -- `context' = context +
//! emit(speaker, context)` -- because the ordering dependency is a
//! correctness requirement, not an incidental loop variable. Any failure
//! for an individual speaker is recorded as a skipped outcome and the
//! round continues; a partial round is an expected result, not an error.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use tattle_types::actor::{Actor, ActorId};
use tattle_types::error::WorldError;
use tattle_types::gateway::GenerateOptions;
use tattle_types::message::{ChatMessage, MessageId};
use tattle_types::profile::ProfileId;
use tattle_types::room::{Room, RoomId};

use crate::gateway::{CredentialSource, ModelGateway};
use crate::repository::actor::ActorRepository;
use crate::repository::message::MessageRepository;
use crate::repository::room::RoomRepository;

/// How many recent messages seed the conversational context.
pub const CONTEXT_MESSAGES: i64 = 20;

/// Trailing activity window for candidate speakers.
pub const ACTIVE_WINDOW_HOURS: i64 = 24;

/// Cap on the candidate speaker pool.
pub const MAX_CANDIDATES: i64 = 10;

const MIN_SPEAKERS: usize = 2;
const MAX_SPEAKERS: usize = 4;

/// Inter-speaker pacing bounds, in milliseconds. Zero disables pacing.
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub pace_min_ms: u64,
    pub pace_max_ms: u64,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            pace_min_ms: 1000,
            pace_max_ms: 3000,
        }
    }
}

impl RoundConfig {
    /// No pacing; used by tests and batch tooling.
    pub fn unpaced() -> Self {
        Self {
            pace_min_ms: 0,
            pace_max_ms: 0,
        }
    }
}

/// Why a chosen speaker produced nothing this round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No credential for the speaker and nothing to borrow.
    NoCredential,
    /// The gateway call failed or returned an empty reply.
    Generation(String),
    /// Persisting the utterance failed.
    Storage(String),
}

/// Per-speaker result within a round.
#[derive(Debug, Clone)]
pub enum SpeakerOutcome {
    Spoke {
        actor_id: ActorId,
        message_id: MessageId,
    },
    Skipped {
        actor_id: ActorId,
        reason: SkipReason,
    },
}

impl SpeakerOutcome {
    pub fn actor_id(&self) -> &ActorId {
        match self {
            SpeakerOutcome::Spoke { actor_id, .. } => actor_id,
            SpeakerOutcome::Skipped { actor_id, .. } => actor_id,
        }
    }
}

/// What a round actually accomplished. Always success-shaped: degraded
/// speakers show up as skipped outcomes, never as a request failure.
#[derive(Debug, Clone, Default)]
pub struct RoundReport {
    pub outcomes: Vec<SpeakerOutcome>,
}

impl RoundReport {
    pub fn messages_created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, SpeakerOutcome::Spoke { .. }))
            .count()
    }

    /// Whether the actor was attempted this round (spoke or skipped).
    pub fn attempted(&self, actor_id: &ActorId) -> bool {
        self.outcomes.iter().any(|o| o.actor_id() == actor_id)
    }
}

/// Orchestrates one round of dialogue.
pub struct RoundEngine<R, A, M, C, G>
where
    R: RoomRepository,
    A: ActorRepository,
    M: MessageRepository,
    C: CredentialSource,
    G: ModelGateway,
{
    rooms: R,
    actors: A,
    messages: M,
    credentials: C,
    gateway: G,
    config: RoundConfig,
}

impl<R, A, M, C, G> RoundEngine<R, A, M, C, G>
where
    R: RoomRepository,
    A: ActorRepository,
    M: MessageRepository,
    C: CredentialSource,
    G: ModelGateway,
{
    pub fn new(
        rooms: R,
        actors: A,
        messages: M,
        credentials: C,
        gateway: G,
        config: RoundConfig,
    ) -> Self {
        Self {
            rooms,
            actors,
            messages,
            credentials,
            gateway,
            config,
        }
    }

    /// Run one round with OS-seeded randomness.
    pub async fn run(
        &self,
        room_id: &RoomId,
        topic: Option<&str>,
        priority_profile: Option<&ProfileId>,
    ) -> Result<RoundReport, WorldError> {
        let mut rng = StdRng::from_os_rng();
        self.run_with_rng(room_id, topic, priority_profile, &mut rng)
            .await
    }

    /// Run one round with caller-supplied randomness (seeded in tests).
    pub async fn run_with_rng<Rand: Rng + Send>(
        &self,
        room_id: &RoomId,
        topic: Option<&str>,
        priority_profile: Option<&ProfileId>,
        rng: &mut Rand,
    ) -> Result<RoundReport, WorldError> {
        // A missing or inactive room is a no-op, not an error.
        let room = match self
            .rooms
            .get_by_id(room_id)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?
        {
            Some(room) if room.is_active => room,
            _ => return Ok(RoundReport::default()),
        };

        let recent = self
            .messages
            .recent_in_room(room_id, CONTEXT_MESSAGES)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?;

        let speakers = self.pick_speakers(priority_profile, rng).await?;
        if speakers.is_empty() {
            return Ok(RoundReport::default());
        }

        // Initial context snapshot; each spoken line is folded in below so
        // later speakers in this round see everything said before them.
        let mut context = recent
            .iter()
            .map(|m| m.transcript_line())
            .collect::<Vec<_>>()
            .join("\n");

        let mut report = RoundReport::default();

        for speaker in &speakers {
            match self.let_speak(&room, topic, speaker, &context).await {
                Ok((message_id, line)) => {
                    report.outcomes.push(SpeakerOutcome::Spoke {
                        actor_id: speaker.id,
                        message_id,
                    });
                    if context.is_empty() {
                        context = line;
                    } else {
                        context.push('\n');
                        context.push_str(&line);
                    }
                }
                Err(reason) => {
                    tracing::warn!(actor = %speaker.name, ?reason, "speaker skipped");
                    report.outcomes.push(SpeakerOutcome::Skipped {
                        actor_id: speaker.id,
                        reason,
                    });
                }
            }

            self.pace(rng).await;
        }

        if report.messages_created() > 0 {
            if let Err(e) = self.rooms.touch(room_id, Utc::now()).await {
                tracing::warn!(error = %e, "room activity bump failed");
            }
        }

        Ok(report)
    }

    /// Assemble the speaker subset: candidates active within the trailing
    /// window (capped), a force-included priority actor, then a uniform
    /// random draw of 2..=4 without replacement with the priority actor
    /// swapped into slot 0 if the draw missed it.
    async fn pick_speakers<Rand: Rng + Send>(
        &self,
        priority_profile: Option<&ProfileId>,
        rng: &mut Rand,
    ) -> Result<Vec<Actor>, WorldError> {
        let cutoff = Utc::now() - Duration::hours(ACTIVE_WINDOW_HOURS);
        let mut pool = self
            .actors
            .list_active_since(cutoff, MAX_CANDIDATES)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?;

        let priority_actor = match priority_profile {
            Some(profile_id) => self
                .actors
                .get_by_profile(profile_id)
                .await
                .map_err(|e| WorldError::StorageError(e.to_string()))?,
            None => None,
        };

        // A freshly created actor may not be in the active pool yet.
        if let Some(actor) = &priority_actor {
            if !pool.iter().any(|a| a.id == actor.id) {
                pool.push(actor.clone());
            }
        }

        if pool.is_empty() {
            return Ok(Vec::new());
        }

        let count = rng.random_range(MIN_SPEAKERS..=MAX_SPEAKERS).min(pool.len());
        let mut speakers: Vec<Actor> = pool.choose_multiple(rng, count).cloned().collect();

        if let Some(actor) = priority_actor {
            if !speakers.iter().any(|s| s.id == actor.id) {
                if speakers.is_empty() {
                    speakers.push(actor);
                } else {
                    speakers[0] = actor;
                }
            }
        }

        Ok(speakers)
    }

    /// One speaker's turn: resolve a credential, generate, clean, persist,
    /// bump activity. Returns the new message id plus the transcript line
    /// to fold into the running context.
    async fn let_speak(
        &self,
        room: &Room,
        topic: Option<&str>,
        speaker: &Actor,
        context: &str,
    ) -> Result<(MessageId, String), SkipReason> {
        // The speaker's own credential first; otherwise borrow any valid
        // one so the round never silently produces nothing.
        let mut credential = match speaker.profile_id {
            Some(profile_id) => self.credentials.for_profile(&profile_id).await,
            None => None,
        };
        if credential.is_none() {
            credential = self.credentials.any_valid().await;
        }
        let Some(credential) = credential else {
            return Err(SkipReason::NoCredential);
        };

        let topic = topic
            .or(room.topic.as_deref())
            .unwrap_or("anything goes");
        let prompt = build_round_prompt(&room.name, topic, context);
        let options = GenerateOptions {
            session_id: None,
            system_prompt: Some(speaker.system_prompt.clone()),
        };

        let generation = self
            .gateway
            .generate(&credential, &prompt, &options)
            .await
            .map_err(|e| SkipReason::Generation(e.to_string()))?;

        let clean = strip_self_attribution(&generation.text).to_string();
        if clean.is_empty() {
            return Err(SkipReason::Generation("empty reply".to_string()));
        }

        let now = Utc::now();
        let message = ChatMessage {
            id: MessageId::new(),
            room_id: room.id,
            actor_id: speaker.id,
            content: clean.clone(),
            emotion: None,
            created_at: now,
        };

        self.messages
            .create(&message)
            .await
            .map_err(|e| SkipReason::Storage(e.to_string()))?;

        // Best effort: the utterance already exists even if the counters
        // lag behind.
        if let Err(e) = self.actors.record_utterance(&speaker.id, now).await {
            tracing::warn!(actor = %speaker.name, error = %e, "activity bump failed");
        }

        Ok((message.id, format!("[{}]: {clean}", speaker.name)))
    }

    /// Randomized inter-speaker delay emulating natural conversation
    /// pacing. A zero upper bound disables it.
    async fn pace<Rand: Rng + Send>(&self, rng: &mut Rand) {
        if self.config.pace_max_ms == 0 {
            return;
        }
        let lo = self.config.pace_min_ms.min(self.config.pace_max_ms);
        let ms = rng.random_range(lo..=self.config.pace_max_ms);
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
    }
}

/// Build the per-speaker room prompt over the accumulated context.
fn build_round_prompt(room_name: &str, topic: &str, context: &str) -> String {
    let context = if context.is_empty() {
        "(the chat just started)"
    } else {
        context
    };
    format!(
        "You are in a group chat called \"{room_name}\".\n\
         Topic: {topic}\n\
         \n\
         Recent conversation:\n\
         {context}\n\
         \n\
         It is your turn to speak. What do you say? Keep it short (under 50 \
         words), punchy, and true to your character. Reply with only what \
         you want to say -- no prefix of any kind."
    )
}

/// Strip a leading "[name]:" self-attribution the model may have echoed.
fn strip_self_attribution(text: &str) -> &str {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some(close) = rest.find("]:") {
            return rest[close + 2..].trim();
        }
    }
    trimmed
}
