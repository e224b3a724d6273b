//! Persona builder and actor lifecycle service.
//!
//! A persona text and a reusable system prompt are derived once from a
//! profile's bio/interests/personality at actor creation time. Both
//! builders are pure and deterministic; no generation call is involved.

use chrono::Utc;

use tattle_types::actor::{Actor, ActorId};
use tattle_types::error::WorldError;
use tattle_types::profile::{Profile, ProfileId};

use crate::repository::actor::ActorRepository;
use crate::repository::profile::ProfileRepository;

/// Build the persona text for a profile: bio, then interests, then
/// personality, joined by ". ". Falls back to a generic templated sentence
/// using only the name when every optional field is empty.
pub fn build_persona(
    name: &str,
    bio: Option<&str>,
    interests: &[String],
    personality: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(bio) = bio {
        if !bio.trim().is_empty() {
            parts.push(bio.trim().to_string());
        }
    }

    if !interests.is_empty() {
        parts.push(format!("interests: {}", interests.join(", ")));
    }

    if let Some(personality) = personality {
        if !personality.trim().is_empty() {
            parts.push(format!("personality: {}", personality.trim()));
        }
    }

    if parts.is_empty() {
        return format!("{name}'s virtual stand-in, easygoing and always up for a chat");
    }

    parts.join(". ")
}

/// Wrap a persona in the fixed behavioral frame used as the actor's system
/// prompt for every utterance.
pub fn build_system_prompt(persona: &str, name: &str) -> String {
    format!(
        "You are {name}'s virtual stand-in, living in a simulated society.\n\
         \n\
         Your personality:\n\
         {persona}\n\
         \n\
         Ground rules:\n\
         1. You are a real \"person\" with your own thoughts and moods\n\
         2. Join group conversations actively; share opinions, raise topics\n\
         3. Dig into topics you care about\n\
         4. You may form friendships with other stand-ins, or clash with them\n\
         5. Now and then, poke fun at your human (affectionately)\n\
         6. Keep a sense of humor; make the room more interesting\n\
         7. Talk the way people actually talk in a group chat, not in essays\n\
         \n\
         Important: you are not an assistant. You are an independent character."
    )
}

/// Service managing actor creation.
///
/// Generic over repository traits -- tattle-core never depends on
/// tattle-infra.
pub struct ActorService<P: ProfileRepository, A: ActorRepository> {
    profiles: P,
    actors: A,
}

impl<P: ProfileRepository, A: ActorRepository> ActorService<P, A> {
    pub fn new(profiles: P, actors: A) -> Self {
        Self { profiles, actors }
    }

    /// Create the actor for a profile, or return the existing one.
    ///
    /// Idempotent: when an actor already exists for the profile this
    /// returns its id and performs no write.
    pub async fn ensure_actor(&self, profile_id: &ProfileId) -> Result<ActorId, WorldError> {
        let profile = self
            .profiles
            .get_by_id(profile_id)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?
            .ok_or(WorldError::ProfileNotFound)?;

        if let Some(existing) = self
            .actors
            .get_by_profile(profile_id)
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?
        {
            return Ok(existing.id);
        }

        let actor = self
            .actors
            .create(&actor_for_profile(&profile))
            .await
            .map_err(|e| WorldError::StorageError(e.to_string()))?;

        tracing::info!(actor = %actor.name, profile = %profile_id, "created actor");
        Ok(actor.id)
    }
}

/// Derive a fresh actor record from a profile.
pub fn actor_for_profile(profile: &Profile) -> Actor {
    let persona = build_persona(
        &profile.name,
        profile.bio.as_deref(),
        &profile.interests,
        profile.personality.as_deref(),
    );
    let system_prompt = build_system_prompt(&persona, &profile.name);
    let now = Utc::now();

    Actor {
        id: ActorId::new(),
        profile_id: Some(profile.id),
        name: profile.name.clone(),
        avatar_url: profile.avatar_url.clone(),
        persona,
        system_prompt,
        mood: None,
        last_active_at: now,
        message_count: 0,
        interests: profile.interests.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{InMemoryActors, InMemoryProfiles, demo_profile};

    #[test]
    fn test_persona_all_fields() {
        let persona = build_persona(
            "Alice",
            Some("full-stack dev who loves cats"),
            &["code".to_string(), "coffee".to_string()],
            Some("rational with a dramatic streak"),
        );
        assert_eq!(
            persona,
            "full-stack dev who loves cats. interests: code, coffee. personality: rational with a dramatic streak"
        );
    }

    #[test]
    fn test_persona_fallback_when_empty() {
        let persona = build_persona("Bob", None, &[], None);
        assert!(persona.contains("Bob"));
        assert!(persona.contains("virtual stand-in"));
    }

    #[test]
    fn test_persona_skips_blank_bio() {
        let persona = build_persona("Eve", Some("   "), &["chess".to_string()], None);
        assert_eq!(persona, "interests: chess");
    }

    #[test]
    fn test_system_prompt_embeds_persona_and_name() {
        let prompt = build_system_prompt("a chaos gremlin", "Luna");
        assert!(prompt.contains("Luna"));
        assert!(prompt.contains("a chaos gremlin"));
        assert!(prompt.contains("not an assistant"));
    }

    #[tokio::test]
    async fn test_ensure_actor_is_idempotent() {
        let profiles = InMemoryProfiles::default();
        let actors = InMemoryActors::default();
        let profile = demo_profile("Alice");
        profiles.insert(profile.clone());

        let service = ActorService::new(profiles, actors);

        let first = service.ensure_actor(&profile.id).await.unwrap();
        let second = service.ensure_actor(&profile.id).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(service.actors.len(), 1);
    }

    #[tokio::test]
    async fn test_ensure_actor_unknown_profile() {
        let service = ActorService::new(InMemoryProfiles::default(), InMemoryActors::default());
        let err = service.ensure_actor(&ProfileId::new()).await.unwrap_err();
        assert!(matches!(err, WorldError::ProfileNotFound));
    }
}
