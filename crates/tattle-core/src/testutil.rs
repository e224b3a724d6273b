//! In-memory fakes for the repository, gateway, and credential traits.
//!
//! Test-only. Kept simple on purpose: `Arc<Mutex<Vec<..>>>` stores, no
//! indexing, scripted gateway replies consumed in order.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use tattle_types::actor::{Actor, ActorId};
use tattle_types::credential::Credential;
use tattle_types::error::RepositoryError;
use tattle_types::gateway::{GatewayError, GenerateOptions, Generation};
use tattle_types::gossip::{GossipArticle, GossipId};
use tattle_types::message::{ChatMessage, MessageId, SpokenMessage};
use tattle_types::profile::{Profile, ProfileId};
use tattle_types::room::{Room, RoomId};
use tattle_types::story::{Story, StoryId};
use tattle_types::trend::TrendTag;

use crate::gateway::{CredentialSource, ModelGateway};
use crate::repository::actor::ActorRepository;
use crate::repository::gossip::{GossipPage, GossipRepository};
use crate::repository::message::MessageRepository;
use crate::repository::profile::ProfileRepository;
use crate::repository::room::RoomRepository;
use crate::repository::story::{StoryFilter, StoryRepository};
use crate::repository::trend::TrendRepository;

pub fn demo_profile(name: &str) -> Profile {
    let now = Utc::now();
    Profile {
        id: ProfileId::new(),
        external_id: None,
        name: name.to_string(),
        email: None,
        avatar_url: None,
        bio: Some(format!("{name}'s bio")),
        interests: vec!["gossip".to_string()],
        personality: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn demo_actor(name: &str) -> Actor {
    let now = Utc::now();
    Actor {
        id: ActorId::new(),
        profile_id: None,
        name: name.to_string(),
        avatar_url: None,
        persona: format!("{name}'s persona"),
        system_prompt: format!("you are {name}"),
        mood: None,
        last_active_at: now,
        message_count: 0,
        interests: Vec::new(),
        created_at: now,
        updated_at: now,
    }
}

pub fn demo_room(name: &str) -> Room {
    let now = Utc::now();
    Room {
        id: RoomId::new(),
        name: name.to_string(),
        topic: Some("small talk".to_string()),
        description: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn demo_credential() -> Credential {
    Credential {
        access_token: SecretString::from("fake-token"),
        refresh_token: None,
        expires_at: Some(Utc::now() + chrono::Duration::hours(1)),
    }
}

// ---------------------------------------------------------------------------
// Repositories

#[derive(Default, Clone)]
pub struct InMemoryProfiles {
    rows: Arc<Mutex<Vec<Profile>>>,
    credentials: Arc<Mutex<Vec<(ProfileId, Credential)>>>,
}

impl InMemoryProfiles {
    pub fn insert(&self, profile: Profile) {
        self.rows.lock().unwrap().push(profile);
    }

    fn set_credential(&self, id: ProfileId, credential: Credential) {
        self.credentials.lock().unwrap().push((id, credential));
    }
}

impl ProfileRepository for InMemoryProfiles {
    async fn create(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        self.insert(profile.clone());
        Ok(profile.clone())
    }

    async fn get_by_id(&self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == *id).cloned())
    }

    async fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn update(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or(RepositoryError::NotFound)?;
        *row = profile.clone();
        Ok(profile.clone())
    }

    async fn get_credential(
        &self,
        id: &ProfileId,
    ) -> Result<Option<Credential>, RepositoryError> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(pid, _)| pid == id)
            .map(|(_, c)| c.clone()))
    }

    async fn save_credential(
        &self,
        id: &ProfileId,
        credential: &Credential,
    ) -> Result<(), RepositoryError> {
        self.set_credential(*id, credential.clone());
        Ok(())
    }

    async fn latest_with_credential(
        &self,
    ) -> Result<Option<(ProfileId, Credential)>, RepositoryError> {
        Ok(self.credentials.lock().unwrap().last().cloned())
    }

    async fn latest_with_valid_credential(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Option<(ProfileId, Credential)>, RepositoryError> {
        Ok(self
            .credentials
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(_, c)| c.is_valid_at(now))
            .cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryActors {
    rows: Arc<Mutex<Vec<Actor>>>,
}

impl InMemoryActors {
    pub fn insert(&self, actor: Actor) {
        self.rows.lock().unwrap().push(actor);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn get(&self, id: &ActorId) -> Option<Actor> {
        self.rows.lock().unwrap().iter().find(|a| a.id == *id).cloned()
    }
}

impl ActorRepository for InMemoryActors {
    async fn create(&self, actor: &Actor) -> Result<Actor, RepositoryError> {
        self.insert(actor.clone());
        Ok(actor.clone())
    }

    async fn get_by_id(&self, id: &ActorId) -> Result<Option<Actor>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn get_by_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<Actor>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.profile_id == Some(*profile_id))
            .cloned())
    }

    async fn get_by_ids(&self, ids: &[ActorId]) -> Result<Vec<Actor>, RepositoryError> {
        Ok(ids.iter().filter_map(|id| self.get(id)).collect())
    }

    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Actor>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| names.contains(&a.name))
            .cloned()
            .collect())
    }

    async fn list_active_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Actor>, RepositoryError> {
        let mut active: Vec<Actor> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.last_active_at >= cutoff)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        active.truncate(limit as usize);
        Ok(active)
    }

    async fn most_recent_active_excluding(
        &self,
        exclude: &ActorId,
    ) -> Result<Option<Actor>, RepositoryError> {
        let mut others: Vec<Actor> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.id != *exclude)
            .cloned()
            .collect();
        others.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(others.into_iter().next())
    }

    async fn record_utterance(
        &self,
        id: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let actor = rows
            .iter_mut()
            .find(|a| a.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        actor.last_active_at = at;
        actor.message_count += 1;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRooms {
    rows: Arc<Mutex<Vec<Room>>>,
}

impl InMemoryRooms {
    pub fn insert(&self, room: Room) {
        self.rows.lock().unwrap().push(room);
    }
}

impl RoomRepository for InMemoryRooms {
    async fn create(&self, room: &Room) -> Result<Room, RepositoryError> {
        self.insert(room.clone());
        Ok(room.clone())
    }

    async fn get_by_id(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|r| r.id == *id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Room>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Room>, RepositoryError> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn touch(&self, id: &RoomId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(room) = rows.iter_mut().find(|r| r.id == *id) {
            room.updated_at = at;
        }
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMessages {
    rows: Arc<Mutex<Vec<SpokenMessage>>>,
}

impl InMemoryMessages {
    /// Insert a message with an explicit speaker name (fakes have no join).
    pub fn insert_spoken(&self, message: ChatMessage, actor_name: &str) {
        self.rows.lock().unwrap().push(SpokenMessage {
            message,
            actor_name: actor_name.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<SpokenMessage> {
        self.rows.lock().unwrap().clone()
    }
}

impl MessageRepository for InMemoryMessages {
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, RepositoryError> {
        // The fake cannot join against actors; store the raw id as the name
        // unless the test inserted via insert_spoken.
        self.insert_spoken(message.clone(), &message.actor_id.to_string());
        Ok(message.clone())
    }

    async fn recent_in_room(
        &self,
        room_id: &RoomId,
        limit: i64,
    ) -> Result<Vec<SpokenMessage>, RepositoryError> {
        let rows = self.rows.lock().unwrap();
        let mut in_room: Vec<SpokenMessage> = rows
            .iter()
            .filter(|m| m.message.room_id == *room_id)
            .cloned()
            .collect();
        in_room.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
        let skip = in_room.len().saturating_sub(limit as usize);
        Ok(in_room.split_off(skip))
    }

    async fn get_by_ids(&self, ids: &[MessageId]) -> Result<Vec<SpokenMessage>, RepositoryError> {
        let rows = self.rows.lock().unwrap();
        let mut found: Vec<SpokenMessage> = rows
            .iter()
            .filter(|m| ids.contains(&m.message.id))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.message.created_at.cmp(&b.message.created_at));
        Ok(found)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryStories {
    rows: Arc<Mutex<Vec<Story>>>,
}

impl InMemoryStories {
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn all(&self) -> Vec<Story> {
        self.rows.lock().unwrap().clone()
    }
}

impl StoryRepository for InMemoryStories {
    async fn create(&self, story: &Story) -> Result<Story, RepositoryError> {
        self.rows.lock().unwrap().push(story.clone());
        Ok(story.clone())
    }

    async fn get_by_id(&self, id: &StoryId) -> Result<Option<Story>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|s| s.id == *id).cloned())
    }

    async fn list_published(&self, filter: StoryFilter) -> Result<Vec<Story>, RepositoryError> {
        let mut rows: Vec<Story> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.is_published)
            .filter(|s| filter.category.is_none_or(|c| s.category == c))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.fire_count.cmp(&a.fire_count));
        if let Some(limit) = filter.limit {
            rows.truncate(limit as usize);
        }
        Ok(rows)
    }

    async fn increment_fire(&self, id: &StoryId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let story = rows
            .iter_mut()
            .find(|s| s.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        story.fire_count += 1;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryGossip {
    rows: Arc<Mutex<Vec<GossipArticle>>>,
}

impl InMemoryGossip {
    pub fn all(&self) -> Vec<GossipArticle> {
        self.rows.lock().unwrap().clone()
    }
}

impl GossipRepository for InMemoryGossip {
    async fn create(&self, article: &GossipArticle) -> Result<GossipArticle, RepositoryError> {
        self.rows.lock().unwrap().push(article.clone());
        Ok(article.clone())
    }

    async fn get_by_id(&self, id: &GossipId) -> Result<Option<GossipArticle>, RepositoryError> {
        Ok(self.rows.lock().unwrap().iter().find(|g| g.id == *id).cloned())
    }

    async fn list(&self, page: i64, limit: i64) -> Result<GossipPage, RepositoryError> {
        let rows = self.rows.lock().unwrap();
        let mut live: Vec<GossipArticle> = rows.iter().filter(|g| !g.removed).cloned().collect();
        live.sort_by(|a, b| b.fire_count.cmp(&a.fire_count));
        let total = live.len() as i64;
        let start = ((page - 1) * limit).max(0) as usize;
        let articles = live.into_iter().skip(start).take(limit as usize).collect();
        Ok(GossipPage { articles, total })
    }

    async fn increment_fire(&self, id: &GossipId) -> Result<i64, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let article = rows
            .iter_mut()
            .find(|g| g.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        article.fire_count += 1;
        Ok(article.fire_count)
    }

    async fn increment_view(&self, id: &GossipId) -> Result<(), RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let article = rows
            .iter_mut()
            .find(|g| g.id == *id)
            .ok_or(RepositoryError::NotFound)?;
        article.view_count += 1;
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTrends {
    rows: Arc<Mutex<Vec<TrendTag>>>,
}

impl InMemoryTrends {
    pub fn all(&self) -> Vec<TrendTag> {
        self.rows.lock().unwrap().clone()
    }
}

impl TrendRepository for InMemoryTrends {
    async fn upsert_increment(
        &self,
        tag: &str,
        story_id: &StoryId,
    ) -> Result<TrendTag, RepositoryError> {
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        if let Some(existing) = rows.iter_mut().find(|t| t.tag == tag) {
            existing.count += 1;
            existing.related_story_ids.push(*story_id);
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let created = TrendTag {
            id: tattle_types::trend::TrendId::new(),
            tag: tag.to_string(),
            count: 1,
            related_story_ids: vec![*story_id],
            created_at: now,
            updated_at: now,
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn top(&self, limit: i64) -> Result<Vec<TrendTag>, RepositoryError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.count.cmp(&a.count));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Gateway and credentials

/// Scripted model gateway: replies are consumed in order; once the script
/// runs dry every call succeeds with a canned line.
#[derive(Default, Clone)]
pub struct FakeGateway {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl FakeGateway {
    pub fn with_replies<I: IntoIterator<Item = Result<String, String>>>(replies: I) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ModelGateway for FakeGateway {
    async fn generate(
        &self,
        _credential: &Credential,
        prompt: &str,
        _options: &GenerateOptions,
    ) -> Result<Generation, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(Generation {
                text,
                session_id: None,
            }),
            Some(Err(message)) => Err(GatewayError::Transport(message)),
            None => Ok(Generation {
                text: "sounds fun, count me in".to_string(),
                session_id: None,
            }),
        }
    }
}

/// Credential source fake with call counters, so tests can assert that a
/// path never consulted credentials at all.
#[derive(Default, Clone)]
pub struct FakeCredentials {
    per_profile: Arc<Mutex<Vec<(ProfileId, Credential)>>>,
    fallback: Arc<Mutex<Option<Credential>>>,
    lookups: Arc<AtomicUsize>,
}

impl FakeCredentials {
    pub fn with_fallback(credential: Credential) -> Self {
        let fake = Self::default();
        *fake.fallback.lock().unwrap() = Some(credential);
        fake
    }

    pub fn grant(&self, profile_id: ProfileId, credential: Credential) {
        self.per_profile.lock().unwrap().push((profile_id, credential));
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl CredentialSource for FakeCredentials {
    async fn for_profile(&self, profile_id: &ProfileId) -> Option<Credential> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.per_profile
            .lock()
            .unwrap()
            .iter()
            .find(|(pid, _)| pid == profile_id)
            .map(|(_, c)| c.clone())
    }

    async fn any_valid(&self) -> Option<Credential> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.fallback.lock().unwrap().clone()
    }
}
