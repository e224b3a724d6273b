//! SQLite actor repository implementation.

use chrono::{DateTime, Utc};
use sqlx::Row;

use tattle_core::repository::actor::ActorRepository;
use tattle_types::actor::{Actor, ActorId};
use tattle_types::error::RepositoryError;
use tattle_types::profile::ProfileId;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ActorRepository`.
pub struct SqliteActorRepository {
    pool: DatabasePool,
}

impl SqliteActorRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Actor.
struct ActorRow {
    id: String,
    profile_id: Option<String>,
    name: String,
    avatar_url: Option<String>,
    persona: String,
    system_prompt: String,
    mood: Option<String>,
    last_active_at: String,
    message_count: i64,
    interests: String,
    created_at: String,
    updated_at: String,
}

impl ActorRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            profile_id: row.try_get("profile_id")?,
            name: row.try_get("name")?,
            avatar_url: row.try_get("avatar_url")?,
            persona: row.try_get("persona")?,
            system_prompt: row.try_get("system_prompt")?,
            mood: row.try_get("mood")?,
            last_active_at: row.try_get("last_active_at")?,
            message_count: row.try_get("message_count")?,
            interests: row.try_get("interests")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_actor(self) -> Result<Actor, RepositoryError> {
        let id = self
            .id
            .parse::<ActorId>()
            .map_err(|e| RepositoryError::Query(format!("invalid actor id: {e}")))?;

        let profile_id = self
            .profile_id
            .as_deref()
            .map(|s| {
                s.parse::<ProfileId>()
                    .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))
            })
            .transpose()?;

        let interests: Vec<String> = serde_json::from_str(&self.interests)
            .map_err(|e| RepositoryError::Query(format!("invalid interests JSON: {e}")))?;

        Ok(Actor {
            id,
            profile_id,
            name: self.name,
            avatar_url: self.avatar_url,
            persona: self.persona,
            system_prompt: self.system_prompt,
            mood: self.mood,
            last_active_at: parse_datetime(&self.last_active_at)?,
            message_count: self.message_count,
            interests,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn rows_to_actors(rows: &[sqlx::sqlite::SqliteRow]) -> Result<Vec<Actor>, RepositoryError> {
    let mut actors = Vec::with_capacity(rows.len());
    for row in rows {
        let actor_row =
            ActorRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
        actors.push(actor_row.into_actor()?);
    }
    Ok(actors)
}

impl ActorRepository for SqliteActorRepository {
    async fn create(&self, actor: &Actor) -> Result<Actor, RepositoryError> {
        let interests_json = serde_json::to_string(&actor.interests)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            "INSERT INTO actors (id, profile_id, name, avatar_url, persona, system_prompt, mood, last_active_at, message_count, interests, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(actor.id.to_string())
        .bind(actor.profile_id.as_ref().map(|id| id.to_string()))
        .bind(&actor.name)
        .bind(&actor.avatar_url)
        .bind(&actor.persona)
        .bind(&actor.system_prompt)
        .bind(&actor.mood)
        .bind(format_datetime(&actor.last_active_at))
        .bind(actor.message_count)
        .bind(&interests_json)
        .bind(format_datetime(&actor.created_at))
        .bind(format_datetime(&actor.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(actor.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(
                    "profile already has an actor".to_string(),
                ))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &ActorId) -> Result<Option<Actor>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM actors WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let actor_row =
                    ActorRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(actor_row.into_actor()?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Option<Actor>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM actors WHERE profile_id = ?")
            .bind(profile_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let actor_row =
                    ActorRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(actor_row.into_actor()?))
            }
            None => Ok(None),
        }
    }

    async fn get_by_ids(&self, ids: &[ActorId]) -> Result<Vec<Actor>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM actors WHERE id IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let fetched = rows_to_actors(&rows)?;

        // Preserve the caller's ordering (first id = main character).
        let mut ordered = Vec::with_capacity(fetched.len());
        for id in ids {
            if let Some(actor) = fetched.iter().find(|a| a.id == *id) {
                ordered.push(actor.clone());
            }
        }
        Ok(ordered)
    }

    async fn get_by_names(&self, names: &[String]) -> Result<Vec<Actor>, RepositoryError> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!("SELECT * FROM actors WHERE name IN ({placeholders})");

        let mut query = sqlx::query(&sql);
        for name in names {
            query = query.bind(name);
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_actors(&rows)
    }

    async fn list_active_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Actor>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM actors WHERE last_active_at >= ? ORDER BY last_active_at DESC LIMIT ?",
        )
        .bind(format_datetime(&cutoff))
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows_to_actors(&rows)
    }

    async fn most_recent_active_excluding(
        &self,
        exclude: &ActorId,
    ) -> Result<Option<Actor>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM actors WHERE id != ? ORDER BY last_active_at DESC LIMIT 1",
        )
        .bind(exclude.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let actor_row =
                    ActorRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(actor_row.into_actor()?))
            }
            None => Ok(None),
        }
    }

    async fn record_utterance(
        &self,
        id: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE actors SET last_active_at = ?, message_count = message_count + 1, updated_at = ?
             WHERE id = ?",
        )
        .bind(format_datetime(&at))
        .bind(format_datetime(&at))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::testing::test_pool;

    fn make_actor(name: &str) -> Actor {
        let now = Utc::now();
        Actor {
            id: ActorId::new(),
            profile_id: None,
            name: name.to_string(),
            avatar_url: None,
            persona: format!("{name}'s persona"),
            system_prompt: format!("you are {name}"),
            mood: Some("upbeat".to_string()),
            last_active_at: now,
            message_count: 0,
            interests: vec!["gossip".to_string()],
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = SqliteActorRepository::new(test_pool().await);
        let actor = make_actor("Luna");

        repo.create(&actor).await.unwrap();

        let found = repo.get_by_id(&actor.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Luna");
        assert_eq!(found.interests, vec!["gossip"]);
        assert_eq!(found.mood.as_deref(), Some("upbeat"));
    }

    #[tokio::test]
    async fn test_get_by_ids_preserves_order() {
        let repo = SqliteActorRepository::new(test_pool().await);
        let a = make_actor("A");
        let b = make_actor("B");
        repo.create(&a).await.unwrap();
        repo.create(&b).await.unwrap();

        let found = repo.get_by_ids(&[b.id, a.id]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, b.id);
        assert_eq!(found[1].id, a.id);
    }

    #[tokio::test]
    async fn test_get_by_names_skips_unknown() {
        let repo = SqliteActorRepository::new(test_pool().await);
        let a = make_actor("Known");
        repo.create(&a).await.unwrap();

        let found = repo
            .get_by_names(&["Known".to_string(), "Ghost".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Known");
    }

    #[tokio::test]
    async fn test_list_active_since_filters_and_caps() {
        let repo = SqliteActorRepository::new(test_pool().await);

        let mut stale = make_actor("Stale");
        stale.last_active_at = Utc::now() - chrono::Duration::hours(48);
        repo.create(&stale).await.unwrap();

        for i in 0..3 {
            repo.create(&make_actor(&format!("Fresh{i}"))).await.unwrap();
        }

        let cutoff = Utc::now() - chrono::Duration::hours(24);
        let active = repo.list_active_since(cutoff, 10).await.unwrap();
        assert_eq!(active.len(), 3);
        assert!(active.iter().all(|a| a.name.starts_with("Fresh")));

        let capped = repo.list_active_since(cutoff, 2).await.unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_record_utterance_bumps_counters() {
        let repo = SqliteActorRepository::new(test_pool().await);
        let actor = make_actor("Talker");
        repo.create(&actor).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(5);
        repo.record_utterance(&actor.id, later).await.unwrap();
        repo.record_utterance(&actor.id, later).await.unwrap();

        let found = repo.get_by_id(&actor.id).await.unwrap().unwrap();
        assert_eq!(found.message_count, 2);
        assert!(found.last_active_at > actor.last_active_at);
    }

    #[tokio::test]
    async fn test_most_recent_active_excluding() {
        let repo = SqliteActorRepository::new(test_pool().await);
        let a = make_actor("First");
        repo.create(&a).await.unwrap();

        // Nobody else exists yet.
        assert!(repo
            .most_recent_active_excluding(&a.id)
            .await
            .unwrap()
            .is_none());

        let mut b = make_actor("Second");
        b.last_active_at = Utc::now() + chrono::Duration::seconds(10);
        repo.create(&b).await.unwrap();

        let partner = repo
            .most_recent_active_excluding(&a.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(partner.id, b.id);
    }
}
