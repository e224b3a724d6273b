//! SQLite message repository implementation.
//!
//! Messages are append-only. Reads join the speaking actor's display name
//! so callers can render "[name]: text" transcript lines directly.

use sqlx::Row;

use tattle_core::repository::message::MessageRepository;
use tattle_types::actor::ActorId;
use tattle_types::error::RepositoryError;
use tattle_types::message::{ChatMessage, MessageId, SpokenMessage};
use tattle_types::room::RoomId;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn spoken_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SpokenMessage, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let room_id: String = row
        .try_get("room_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let actor_id: String = row
        .try_get("actor_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(SpokenMessage {
        message: ChatMessage {
            id: id
                .parse::<MessageId>()
                .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?,
            room_id: room_id
                .parse::<RoomId>()
                .map_err(|e| RepositoryError::Query(format!("invalid room id: {e}")))?,
            actor_id: actor_id
                .parse::<ActorId>()
                .map_err(|e| RepositoryError::Query(format!("invalid actor id: {e}")))?,
            content: row
                .try_get("content")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            emotion: row
                .try_get("emotion")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            created_at: parse_datetime(&created_at)?,
        },
        actor_name: row
            .try_get("actor_name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
    })
}

impl MessageRepository for SqliteMessageRepository {
    async fn create(&self, message: &ChatMessage) -> Result<ChatMessage, RepositoryError> {
        sqlx::query(
            "INSERT INTO messages (id, room_id, actor_id, content, emotion, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(message.id.to_string())
        .bind(message.room_id.to_string())
        .bind(message.actor_id.to_string())
        .bind(&message.content)
        .bind(&message.emotion)
        .bind(format_datetime(&message.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(message.clone())
    }

    async fn recent_in_room(
        &self,
        room_id: &RoomId,
        limit: i64,
    ) -> Result<Vec<SpokenMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT m.*, a.name AS actor_name FROM messages m
             JOIN actors a ON a.id = m.actor_id
             WHERE m.room_id = ?
             ORDER BY m.created_at DESC, m.id DESC
             LIMIT ?",
        )
        .bind(room_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages: Vec<SpokenMessage> =
            rows.iter().map(spoken_from_row).collect::<Result<_, _>>()?;
        // Fetched newest-first for the LIMIT; callers want oldest-first.
        messages.reverse();
        Ok(messages)
    }

    async fn get_by_ids(&self, ids: &[MessageId]) -> Result<Vec<SpokenMessage>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT m.*, a.name AS actor_name FROM messages m
             JOIN actors a ON a.id = m.actor_id
             WHERE m.id IN ({placeholders})
             ORDER BY m.created_at ASC, m.id ASC"
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(spoken_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::actor::SqliteActorRepository;
    use crate::sqlite::pool::testing::test_pool;
    use crate::sqlite::room::SqliteRoomRepository;
    use chrono::{Duration, Utc};
    use tattle_core::repository::actor::ActorRepository;
    use tattle_core::repository::room::RoomRepository;
    use tattle_types::actor::Actor;
    use tattle_types::room::Room;

    async fn fixtures(pool: &DatabasePool) -> (Room, Actor) {
        let now = Utc::now();
        let room = Room {
            id: RoomId::new(),
            name: "Cafe".to_string(),
            topic: None,
            description: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        SqliteRoomRepository::new(pool.clone())
            .create(&room)
            .await
            .unwrap();

        let actor = Actor {
            id: ActorId::new(),
            profile_id: None,
            name: "Luna".to_string(),
            avatar_url: None,
            persona: "p".to_string(),
            system_prompt: "s".to_string(),
            mood: None,
            last_active_at: now,
            message_count: 0,
            interests: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        SqliteActorRepository::new(pool.clone())
            .create(&actor)
            .await
            .unwrap();

        (room, actor)
    }

    fn make_message(room: &Room, actor: &Actor, content: &str, offset_secs: i64) -> ChatMessage {
        ChatMessage {
            id: MessageId::new(),
            room_id: room.id,
            actor_id: actor.id,
            content: content.to_string(),
            emotion: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn test_recent_in_room_oldest_first_with_names() {
        let pool = test_pool().await;
        let (room, actor) = fixtures(&pool).await;
        let repo = SqliteMessageRepository::new(pool);

        for i in 0..5 {
            repo.create(&make_message(&room, &actor, &format!("msg {i}"), i))
                .await
                .unwrap();
        }

        let recent = repo.recent_in_room(&room.id, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].message.content, "msg 2");
        assert_eq!(recent[2].message.content, "msg 4");
        assert_eq!(recent[0].actor_name, "Luna");
        assert_eq!(recent[0].transcript_line(), "[Luna]: msg 2");
    }

    #[tokio::test]
    async fn test_get_by_ids_chronological() {
        let pool = test_pool().await;
        let (room, actor) = fixtures(&pool).await;
        let repo = SqliteMessageRepository::new(pool);

        let first = make_message(&room, &actor, "first", 0);
        let second = make_message(&room, &actor, "second", 10);
        repo.create(&second).await.unwrap();
        repo.create(&first).await.unwrap();

        let found = repo.get_by_ids(&[second.id, first.id]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].message.content, "first");
        assert_eq!(found[1].message.content, "second");
    }

    #[tokio::test]
    async fn test_empty_room_has_no_messages() {
        let pool = test_pool().await;
        let (room, _) = fixtures(&pool).await;
        let repo = SqliteMessageRepository::new(pool);

        assert!(repo.recent_in_room(&room.id, 20).await.unwrap().is_empty());
        assert!(repo.get_by_ids(&[]).await.unwrap().is_empty());
    }
}
