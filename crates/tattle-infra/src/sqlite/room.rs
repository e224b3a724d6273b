//! SQLite room repository implementation.

use chrono::{DateTime, Utc};
use sqlx::Row;

use tattle_core::repository::room::RoomRepository;
use tattle_types::error::RepositoryError;
use tattle_types::room::{Room, RoomId};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `RoomRepository`.
pub struct SqliteRoomRepository {
    pool: DatabasePool,
}

impl SqliteRoomRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn room_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Room, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(Room {
        id: id
            .parse::<RoomId>()
            .map_err(|e| RepositoryError::Query(format!("invalid room id: {e}")))?,
        name: row
            .try_get("name")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        topic: row
            .try_get("topic")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        is_active: row
            .try_get::<i64, _>("is_active")
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            != 0,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

impl RoomRepository for SqliteRoomRepository {
    async fn create(&self, room: &Room) -> Result<Room, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO rooms (id, name, topic, description, is_active, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(room.id.to_string())
        .bind(&room.name)
        .bind(&room.topic)
        .bind(&room.description)
        .bind(room.is_active as i64)
        .bind(format_datetime(&room.created_at))
        .bind(format_datetime(&room.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(room.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("room '{}' already exists", room.name)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &RoomId) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM rooms WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(room_from_row).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Room>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM rooms WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(room_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Room>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM rooms ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(room_from_row).collect()
    }

    async fn touch(&self, id: &RoomId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE rooms SET updated_at = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        Ok(())
    }
}
