//! SQLite trend tag repository implementation.
//!
//! The upsert uses SQLite's `ON CONFLICT` with `json_insert` so the
//! increment-or-create plus story-id append happens in one statement.

use chrono::Utc;
use sqlx::Row;

use tattle_core::repository::trend::TrendRepository;
use tattle_types::error::RepositoryError;
use tattle_types::story::StoryId;
use tattle_types::trend::{TrendId, TrendTag};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, parse_id_list};

/// SQLite-backed implementation of `TrendRepository`.
pub struct SqliteTrendRepository {
    pool: DatabasePool,
}

impl SqliteTrendRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn trend_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<TrendTag, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let related: String = row
        .try_get("related_story_ids")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let updated_at: String = row
        .try_get("updated_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(TrendTag {
        id: id
            .parse::<TrendId>()
            .map_err(|e| RepositoryError::Query(format!("invalid trend id: {e}")))?,
        tag: row
            .try_get("tag")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        count: row
            .try_get("count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        related_story_ids: parse_id_list::<StoryId>(&related)?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

impl TrendRepository for SqliteTrendRepository {
    async fn upsert_increment(
        &self,
        tag: &str,
        story_id: &StoryId,
    ) -> Result<TrendTag, RepositoryError> {
        let now = format_datetime(&Utc::now());

        sqlx::query(
            "INSERT INTO trend_tags (id, tag, count, related_story_ids, created_at, updated_at)
             VALUES (?, ?, 1, json_array(?), ?, ?)
             ON CONFLICT(tag) DO UPDATE SET
                 count = count + 1,
                 related_story_ids = json_insert(related_story_ids, '$[#]', ?),
                 updated_at = excluded.updated_at",
        )
        .bind(TrendId::new().to_string())
        .bind(tag)
        .bind(story_id.to_string())
        .bind(&now)
        .bind(&now)
        .bind(story_id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let row = sqlx::query("SELECT * FROM trend_tags WHERE tag = ?")
            .bind(tag)
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        trend_from_row(&row)
    }

    async fn top(&self, limit: i64) -> Result<Vec<TrendTag>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM trend_tags ORDER BY count DESC, updated_at DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(trend_from_row).collect()
    }
}
