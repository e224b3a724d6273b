//! SQLite story repository implementation.

use sqlx::Row;

use tattle_core::repository::story::{StoryFilter, StoryRepository};
use tattle_types::actor::ActorId;
use tattle_types::error::RepositoryError;
use tattle_types::message::MessageId;
use tattle_types::story::{Story, StoryCategory, StoryId};

use super::pool::DatabasePool;
use super::{encode_id_list, format_datetime, parse_datetime, parse_id_list};

/// SQLite-backed implementation of `StoryRepository`.
pub struct SqliteStoryRepository {
    pool: DatabasePool,
}

impl SqliteStoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn story_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Story, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let category: String = row
        .try_get("category")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let main_actor_id: String = row
        .try_get("main_actor_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let other_actor_ids: String = row
        .try_get("other_actor_ids")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let source_message_ids: String = row
        .try_get("source_message_ids")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let published_at: Option<String> = row
        .try_get("published_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(Story {
        id: id
            .parse::<StoryId>()
            .map_err(|e| RepositoryError::Query(format!("invalid story id: {e}")))?,
        category: category
            .parse::<StoryCategory>()
            .map_err(RepositoryError::Query)?,
        title: row
            .try_get("title")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        summary: row
            .try_get("summary")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        evidence: row
            .try_get("evidence")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        main_actor_id: main_actor_id
            .parse::<ActorId>()
            .map_err(|e| RepositoryError::Query(format!("invalid actor id: {e}")))?,
        other_actor_ids: parse_id_list::<ActorId>(&other_actor_ids)?,
        source_message_ids: parse_id_list::<MessageId>(&source_message_ids)?,
        is_published: row
            .try_get::<i64, _>("is_published")
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            != 0,
        published_at: published_at.as_deref().map(parse_datetime).transpose()?,
        fire_count: row
            .try_get("fire_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        view_count: row
            .try_get("view_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl StoryRepository for SqliteStoryRepository {
    async fn create(&self, story: &Story) -> Result<Story, RepositoryError> {
        sqlx::query(
            "INSERT INTO stories (id, category, title, summary, evidence, main_actor_id, other_actor_ids, source_message_ids, is_published, published_at, fire_count, view_count, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(story.id.to_string())
        .bind(story.category.to_string())
        .bind(&story.title)
        .bind(&story.summary)
        .bind(&story.evidence)
        .bind(story.main_actor_id.to_string())
        .bind(encode_id_list(&story.other_actor_ids)?)
        .bind(encode_id_list(&story.source_message_ids)?)
        .bind(story.is_published as i64)
        .bind(story.published_at.as_ref().map(format_datetime))
        .bind(story.fire_count)
        .bind(story.view_count)
        .bind(format_datetime(&story.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(story.clone())
    }

    async fn get_by_id(&self, id: &StoryId) -> Result<Option<Story>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM stories WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(story_from_row).transpose()
    }

    async fn list_published(&self, filter: StoryFilter) -> Result<Vec<Story>, RepositoryError> {
        let mut sql =
            String::from("SELECT * FROM stories WHERE is_published = 1");
        if filter.category.is_some() {
            sql.push_str(" AND category = ?");
        }
        sql.push_str(" ORDER BY fire_count DESC, published_at DESC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(category) = filter.category {
            query = query.bind(category.to_string());
        }
        query = query.bind(filter.limit.unwrap_or(20));

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter().map(story_from_row).collect()
    }

    async fn increment_fire(&self, id: &StoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE stories SET fire_count = fire_count + 1 WHERE id = ?")
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
