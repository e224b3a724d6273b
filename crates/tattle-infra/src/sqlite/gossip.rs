//! SQLite gossip article repository implementation.

use sqlx::Row;

use tattle_core::repository::gossip::{GossipPage, GossipRepository};
use tattle_types::error::RepositoryError;
use tattle_types::gossip::{GossipArticle, GossipId};
use tattle_types::story::{StoryCategory, StoryId};

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `GossipRepository`.
pub struct SqliteGossipRepository {
    pool: DatabasePool,
}

impl SqliteGossipRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn article_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<GossipArticle, RepositoryError> {
    let id: String = row
        .try_get("id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let story_id: String = row
        .try_get("story_id")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let category: String = row
        .try_get("category")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;
    let created_at: String = row
        .try_get("created_at")
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

    Ok(GossipArticle {
        id: id
            .parse::<GossipId>()
            .map_err(|e| RepositoryError::Query(format!("invalid gossip id: {e}")))?,
        story_id: story_id
            .parse::<StoryId>()
            .map_err(|e| RepositoryError::Query(format!("invalid story id: {e}")))?,
        title: row
            .try_get("title")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        body: row
            .try_get("body")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        category: category
            .parse::<StoryCategory>()
            .map_err(RepositoryError::Query)?,
        debate_transcript: row
            .try_get("debate_transcript")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        fire_count: row
            .try_get("fire_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        view_count: row
            .try_get("view_count")
            .map_err(|e| RepositoryError::Query(e.to_string()))?,
        removed: row
            .try_get::<i64, _>("removed")
            .map_err(|e| RepositoryError::Query(e.to_string()))?
            != 0,
        created_at: parse_datetime(&created_at)?,
    })
}

impl GossipRepository for SqliteGossipRepository {
    async fn create(&self, article: &GossipArticle) -> Result<GossipArticle, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO gossip_articles (id, story_id, title, body, category, debate_transcript, fire_count, view_count, removed, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(article.id.to_string())
        .bind(article.story_id.to_string())
        .bind(&article.title)
        .bind(&article.body)
        .bind(article.category.to_string())
        .bind(&article.debate_transcript)
        .bind(article.fire_count)
        .bind(article.view_count)
        .bind(article.removed as i64)
        .bind(format_datetime(&article.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(article.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(
                    "story already has an article".to_string(),
                ))
            }
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &GossipId) -> Result<Option<GossipArticle>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM gossip_articles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        row.as_ref().map(article_from_row).transpose()
    }

    async fn list(&self, page: i64, limit: i64) -> Result<GossipPage, RepositoryError> {
        let page = page.max(1);
        let offset = (page - 1) * limit;

        let rows = sqlx::query(
            "SELECT * FROM gossip_articles WHERE removed = 0
             ORDER BY fire_count DESC, created_at DESC
             LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let articles: Vec<GossipArticle> =
            rows.iter().map(article_from_row).collect::<Result<_, _>>()?;

        let total: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM gossip_articles WHERE removed = 0")
                .fetch_one(&self.pool.reader)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(GossipPage {
            articles,
            total: total.0,
        })
    }

    async fn increment_fire(&self, id: &GossipId) -> Result<i64, RepositoryError> {
        let result =
            sqlx::query("UPDATE gossip_articles SET fire_count = fire_count + 1 WHERE id = ?")
                .bind(id.to_string())
                .execute(&self.pool.writer)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row: (i64,) = sqlx::query_as("SELECT fire_count FROM gossip_articles WHERE id = ?")
            .bind(id.to_string())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(row.0)
    }

    async fn increment_view(&self, id: &GossipId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE gossip_articles SET view_count = view_count + 1 WHERE id = ?")
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
    use crate::sqlite::actor::SqliteActorRepository;
    use crate::sqlite::pool::testing::test_pool;
    use crate::sqlite::story::SqliteStoryRepository;
    use chrono::Utc;
    use tattle_core::repository::actor::ActorRepository;
    use tattle_core::repository::story::StoryRepository;
    use tattle_types::actor::{Actor, ActorId};
    use tattle_types::story::Story;

    async fn seeded_story(pool: &DatabasePool, category: StoryCategory) -> Story {
        let now = Utc::now();
        let actor = Actor {
            id: ActorId::new(),
            profile_id: None,
            name: format!("Star-{}", ActorId::new()),
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

        let story = Story {
            id: StoryId::new(),
            category,
            title: "t".to_string(),
            summary: "s".to_string(),
            evidence: "e".to_string(),
            main_actor_id: actor.id,
            other_actor_ids: Vec::new(),
            source_message_ids: Vec::new(),
            is_published: true,
            published_at: Some(now),
            fire_count: 0,
            view_count: 0,
            created_at: now,
        };
        SqliteStoryRepository::new(pool.clone())
            .create(&story)
            .await
            .unwrap();
        story
    }

    fn make_article(story: &Story) -> GossipArticle {
        GossipArticle {
            id: GossipId::new(),
            story_id: story.id,
            title: "headline".to_string(),
            body: "body".to_string(),
            category: story.category,
            debate_transcript: None,
            fire_count: 0,
            view_count: 0,
            removed: false,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_article_category_matches_owning_story() {
        let pool = test_pool().await;
        let story = seeded_story(&pool, StoryCategory::Friendship).await;
        let stories = SqliteStoryRepository::new(pool.clone());
        let repo = SqliteGossipRepository::new(pool);

        let article = make_article(&story);
        repo.create(&article).await.unwrap();

        let found = repo.get_by_id(&article.id).await.unwrap().unwrap();
        let owning = stories.get_by_id(&found.story_id).await.unwrap().unwrap();
        assert_eq!(owning.category, found.category);
    }

    #[tokio::test]
    async fn test_one_article_per_story() {
        let pool = test_pool().await;
        let story = seeded_story(&pool, StoryCategory::Cp).await;
        let repo = SqliteGossipRepository::new(pool);

        repo.create(&make_article(&story)).await.unwrap();
        let err = repo.create(&make_article(&story)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_excludes_removed() {
        let pool = test_pool().await;
        let s1 = seeded_story(&pool, StoryCategory::Cp).await;
        let s2 = seeded_story(&pool, StoryCategory::Weird).await;
        let repo = SqliteGossipRepository::new(pool);

        repo.create(&make_article(&s1)).await.unwrap();
        let mut hidden = make_article(&s2);
        hidden.removed = true;
        repo.create(&hidden).await.unwrap();

        let page = repo.list(1, 10).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.articles.len(), 1);
        assert!(!page.articles[0].removed);
    }

    #[tokio::test]
    async fn test_counters() {
        let pool = test_pool().await;
        let story = seeded_story(&pool, StoryCategory::Cp).await;
        let repo = SqliteGossipRepository::new(pool);

        let article = make_article(&story);
        repo.create(&article).await.unwrap();

        assert_eq!(repo.increment_fire(&article.id).await.unwrap(), 1);
        assert_eq!(repo.increment_fire(&article.id).await.unwrap(), 2);
        repo.increment_view(&article.id).await.unwrap();

        let found = repo.get_by_id(&article.id).await.unwrap().unwrap();
        assert_eq!(found.fire_count, 2);
        assert_eq!(found.view_count, 1);
    }
}
