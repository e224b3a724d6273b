//! SQLite interaction repository implementation. Append-only audit log.

use tattle_core::repository::interaction::InteractionRepository;
use tattle_types::error::RepositoryError;
use tattle_types::interaction::Interaction;

use super::format_datetime;
use super::pool::DatabasePool;

/// SQLite-backed implementation of `InteractionRepository`.
pub struct SqliteInteractionRepository {
    pool: DatabasePool,
}

impl SqliteInteractionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

impl InteractionRepository for SqliteInteractionRepository {
    async fn record(&self, interaction: &Interaction) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO interactions (id, profile_id, kind, target_kind, target_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(interaction.id.to_string())
        .bind(interaction.profile_id.as_ref().map(|id| id.to_string()))
        .bind(interaction.kind.to_string())
        .bind(interaction.target_kind.to_string())
        .bind(interaction.target_id.to_string())
        .bind(format_datetime(&interaction.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }
}
