//! Story repository trait definition.

use tattle_types::error::RepositoryError;
use tattle_types::story::{Story, StoryCategory, StoryId};

/// Filter criteria for listing stories.
#[derive(Debug, Clone, Default)]
pub struct StoryFilter {
    pub category: Option<StoryCategory>,
    pub limit: Option<i64>,
}

/// Repository trait for story persistence.
pub trait StoryRepository: Send + Sync {
    fn create(
        &self,
        story: &Story,
    ) -> impl std::future::Future<Output = Result<Story, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &StoryId,
    ) -> impl std::future::Future<Output = Result<Option<Story>, RepositoryError>> + Send;

    /// Published stories, hottest first (fire count, then publish time).
    fn list_published(
        &self,
        filter: StoryFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Story>, RepositoryError>> + Send;

    /// Increment the fire counter. Monotonically non-decreasing.
    fn increment_fire(
        &self,
        id: &StoryId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
