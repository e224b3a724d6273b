//! Trend tag repository trait definition.

use tattle_types::error::RepositoryError;
use tattle_types::story::StoryId;
use tattle_types::trend::TrendTag;

/// Repository trait for the trending-tags aggregate.
pub trait TrendRepository: Send + Sync {
    /// Increment-or-create: bump the tag's count (creating it with count 1
    /// when absent) and append the story id to its related list.
    fn upsert_increment(
        &self,
        tag: &str,
        story_id: &StoryId,
    ) -> impl std::future::Future<Output = Result<TrendTag, RepositoryError>> + Send;

    /// The hottest tags by count.
    fn top(
        &self,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<TrendTag>, RepositoryError>> + Send;
}
