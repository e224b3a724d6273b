//! Gossip article repository trait definition.

use tattle_types::error::RepositoryError;
use tattle_types::gossip::{GossipArticle, GossipId};

/// One page of articles plus the total count of non-removed articles.
#[derive(Debug, Clone)]
pub struct GossipPage {
    pub articles: Vec<GossipArticle>,
    pub total: i64,
}

/// Repository trait for gossip article persistence.
pub trait GossipRepository: Send + Sync {
    fn create(
        &self,
        article: &GossipArticle,
    ) -> impl std::future::Future<Output = Result<GossipArticle, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &GossipId,
    ) -> impl std::future::Future<Output = Result<Option<GossipArticle>, RepositoryError>> + Send;

    /// Non-removed articles, hottest first (fire count, then recency).
    /// `page` is 1-based.
    fn list(
        &self,
        page: i64,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<GossipPage, RepositoryError>> + Send;

    /// Increment the fire counter and return the new value.
    fn increment_fire(
        &self,
        id: &GossipId,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    /// Increment the view counter.
    fn increment_view(
        &self,
        id: &GossipId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
