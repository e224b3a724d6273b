//! Actor repository trait definition.

use chrono::{DateTime, Utc};

use tattle_types::actor::{Actor, ActorId};
use tattle_types::error::RepositoryError;
use tattle_types::profile::ProfileId;

/// Repository trait for actor persistence.
pub trait ActorRepository: Send + Sync {
    /// Create a new actor. Returns the created actor.
    fn create(
        &self,
        actor: &Actor,
    ) -> impl std::future::Future<Output = Result<Actor, RepositoryError>> + Send;

    /// Get an actor by its unique ID.
    fn get_by_id(
        &self,
        id: &ActorId,
    ) -> impl std::future::Future<Output = Result<Option<Actor>, RepositoryError>> + Send;

    /// Get the actor owned by a profile (at most one exists).
    fn get_by_profile(
        &self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Option<Actor>, RepositoryError>> + Send;

    /// Load actors by id, preserving input order for ids that resolve.
    fn get_by_ids(
        &self,
        ids: &[ActorId],
    ) -> impl std::future::Future<Output = Result<Vec<Actor>, RepositoryError>> + Send;

    /// Resolve display names (as produced by the model) to actor records.
    /// Names with no match are silently absent from the result.
    fn get_by_names(
        &self,
        names: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Actor>, RepositoryError>> + Send;

    /// Actors active since `cutoff`, most recent first, capped at `limit`.
    fn list_active_since(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Actor>, RepositoryError>> + Send;

    /// The most-recently-active actor other than `exclude`. Used to pick a
    /// pairing partner for instant "ship" gossip.
    fn most_recent_active_excluding(
        &self,
        exclude: &ActorId,
    ) -> impl std::future::Future<Output = Result<Option<Actor>, RepositoryError>> + Send;

    /// Bump `last_active_at` to `at` and increment the lifetime message
    /// count. Called once per persisted utterance.
    fn record_utterance(
        &self,
        id: &ActorId,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
