//! Profile repository trait definition.

use chrono::{DateTime, Utc};

use tattle_types::credential::Credential;
use tattle_types::error::RepositoryError;
use tattle_types::profile::{Profile, ProfileId};

/// Repository trait for profile persistence, including the stored OAuth
/// credential pair.
///
/// Implementations live in tattle-infra (e.g., SqliteProfileRepository).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ProfileRepository: Send + Sync {
    /// Create a new profile. Returns the created profile.
    fn create(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<Profile, RepositoryError>> + Send;

    /// Get a profile by its unique ID.
    fn get_by_id(
        &self,
        id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Get a profile by the identity provider's stable external id.
    fn get_by_external_id(
        &self,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Update an existing profile's mutable fields.
    fn update(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<Profile, RepositoryError>> + Send;

    /// Load the stored credential for a profile, if any.
    fn get_credential(
        &self,
        id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Option<Credential>, RepositoryError>> + Send;

    /// Store a (possibly refreshed) credential pair for a profile.
    /// Last-writer-wins; concurrent refreshes are not guarded against.
    fn save_credential(
        &self,
        id: &ProfileId,
        credential: &Credential,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// The most-recently-updated profile holding any stored credential,
    /// expired or not. Used by the round's "borrowed voice" fallback,
    /// which refreshes as needed.
    fn latest_with_credential(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<(ProfileId, Credential)>, RepositoryError>> + Send;

    /// The most-recently-updated profile holding a credential that is
    /// still unexpired at `now`. Used by analysis calls that need any
    /// usable voice.
    fn latest_with_valid_credential(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Option<(ProfileId, Credential)>, RepositoryError>> + Send;
}
