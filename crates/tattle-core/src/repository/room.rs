//! Room repository trait definition.

use chrono::{DateTime, Utc};

use tattle_types::error::RepositoryError;
use tattle_types::room::{Room, RoomId};

/// Repository trait for room persistence.
pub trait RoomRepository: Send + Sync {
    fn create(
        &self,
        room: &Room,
    ) -> impl std::future::Future<Output = Result<Room, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &RoomId,
    ) -> impl std::future::Future<Output = Result<Option<Room>, RepositoryError>> + Send;

    fn get_by_name(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<Option<Room>, RepositoryError>> + Send;

    fn list(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Room>, RepositoryError>> + Send;

    /// Bump the room's activity timestamp. The only write a room sees after
    /// seeding.
    fn touch(
        &self,
        id: &RoomId,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
