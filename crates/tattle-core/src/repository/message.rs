//! Message repository trait definition.

use tattle_types::error::RepositoryError;
use tattle_types::message::{ChatMessage, MessageId, SpokenMessage};
use tattle_types::room::RoomId;

/// Repository trait for the append-only message log.
pub trait MessageRepository: Send + Sync {
    /// Append a message. Messages are immutable once created.
    fn create(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// The latest `limit` messages in a room, returned oldest-first and
    /// joined with the speaking actor's display name.
    fn recent_in_room(
        &self,
        room_id: &RoomId,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<SpokenMessage>, RepositoryError>> + Send;

    /// Load specific messages (evidence trails), oldest-first.
    fn get_by_ids(
        &self,
        ids: &[MessageId],
    ) -> impl std::future::Future<Output = Result<Vec<SpokenMessage>, RepositoryError>> + Send;
}
