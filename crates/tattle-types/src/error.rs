use thiserror::Error;

/// Errors from repository operations (used by trait definitions in
/// tattle-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the credential lifecycle.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to the simulated world (actors, rooms, rounds).
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("profile not found")]
    ProfileNotFound,

    #[error("actor not found")]
    ActorNotFound,

    #[error("room not found")]
    RoomNotFound,

    #[error("storage error: {0}")]
    StorageError(String),
}

/// Errors related to story publishing and gossip generation.
#[derive(Debug, Error)]
pub enum GossipError {
    #[error("story not found")]
    StoryNotFound,

    #[error("gossip article not found")]
    ArticleNotFound,

    #[error("actor not found")]
    ActorNotFound,

    #[error("no candidate actors resolved")]
    NoActorsResolved,

    #[error("storage error: {0}")]
    StorageError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_world_error_display() {
        assert_eq!(WorldError::RoomNotFound.to_string(), "room not found");
    }
}
