//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tattle_types::error::{CredentialError, GossipError, WorldError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// World errors (profiles, actors, rooms, rounds).
    World(WorldError),
    /// Story / gossip errors.
    Gossip(GossipError),
    /// Credential lifecycle errors (OAuth exchange/refresh).
    Credential(CredentialError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// Generic internal error.
    Internal(String),
}

impl From<WorldError> for AppError {
    fn from(e: WorldError) -> Self {
        AppError::World(e)
    }
}

impl From<GossipError> for AppError {
    fn from(e: GossipError) -> Self {
        AppError::Gossip(e)
    }
}

impl From<CredentialError> for AppError {
    fn from(e: CredentialError) -> Self {
        AppError::Credential(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::World(WorldError::ProfileNotFound) => {
                (StatusCode::NOT_FOUND, "PROFILE_NOT_FOUND", "Profile not found".to_string())
            }
            AppError::World(WorldError::ActorNotFound) => {
                (StatusCode::NOT_FOUND, "ACTOR_NOT_FOUND", "Actor not found".to_string())
            }
            AppError::World(WorldError::RoomNotFound) => {
                (StatusCode::NOT_FOUND, "ROOM_NOT_FOUND", "Room not found".to_string())
            }
            AppError::World(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "WORLD_ERROR", e.to_string())
            }
            AppError::Gossip(GossipError::StoryNotFound) => {
                (StatusCode::NOT_FOUND, "STORY_NOT_FOUND", "Story not found".to_string())
            }
            AppError::Gossip(GossipError::ArticleNotFound) => {
                (StatusCode::NOT_FOUND, "GOSSIP_NOT_FOUND", "Gossip article not found".to_string())
            }
            AppError::Gossip(GossipError::ActorNotFound) => {
                (StatusCode::NOT_FOUND, "ACTOR_NOT_FOUND", "Actor not found".to_string())
            }
            AppError::Gossip(GossipError::NoActorsResolved) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "NO_ACTORS_RESOLVED", "No candidate actors resolved".to_string())
            }
            AppError::Gossip(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GOSSIP_ERROR", e.to_string())
            }
            AppError::Credential(e) => {
                (StatusCode::BAD_GATEWAY, "CREDENTIAL_ERROR", e.to_string())
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone())
            }
        };

        let body = json!({
            "data": null,
            "meta": {
                "request_id": "",
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
