//! Room endpoints (pure reads).

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use tattle_core::repository::message::MessageRepository;
use tattle_core::repository::room::RoomRepository;
use tattle_types::error::WorldError;
use tattle_types::room::RoomId;

use crate::http::error::AppError;
use crate::http::response::{request_context, ApiResponse};
use crate::state::AppState;

/// GET /api/v1/rooms - All chat rooms.
pub async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let rooms = state
        .rooms
        .list()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "rooms": rooms }),
        request_id,
        elapsed,
    )))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/rooms/:id/messages - Recent messages, oldest first.
pub async fn room_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let room_id: RoomId = id
        .parse()
        .map_err(|_| AppError::World(WorldError::RoomNotFound))?;

    let room = state
        .rooms
        .get_by_id(&room_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::World(WorldError::RoomNotFound))?;

    let messages = state
        .messages
        .recent_in_room(&room_id, query.limit.unwrap_or(50).clamp(1, 200))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({
            "room": room,
            "messages": messages,
        }),
        request_id,
        elapsed,
    )))
}
