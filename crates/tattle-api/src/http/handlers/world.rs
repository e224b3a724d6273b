//! World orchestration handler: trigger a chat round and publish what it
//! produced.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use tattle_core::publisher;
use tattle_types::room::RoomId;
use tattle_types::story::StoryId;

use crate::http::error::AppError;
use crate::http::extractors::session::MaybeSession;
use crate::http::response::{request_context, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateRoundRequest {
    pub room_id: RoomId,
    pub topic: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateRoundResponse {
    pub messages_created: usize,
    pub stories_created: usize,
    pub story_ids: Vec<StoryId>,
}

/// POST /api/v1/world/rounds - Generate one round of dialogue, mine the
/// room for stories, and publish the high-confidence candidates.
///
/// Always returns a success-shaped report of how much work actually
/// happened; degraded sub-steps (skipped speakers, failed publishes) show
/// up as smaller counts, never as a request failure.
pub async fn generate_round(
    State(state): State<AppState>,
    MaybeSession(profile_id): MaybeSession,
    Json(body): Json<GenerateRoundRequest>,
) -> Result<Json<ApiResponse<GenerateRoundResponse>>, AppError> {
    let (request_id, start) = request_context();

    // Make sure the caller's actor exists before the round so it can be
    // force-included as the priority speaker. Best effort: a failure here
    // must not block the round.
    if let Some(profile_id) = &profile_id {
        if let Err(e) = state.actor_service.ensure_actor(profile_id).await {
            tracing::warn!(profile = %profile_id, error = %e, "could not ensure actor");
        }
    }

    let report = state
        .round_engine
        .run(&body.room_id, body.topic.as_deref(), profile_id.as_ref())
        .await?;

    let candidates = state.miner.mine(&body.room_id).await?;

    let mut story_ids = Vec::new();
    for candidate in candidates.iter().filter(|c| publisher::should_publish(c)) {
        match state.publisher.publish(candidate).await {
            Ok(story_id) => story_ids.push(story_id),
            Err(e) => {
                tracing::error!(error = %e, "publishing mined candidate failed");
            }
        }
    }

    let elapsed = start.elapsed().as_millis() as u64;
    let response = GenerateRoundResponse {
        messages_created: report.messages_created(),
        stories_created: story_ids.len(),
        story_ids,
    };

    Ok(Json(
        ApiResponse::success(response, request_id, elapsed)
            .with_link("room", &format!("/api/v1/rooms/{}/messages", body.room_id)),
    ))
}
