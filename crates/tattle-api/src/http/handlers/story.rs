//! Story list endpoint (pure read).

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use tattle_core::repository::story::{StoryFilter, StoryRepository};
use tattle_types::story::StoryCategory;

use crate::http::error::AppError;
use crate::http::response::{request_context, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StoryListQuery {
    pub limit: Option<i64>,
    pub category: Option<String>,
}

/// GET /api/v1/stories - Published stories, hottest first.
pub async fn list_stories(
    State(state): State<AppState>,
    Query(query): Query<StoryListQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let category = query
        .category
        .as_deref()
        .map(|c| c.parse::<StoryCategory>())
        .transpose()
        .map_err(AppError::Validation)?;

    let stories = state
        .stories
        .list_published(StoryFilter {
            category,
            limit: Some(query.limit.unwrap_or(20).clamp(1, 100)),
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({
        "stories": stories,
        "total": stories.len(),
    });

    Ok(Json(
        ApiResponse::success(data, request_id, elapsed).with_link("self", "/api/v1/stories"),
    ))
}
