//! Trending tags endpoint (pure read).

use axum::extract::State;
use axum::Json;

use tattle_core::repository::trend::TrendRepository;
use tattle_types::trend::TrendTag;

use crate::http::error::AppError;
use crate::http::response::{request_context, ApiResponse};
use crate::state::AppState;

/// GET /api/v1/trends - Top 10 trend tags by count.
pub async fn list_trends(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TrendTag>>>, AppError> {
    let (request_id, start) = request_context();

    let trends = state
        .trends
        .top(10)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(trends, request_id, elapsed).with_link("self", "/api/v1/trends"),
    ))
}
