//! Gossip endpoints: instant generation, listing, detail, fire.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use tattle_core::publisher::InstantOutcome;
use tattle_core::repository::gossip::GossipRepository;
use tattle_core::repository::interaction::InteractionRepository;
use tattle_core::repository::message::MessageRepository;
use tattle_core::repository::actor::ActorRepository;
use tattle_core::repository::story::StoryRepository;
use tattle_types::actor::ActorId;
use tattle_types::error::GossipError;
use tattle_types::gossip::{GossipId, GossipKind};
use tattle_types::interaction::{Interaction, InteractionId, InteractionKind, TargetKind};

use crate::http::error::AppError;
use crate::http::extractors::session::{MaybeSession, Session};
use crate::http::response::{request_context, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InstantGossipRequest {
    pub target_actor_id: ActorId,
    pub kind: GossipKind,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

/// POST /api/v1/gossip/generate - Operator-triggered instant gossip.
pub async fn generate_instant(
    State(state): State<AppState>,
    Session(_profile_id): Session,
    Json(body): Json<InstantGossipRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let outcome = state
        .publisher
        .instant(&body.target_actor_id, body.kind)
        .await?;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = match outcome {
        InstantOutcome::Published { story_id, article } => serde_json::json!({
            "status": "published",
            "story_id": story_id,
            "article": article,
        }),
        InstantOutcome::NoPairing => serde_json::json!({
            "status": "no_pairing",
            "message": "Not enough actors around to pair anyone up.",
        }),
    };

    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

/// GET /api/v1/gossip - List gossip articles, hottest first.
pub async fn list_gossip(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let page = state
        .gossip
        .list(query.page, query.limit.clamp(1, 50))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({
        "articles": page.articles,
        "total": page.total,
        "page": query.page,
        "limit": query.limit,
    });

    Ok(Json(
        ApiResponse::success(data, request_id, elapsed).with_link("self", "/api/v1/gossip"),
    ))
}

/// GET /api/v1/gossip/:id - Article detail with story, characters, and
/// evidence messages. Bumps the view counter.
pub async fn get_gossip(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let id: GossipId = id
        .parse()
        .map_err(|_| AppError::Gossip(GossipError::ArticleNotFound))?;

    let article = state
        .gossip
        .get_by_id(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::Gossip(GossipError::ArticleNotFound))?;

    let story = state
        .stories
        .get_by_id(&article.story_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::Gossip(GossipError::StoryNotFound))?;

    let main_actor = state
        .actors
        .get_by_id(&story.main_actor_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let other_actors = state
        .actors
        .get_by_ids(&story.other_actor_ids)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let evidence = state
        .messages
        .get_by_ids(&story.source_message_ids)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // Best effort; the read must not fail over a counter.
    if let Err(e) = state.gossip.increment_view(&id).await {
        tracing::warn!(gossip = %id, error = %e, "view bump failed");
    }

    let elapsed = start.elapsed().as_millis() as u64;
    let data = serde_json::json!({
        "article": article,
        "story": story,
        "main_actor": main_actor,
        "other_actors": other_actors,
        "evidence_messages": evidence,
    });

    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}

#[derive(Debug, Serialize)]
pub struct FireResponse {
    pub fire_count: i64,
    pub message: String,
}

/// POST /api/v1/gossip/:id/fire - Stoke the flames.
///
/// Anonymous fires are allowed or rejected per `allow_anonymous_fire`
/// config. The interaction audit row is only written for signed-in users.
pub async fn fire_gossip(
    State(state): State<AppState>,
    MaybeSession(profile_id): MaybeSession,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FireResponse>>, AppError> {
    let (request_id, start) = request_context();

    if profile_id.is_none() && !state.config.allow_anonymous_fire {
        return Err(AppError::Unauthorized(
            "Sign in to fire this gossip.".to_string(),
        ));
    }

    let id: GossipId = id
        .parse()
        .map_err(|_| AppError::Gossip(GossipError::ArticleNotFound))?;

    let article = state
        .gossip
        .get_by_id(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::Gossip(GossipError::ArticleNotFound))?;

    let fire_count = state
        .gossip
        .increment_fire(&id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // Keep the owning story's counter in step; best effort.
    if let Err(e) = state.stories.increment_fire(&article.story_id).await {
        tracing::warn!(story = %article.story_id, error = %e, "story fire bump failed");
    }

    if let Some(profile_id) = profile_id {
        let interaction = Interaction {
            id: InteractionId::new(),
            profile_id: Some(profile_id),
            kind: InteractionKind::Fire,
            target_kind: TargetKind::Gossip,
            target_id: id.0,
            created_at: Utc::now(),
        };
        if let Err(e) = state.interactions.record(&interaction).await {
            tracing::warn!(error = %e, "interaction not recorded");
        }
    }

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        FireResponse {
            fire_count,
            message: "Fire stoked! The actors are loving the attention.".to_string(),
        },
        request_id,
        elapsed,
    )))
}
