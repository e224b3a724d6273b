//! OAuth sign-in endpoints.
//!
//! The callback exchanges the authorization code, upserts the profile from
//! the provider's user info, stores the credential pair, ensures the
//! profile's actor exists, and establishes the session cookie.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::AppendHeaders;
use axum::Json;
use chrono::{Duration, Utc};
use serde::Deserialize;

use tattle_core::repository::profile::ProfileRepository;
use tattle_types::credential::Credential;
use tattle_types::error::WorldError;
use tattle_types::profile::{Profile, ProfileId};

use crate::http::error::AppError;
use crate::http::extractors::session::{clear_session_cookie, session_cookie, Session};
use crate::http::response::{request_context, ApiResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AuthUrlQuery {
    pub redirect_uri: String,
}

/// GET /api/v1/auth/url - Authorization URL for the login redirect.
pub async fn auth_url(
    State(state): State<AppState>,
    Query(query): Query<AuthUrlQuery>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let (request_id, start) = request_context();

    let oauth_state = uuid::Uuid::now_v7().to_string();
    let url = state.oauth.auth_url(&query.redirect_uri, &oauth_state);

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        serde_json::json!({ "url": url, "state": oauth_state }),
        request_id,
        elapsed,
    )))
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: String,
    pub redirect_uri: String,
}

/// GET /api/v1/auth/callback - Code exchange and session establishment.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<
    (
        AppendHeaders<[(axum::http::HeaderName, String); 1]>,
        Json<ApiResponse<Profile>>,
    ),
    AppError,
> {
    let (request_id, start) = request_context();

    let token = state
        .oauth
        .exchange_code(&query.code, &query.redirect_uri)
        .await?;

    let remote = state.oauth.user_info(&token.access_token).await?;

    // Upsert the profile by the provider's stable id.
    let now = Utc::now();
    let profile = match state
        .profiles
        .get_by_external_id(&remote.external_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
    {
        Some(mut existing) => {
            existing.name = remote.name;
            existing.email = remote.email;
            existing.avatar_url = remote.avatar_url;
            existing.bio = remote.bio.or(existing.bio);
            existing.updated_at = now;
            state
                .profiles
                .update(&existing)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?
        }
        None => {
            let fresh = Profile {
                id: ProfileId::new(),
                external_id: Some(remote.external_id),
                name: remote.name,
                email: remote.email,
                avatar_url: remote.avatar_url,
                bio: remote.bio,
                interests: Vec::new(),
                personality: None,
                created_at: now,
                updated_at: now,
            };
            state
                .profiles
                .create(&fresh)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?
        }
    };

    let credential = Credential {
        access_token: token.access_token,
        refresh_token: Some(token.refresh_token),
        expires_at: Some(now + Duration::seconds(token.expires_in_secs)),
    };
    state
        .profiles
        .save_credential(&profile.id, &credential)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    // The actor is what actually lives in the world; make sure it exists.
    if let Err(e) = state.actor_service.ensure_actor(&profile.id).await {
        tracing::warn!(profile = %profile.id, error = %e, "actor creation deferred");
    }

    let elapsed = start.elapsed().as_millis() as u64;
    let cookie = session_cookie(&profile.id);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(ApiResponse::success(profile, request_id, elapsed)),
    ))
}

/// GET /api/v1/auth/me - The signed-in profile.
pub async fn me(
    State(state): State<AppState>,
    Session(profile_id): Session,
) -> Result<Json<ApiResponse<Profile>>, AppError> {
    let (request_id, start) = request_context();

    let profile = state
        .profiles
        .get_by_id(&profile_id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or(AppError::World(WorldError::ProfileNotFound))?;

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(profile, request_id, elapsed)))
}

/// POST /api/v1/auth/logout - Drop the session cookie.
pub async fn logout() -> (
    AppendHeaders<[(axum::http::HeaderName, String); 1]>,
    Json<ApiResponse<serde_json::Value>>,
) {
    let (request_id, start) = request_context();
    let elapsed = start.elapsed().as_millis() as u64;

    (
        AppendHeaders([(SET_COOKIE, clear_session_cookie())]),
        Json(ApiResponse::success(
            serde_json::json!({ "signed_out": true }),
            request_id,
            elapsed,
        )),
    )
}
