//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // World orchestration
        .route("/world/rounds", post(handlers::world::generate_round))
        // Gossip
        .route("/gossip/generate", post(handlers::gossip::generate_instant))
        .route("/gossip", get(handlers::gossip::list_gossip))
        .route("/gossip/{id}", get(handlers::gossip::get_gossip))
        .route("/gossip/{id}/fire", post(handlers::gossip::fire_gossip))
        // Stories and trends (pure reads)
        .route("/stories", get(handlers::story::list_stories))
        .route("/trends", get(handlers::trend::list_trends))
        // Rooms
        .route("/rooms", get(handlers::room::list_rooms))
        .route("/rooms/{id}/messages", get(handlers::room::room_messages))
        // Auth / session
        .route("/auth/url", get(handlers::auth::auth_url))
        .route("/auth/callback", get(handlers::auth::callback))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
