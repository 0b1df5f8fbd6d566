//! HTTP routes

use axum::{Json, Router, middleware, response::IntoResponse, routing::get};
use notes::{Notes, chat_context};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::{
    middleware::expose_error_details,
    models::chat::{CHAT_FALLBACK_RESPONSE, ChatTarget},
    state::AppState,
};

pub mod admin;
pub mod auth;
pub mod pdf;
pub mod video;

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let debug = state.config.debug;

    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/video", video::router(state.clone()))
        .nest("/api/pdf", pdf::router(state.clone()))
        .nest("/api/admin", admin::router(state.clone()))
        .with_state(state);

    let router = if debug {
        router.layer(middleware::from_fn(expose_error_details))
    } else {
        router
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to TubeMind AI API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}

/// Ask the note generator about a document, falling back to an apology
pub(crate) async fn answer_question(
    state: &AppState,
    target: ChatTarget,
    title: &str,
    notes: &Notes,
    question: &str,
) -> String {
    let context = chat_context(
        target.kind(),
        title,
        &notes.summary,
        &notes.key_points,
        &notes.bullet_notes,
    );

    match state.notes.generator.answer(question, &context).await {
        Some(answer) if !answer.trim().is_empty() => answer,
        _ => {
            warn!("No chat answer generated for {} '{}'", target.kind(), title);
            CHAT_FALLBACK_RESPONSE.to_string()
        }
    }
}
