//! `/api/admin` routes

use auth::models::{AuthUser, LoginRequest};
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use axum_extra::extract::WithRejection;
use tracing::info;

use crate::{
    error::ApiError,
    middleware::{require_admin, require_auth},
    models::{
        Pagination,
        admin::{
            AdminPdfList, AdminUserList, AdminVideoList, DocumentFilter, UserActivationResponse,
            UserFilter, VideoDeleteResponse, search_pattern,
        },
        pdf::PdfDeleteResponse,
    },
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/users", get(list_users))
        .route("/users/:id/activate", put(toggle_user_active))
        .route("/videos", get(list_videos))
        .route("/videos/:id", delete(delete_video))
        .route("/pdfs", get(list_pdfs))
        .route("/pdfs/:id", delete(delete_pdf))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/login", post(admin_login))
        .merge(protected)
}

fn page(skip: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    Pagination { skip, limit }.resolve(50)
}

pub async fn admin_login(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.admin_login(request).await?))
}

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.admin.dashboard_stats().await?))
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (skip, limit) = page(filter.skip, filter.limit);
    let pattern = search_pattern(filter.search.as_deref());
    let (users, total) = state
        .admin
        .list_users(
            pattern.as_deref(),
            filter.is_active,
            filter.is_verified,
            skip,
            limit,
        )
        .await?;

    Ok(Json(AdminUserList {
        users,
        total,
        skip,
        limit,
    }))
}

/// Activate an inactive user or deactivate an active one
pub async fn toggle_user_active(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if state.auth.users().find_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    if user_id == admin.id {
        return Err(ApiError::bad_request("Cannot deactivate your own account"));
    }

    let is_active = state
        .admin
        .toggle_active(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    info!("Admin {} set user {} active={}", admin.id, user_id, is_active);

    Ok(Json(UserActivationResponse {
        message: format!(
            "User {} successfully",
            if is_active { "activated" } else { "deactivated" }
        ),
        user_id,
        is_active,
    }))
}

pub async fn list_videos(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (skip, limit) = page(filter.skip, filter.limit);
    let pattern = search_pattern(filter.search.as_deref());
    let (videos, total) = state
        .admin
        .list_videos(pattern.as_deref(), filter.user_id, skip, limit)
        .await?;

    Ok(Json(AdminVideoList {
        videos,
        total,
        skip,
        limit,
    }))
}

pub async fn delete_video(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.admin.delete_video(id).await? {
        return Err(ApiError::not_found("Video not found"));
    }
    info!("Admin {} deleted video {}", admin.id, id);

    Ok(Json(VideoDeleteResponse {
        message: "Video deleted successfully".to_string(),
        video_id: id,
    }))
}

pub async fn list_pdfs(
    State(state): State<AppState>,
    Query(filter): Query<DocumentFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let (skip, limit) = page(filter.skip, filter.limit);
    let pattern = search_pattern(filter.search.as_deref());
    let (pdfs, total) = state
        .admin
        .list_pdfs(pattern.as_deref(), filter.user_id, skip, limit)
        .await?;

    Ok(Json(AdminPdfList {
        pdfs,
        total,
        skip,
        limit,
    }))
}

/// Delete any user's PDF along with its stored file
pub async fn delete_pdf(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state
        .pdfs
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("PDF not found"))?;
    state.uploads.remove(&path).await;
    info!("Admin {} deleted PDF {}", admin.id, id);

    Ok(Json(PdfDeleteResponse {
        message: "PDF deleted successfully".to_string(),
        pdf_id: id,
    }))
}
