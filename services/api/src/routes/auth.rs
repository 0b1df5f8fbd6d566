//! `/api/auth` routes

use auth::models::{
    AuthUser, ForgotPasswordOtpRequest, ForgotPasswordRequest, LoginRequest, OtpVerifyRequest,
    RegisterRequest, ResetPasswordRequest,
};
use axum::{
    Extension, Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;

use crate::{error::ApiError, middleware::require_auth, state::AppState};

/// Header that may carry the reset token instead of the body
pub const RESET_TOKEN_HEADER: &str = "x-reset-token";

pub fn router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state, require_auth));

    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/forgot-password/verify-otp", post(verify_forgot_password_otp))
        .route("/reset-password", post(reset_password))
        .route("/reset-password-simple", post(reset_password))
        .merge(protected)
}

pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<RegisterRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<OtpVerifyRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.verify_otp(request).await?))
}

/// `verify-otp` with the purpose fixed to `forgot_password`
pub async fn verify_forgot_password_otp(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ForgotPasswordOtpRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.verify_otp(request.into()).await?))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.login(request).await?))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<ForgotPasswordRequest>, ApiError>,
) -> impl IntoResponse {
    Json(state.auth.forgot_password(request).await)
}

pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    WithRejection(Json(request), _): WithRejection<Json<ResetPasswordRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let header_token = headers
        .get(RESET_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok());

    Ok(Json(state.auth.reset_password(request, header_token).await?))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.current_user(&user).await?))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.auth.logout(&user).await?))
}
