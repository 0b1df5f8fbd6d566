//! Authentication middleware and response layers

use auth::models::AuthUser;
use axum::{
    Extension, Json,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde_json::json;

use crate::{
    error::{ApiError, ErrorDetail},
    state::AppState,
};

/// Resolve the bearer token and attach the [`AuthUser`] to the request
pub async fn require_auth(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) =
        bearer.ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))?;

    let user = state.auth.authenticate(bearer.token()).await?;
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Reject authenticated users without the admin flag.
///
/// Must run after [`require_auth`].
pub async fn require_admin(
    Extension(user): Extension<AuthUser>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    if !user.is_admin {
        return Err(ApiError::Forbidden("Admin access required".to_string()));
    }
    Ok(next.run(req).await)
}

/// Replace generic internal error bodies with their detail.
///
/// Only installed when `debug` is set.
pub async fn expose_error_details(req: Request<Body>, next: Next) -> Response {
    let response = next.run(req).await;
    match response.extensions().get::<ErrorDetail>().cloned() {
        Some(ErrorDetail(detail)) => {
            (response.status(), Json(json!({ "error": detail }))).into_response()
        }
        None => response,
    }
}
