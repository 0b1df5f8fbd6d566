//! Error type for the HTTP surface
//!
//! Every handler returns [`ApiResult`]; domain errors are converted with `From`
//! and rendered once, here, as `{"error": "<message>"}`.

use auth::AuthError;
use axum::{
    Json,
    extract::{multipart::MultipartError, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use notes::NotesError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooManyRequests(String),

    /// Request body could not be decoded
    #[error("{0}")]
    UnprocessableEntity(String),

    /// A downstream step failed in a way the client should hear about
    #[error("{0}")]
    ProcessingFailed(String),

    #[error("{0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Detailed message of an internal error, attached to the response so the
/// debug layer can surface it
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::ProcessingFailed(_) | ApiError::Internal(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the message is replaced by a generic one
    fn is_masked(&self) -> bool {
        matches!(self, ApiError::Internal(_) | ApiError::Database(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_masked() {
            let detail = self.to_string();
            error!("Request failed: {}", detail);

            let mut response =
                (status, Json(json!({ "error": INTERNAL_ERROR_MESSAGE }))).into_response();
            response.extensions_mut().insert(ErrorDetail(detail));
            return response;
        }

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized(msg) => ApiError::Unauthorized(msg),
            AuthError::Forbidden(msg) => ApiError::Forbidden(msg),
            AuthError::NotFound(msg) => ApiError::NotFound(msg),
            AuthError::BadRequest(msg) => ApiError::BadRequest(msg),
            AuthError::Conflict(msg) => ApiError::Conflict(msg),
            AuthError::TooManyAttempts => {
                ApiError::TooManyRequests(AuthError::TooManyAttempts.to_string())
            }
            AuthError::Database(e) => ApiError::Database(e),
            AuthError::Internal(e) => ApiError::Internal(format!("{:#}", e)),
        }
    }
}

impl From<NotesError> for ApiError {
    fn from(err: NotesError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::UnprocessableEntity(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::BadRequest(err.body_text())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(format!("I/O error: {}", err))
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_keep_message() {
        let response = ApiError::bad_request("Passwords do not match").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.extensions().get::<ErrorDetail>().is_none());
        assert_eq!(
            body_json(response).await,
            json!({"error": "Passwords do not match"})
        );
    }

    #[tokio::test]
    async fn test_internal_errors_are_generic() {
        let response = ApiError::internal("gemini timed out").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<ErrorDetail>().map(|d| d.0.as_str()),
            Some("gemini timed out")
        );
        assert_eq!(
            body_json(response).await,
            json!({"error": INTERNAL_ERROR_MESSAGE})
        );
    }

    #[tokio::test]
    async fn test_processing_failures_are_shown() {
        let response =
            ApiError::ProcessingFailed("Failed to extract text from PDF".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Failed to extract text from PDF"})
        );
    }

    #[test]
    fn test_auth_error_mapping() {
        assert_eq!(
            ApiError::from(AuthError::Conflict("Email already registered".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AuthError::TooManyAttempts).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::from(AuthError::forbidden("User account is inactive")).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(AuthError::Internal(anyhow::anyhow!("smtp down"))).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
