//! Error kinds produced by the authentication flows

use common::error::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Missing, invalid or expired credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Valid identity in a state that forbids the action
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    /// Duplicate registration
    #[error("{0}")]
    Conflict(String),

    #[error("Too many attempts. Please try again later.")]
    TooManyAttempts,

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AuthError::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AuthError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AuthError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AuthError::BadRequest(msg.into())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
