//! JWT service for token generation, validation, and revocation
//!
//! This module issues and verifies HS256 tokens. Session tokens and password
//! reset tokens share one signing key and differ by the `purpose` claim.
//! Revoked token ids are kept in a [`TokenBlacklist`], backed by Redis in
//! production.

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use common::settings::AuthConfig;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::models::User;

/// `purpose` claim carried by password reset tokens
pub const RESET_PURPOSE: &str = "password_reset";

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared signing secret
    pub secret: String,
    /// Session token expiration time in seconds (default: 24 hours)
    pub access_token_expiry: u64,
    /// Reset token expiration time in seconds (default: 10 minutes)
    pub reset_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_settings(settings: &AuthConfig) -> Self {
        JwtConfig {
            secret: settings.jwt_secret.clone(),
            access_token_expiry: settings.access_token_minutes * 60,
            reset_token_expiry: settings.reset_token_minutes * 60,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    pub user_id: i64,
    /// Only present on reset tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Token id, used for revocation
    pub jti: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

impl Claims {
    /// Seconds until the token expires, at least one
    pub fn remaining_lifetime(&self) -> u64 {
        self.exp.saturating_sub(now_secs()).max(1)
    }
}

/// Token verification failures
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, expired or malformed; never distinguished
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Invalid token purpose")]
    WrongPurpose,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Generate a session token for a user
    pub fn issue_session_token(&self, user: &User) -> Result<String> {
        self.issue(user, None, self.config.access_token_expiry)
    }

    /// Generate a password reset token for a user
    pub fn issue_reset_token(&self, user: &User) -> Result<String> {
        self.issue(
            user,
            Some(RESET_PURPOSE.to_string()),
            self.config.reset_token_expiry,
        )
    }

    fn issue(&self, user: &User, purpose: Option<String>, ttl: u64) -> Result<String> {
        let now = now_secs();
        let claims = Claims {
            sub: user.email.clone(),
            user_id: user.id,
            purpose,
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + ttl,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Validate signature and expiry and return the claims
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let token = token.trim().trim_matches(|c| c == '"' || c == '\'');
        if token.is_empty() {
            return Err(TokenError::Invalid);
        }

        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                TokenError::Invalid
            })
    }

    /// Accept only session tokens
    pub fn verify_session(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.purpose.is_some() {
            return Err(TokenError::WrongPurpose);
        }
        Ok(claims)
    }

    /// Accept only password reset tokens
    pub fn verify_reset(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if claims.purpose.as_deref() != Some(RESET_PURPOSE) {
            return Err(TokenError::WrongPurpose);
        }
        Ok(claims)
    }

    /// Get the session token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    /// Get the reset token expiry time
    pub fn reset_token_expiry(&self) -> u64 {
        self.config.reset_token_expiry
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Store of revoked token ids
#[async_trait]
pub trait TokenBlacklist: Send + Sync {
    /// Revoke `jti` for `ttl_seconds`
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> Result<()>;

    async fn is_revoked(&self, jti: &str) -> Result<bool>;
}

fn blacklist_key(jti: &str) -> String {
    format!("blacklisted_token:{}", jti)
}

#[async_trait]
impl TokenBlacklist for RedisPool {
    async fn revoke(&self, jti: &str, ttl_seconds: u64) -> Result<()> {
        self.set_expiring(&blacklist_key(jti), "1", ttl_seconds).await
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        self.exists(&blacklist_key(jti)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            secret: "test-secret-test-secret-test-secret!".to_string(),
            access_token_expiry: 3600,
            reset_token_expiry: 600,
        })
    }

    fn user() -> User {
        User {
            id: 42,
            name: "Jane".to_string(),
            email: "jane@x.com".to_string(),
            password_hash: String::new(),
            is_active: true,
            is_verified: true,
            is_admin: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_token_round_trip() {
        let jwt = service();
        let token = jwt.issue_session_token(&user()).unwrap();
        let claims = jwt.verify_session(&token).unwrap();
        assert_eq!(claims.sub, "jane@x.com");
        assert_eq!(claims.user_id, 42);
        assert!(claims.purpose.is_none());
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_reset_token_carries_purpose() {
        let jwt = service();
        let token = jwt.issue_reset_token(&user()).unwrap();
        let claims = jwt.verify_reset(&token).unwrap();
        assert_eq!(claims.purpose.as_deref(), Some(RESET_PURPOSE));
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let jwt = service();
        let session = jwt.issue_session_token(&user()).unwrap();
        let reset = jwt.issue_reset_token(&user()).unwrap();

        assert_eq!(jwt.verify_reset(&session).unwrap_err(), TokenError::WrongPurpose);
        assert_eq!(jwt.verify_session(&reset).unwrap_err(), TokenError::WrongPurpose);
    }

    #[test]
    fn test_each_token_gets_its_own_id() {
        let jwt = service();
        let a = jwt.verify_session(&jwt.issue_session_token(&user()).unwrap()).unwrap();
        let b = jwt.verify_session(&jwt.issue_session_token(&user()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let other = JwtService::new(JwtConfig {
            secret: "another-secret-another-secret-another".to_string(),
            access_token_expiry: 3600,
            reset_token_expiry: 600,
        });
        let token = other.issue_session_token(&user()).unwrap();
        assert_eq!(service().decode(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_expired_token_rejected() {
        let jwt = service();
        let now = now_secs();
        let claims = Claims {
            sub: "jane@x.com".to_string(),
            user_id: 42,
            purpose: None,
            jti: "expired".to_string(),
            iat: now - 120,
            exp: now - 1,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &jwt.encoding_key).unwrap();
        assert_eq!(jwt.decode(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn test_garbage_and_quoted_tokens() {
        let jwt = service();
        assert_eq!(jwt.decode("").unwrap_err(), TokenError::Invalid);
        assert_eq!(jwt.decode("not.a.jwt").unwrap_err(), TokenError::Invalid);

        let token = jwt.issue_session_token(&user()).unwrap();
        assert!(jwt.decode(&format!("\"{}\"", token)).is_ok());
    }
}
