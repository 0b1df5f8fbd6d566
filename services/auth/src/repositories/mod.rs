//! Storage seams of the authentication flows

use async_trait::async_trait;
use common::error::DatabaseResult;

use crate::models::{NewOtp, NewUser, Otp, OtpPurpose, User};

#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod otp;
pub mod user;

pub use otp::PgOtpRepository;
pub use user::PgUserRepository;

/// User accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. A taken email yields `DatabaseError::Duplicate`.
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User>;

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>>;

    async fn mark_verified(&self, id: i64) -> DatabaseResult<()>;

    async fn update_password(&self, id: i64, password_hash: &str) -> DatabaseResult<()>;
}

/// OTP ledger
#[async_trait]
pub trait OtpRepository: Send + Sync {
    /// Insert an OTP, retiring every unused one of the same pair
    async fn insert(&self, otp: &NewOtp) -> DatabaseResult<Otp>;

    /// Most recently created unused OTP for the pair
    async fn latest_unused(&self, email: &str, purpose: OtpPurpose)
    -> DatabaseResult<Option<Otp>>;

    /// Whether the most recently created OTP for the pair is used
    async fn latest_is_used(&self, email: &str, purpose: OtpPurpose) -> DatabaseResult<bool>;

    /// Mark an OTP used. Returns false when it already was.
    async fn consume(&self, id: i64) -> DatabaseResult<bool>;
}
