//! In-memory collaborators for tests and database-free local runs

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::error::{DatabaseError, DatabaseResult};
use std::collections::HashSet;
use std::sync::Mutex;

use super::{OtpRepository, UserRepository};
use crate::email::EmailSender;
use crate::jwt::TokenBlacklist;
use crate::models::{NewOtp, NewUser, Otp, OtpPurpose, User};

#[derive(Debug, Default)]
pub struct MemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the active flag, as an admin would
    pub fn set_active(&self, email: &str, active: bool) {
        if let Ok(mut users) = self.users.lock() {
            if let Some(user) = users.iter_mut().find(|u| u.email == email) {
                user.is_active = active;
            }
        }
    }
}

fn poisoned() -> DatabaseError {
    DatabaseError::Configuration("in-memory store poisoned".to_string())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Duplicate("users_email_key".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: users.len() as i64 + 1,
            name: new_user.name.clone(),
            email: new_user.email.clone(),
            password_hash: new_user.password_hash.clone(),
            is_active: true,
            is_verified: new_user.is_verified,
            is_admin: new_user.is_admin,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> DatabaseResult<Option<User>> {
        let users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn mark_verified(&self, id: i64) -> DatabaseResult<()> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.is_verified = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> DatabaseResult<()> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryOtpRepository {
    otps: Mutex<Vec<Otp>>,
}

impl MemoryOtpRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the expiry of every OTP of the pair to `at`
    pub fn set_expiry(&self, email: &str, purpose: OtpPurpose, at: DateTime<Utc>) {
        if let Ok(mut otps) = self.otps.lock() {
            otps.iter_mut()
                .filter(|o| o.email == email && o.purpose == purpose)
                .for_each(|o| o.expires_at = at);
        }
    }

    fn latest<'a>(otps: &'a [Otp], email: &str, purpose: OtpPurpose) -> Option<&'a Otp> {
        // ids grow with insertion order
        otps.iter()
            .filter(|o| o.email == email && o.purpose == purpose)
            .max_by_key(|o| o.id)
    }
}

#[async_trait]
impl OtpRepository for MemoryOtpRepository {
    async fn insert(&self, otp: &NewOtp) -> DatabaseResult<Otp> {
        let mut otps = self.otps.lock().map_err(|_| poisoned())?;
        otps.iter_mut()
            .filter(|o| o.email == otp.email && o.purpose == otp.purpose)
            .for_each(|o| o.is_used = true);
        let stored = Otp {
            id: otps.len() as i64 + 1,
            email: otp.email.clone(),
            code: otp.code.clone(),
            purpose: otp.purpose,
            is_used: false,
            expires_at: otp.expires_at,
            created_at: Utc::now(),
        };
        otps.push(stored.clone());
        Ok(stored)
    }

    async fn latest_unused(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> DatabaseResult<Option<Otp>> {
        let otps = self.otps.lock().map_err(|_| poisoned())?;
        Ok(otps
            .iter()
            .filter(|o| o.email == email && o.purpose == purpose && !o.is_used)
            .max_by_key(|o| o.id)
            .cloned())
    }

    async fn latest_is_used(&self, email: &str, purpose: OtpPurpose) -> DatabaseResult<bool> {
        let otps = self.otps.lock().map_err(|_| poisoned())?;
        Ok(Self::latest(&otps, email, purpose).is_some_and(|o| o.is_used))
    }

    async fn consume(&self, id: i64) -> DatabaseResult<bool> {
        let mut otps = self.otps.lock().map_err(|_| poisoned())?;
        match otps.iter_mut().find(|o| o.id == id && !o.is_used) {
            Some(otp) => {
                otp.is_used = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Blacklist that never expires entries
#[derive(Debug, Default)]
pub struct MemoryBlacklist {
    revoked: Mutex<HashSet<String>>,
}

impl MemoryBlacklist {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenBlacklist for MemoryBlacklist {
    async fn revoke(&self, jti: &str, _ttl_seconds: u64) -> Result<()> {
        self.revoked
            .lock()
            .map_err(|_| anyhow::anyhow!("blacklist poisoned"))?
            .insert(jti.to_string());
        Ok(())
    }

    async fn is_revoked(&self, jti: &str) -> Result<bool> {
        Ok(self
            .revoked
            .lock()
            .map_err(|_| anyhow::anyhow!("blacklist poisoned"))?
            .contains(jti))
    }
}

/// A sent OTP email
#[derive(Debug, Clone, PartialEq)]
pub struct SentOtp {
    pub to: String,
    pub code: String,
    pub purpose: OtpPurpose,
}

/// Email sender that keeps every message
#[derive(Debug, Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentOtp>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose deliveries all fail
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentOtp> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Code of the latest email sent to `to` for `purpose`
    pub fn last_code(&self, to: &str, purpose: OtpPurpose) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|s| s.to == to && s.purpose == purpose)
            .map(|s| s.code)
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_otp(&self, to: &str, code: &str, purpose: OtpPurpose) -> bool {
        if self.fail {
            return false;
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(SentOtp {
                to: to.to_string(),
                code: code.to_string(),
                purpose,
            });
        }
        true
    }
}
