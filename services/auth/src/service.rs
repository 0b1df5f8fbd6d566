//! Account lifecycle: registration, OTP verification, login, password reset
//! and session checks.

use chrono::Utc;
use common::error::DatabaseError;
use common::settings::AuthConfig;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::email::EmailSender;
use crate::error::{AuthError, AuthResult};
use crate::jwt::{JwtConfig, JwtService, TokenBlacklist, TokenError};
use crate::models::{
    AuthUser, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse, NewOtp,
    NewUser, OtpPurpose, OtpVerifyRequest, OtpVerifyResponse, RegisterRequest, RegisterResponse,
    ResetPasswordRequest, User, UserProfile,
};
use crate::otp::{codes_match, compute_expiry, generate_otp, normalize_code};
use crate::password::{hash_password, verify_password};
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::repositories::{OtpRepository, UserRepository};
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};

pub const FORGOT_PASSWORD_ACK: &str = "If the email exists, an OTP has been sent";
const INVALID_CREDENTIALS: &str = "Incorrect email or password";
const INVALID_SESSION: &str = "Could not validate credentials";
const OTP_ALREADY_USED: &str = "OTP code has already been used. Please request a new OTP.";

/// Storage and delivery collaborators of [`AuthService`]
pub struct AuthStores {
    pub users: Arc<dyn UserRepository>,
    pub otps: Arc<dyn OtpRepository>,
    pub blacklist: Arc<dyn TokenBlacklist>,
    pub email: Arc<dyn EmailSender>,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    otps: Arc<dyn OtpRepository>,
    blacklist: Arc<dyn TokenBlacklist>,
    email: Arc<dyn EmailSender>,
    jwt: JwtService,
    limiter: RateLimiter,
    otp_length: usize,
    otp_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(settings: &AuthConfig, stores: AuthStores) -> Self {
        Self {
            users: stores.users,
            otps: stores.otps,
            blacklist: stores.blacklist,
            email: stores.email,
            jwt: JwtService::new(JwtConfig::from_settings(settings)),
            limiter: RateLimiter::new(RateLimiterConfig::from_settings(settings)),
            otp_length: settings.otp_length,
            otp_ttl_minutes: settings.otp_ttl_minutes,
        }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    /// Create an unverified account and mail it a signup OTP
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<RegisterResponse> {
        let email = normalize_email(&request.email);
        let name = request.name.trim().to_string();
        validate_name(&name).map_err(AuthError::BadRequest)?;
        validate_email(&email).map_err(AuthError::BadRequest)?;
        validate_password(&request.password).map_err(AuthError::BadRequest)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(email_taken());
        }

        let new_user = NewUser {
            name,
            email: email.clone(),
            password_hash: hash_password(&request.password)?,
            is_verified: false,
            is_admin: false,
        };
        let user = self.users.create(&new_user).await.map_err(|e| match e {
            DatabaseError::Duplicate(_) => email_taken(),
            other => AuthError::Database(other),
        })?;
        info!("Registered user {} ({})", user.id, user.email);

        self.issue_otp(&email, OtpPurpose::Signup).await?;

        Ok(RegisterResponse {
            message: "Registration successful. Please check your email for OTP verification code."
                .to_string(),
            email,
        })
    }

    /// Store a fresh OTP and mail it. Delivery failures are only logged.
    async fn issue_otp(&self, email: &str, purpose: OtpPurpose) -> AuthResult<()> {
        let code = generate_otp(self.otp_length);
        self.otps
            .insert(&NewOtp {
                email: email.to_string(),
                code: code.clone(),
                purpose,
                expires_at: compute_expiry(Utc::now(), self.otp_ttl_minutes),
            })
            .await?;

        if !self.email.send_otp(email, &code, purpose).await {
            warn!("Failed to send {} OTP email to {}", purpose, email);
        }
        Ok(())
    }

    /// Check a submitted OTP and act on its purpose
    pub async fn verify_otp(&self, request: OtpVerifyRequest) -> AuthResult<OtpVerifyResponse> {
        let email = normalize_email(&request.email);
        let purpose = request.purpose;
        let code = normalize_code(&request.otp_code)
            .ok_or_else(|| AuthError::bad_request("OTP code must be 4 to 6 digits"))?;

        let limiter_key = format!("otp:{}:{}", purpose, email);
        if !self.limiter.check(&limiter_key).await {
            return Err(AuthError::TooManyAttempts);
        }

        let Some(otp) = self.otps.latest_unused(&email, purpose).await? else {
            if self.otps.latest_is_used(&email, purpose).await? {
                return Err(AuthError::bad_request(OTP_ALREADY_USED));
            }
            return Err(AuthError::bad_request(
                "No OTP found for this email. Please request a new OTP.",
            ));
        };

        if otp.is_expired_at(Utc::now()) {
            return Err(AuthError::bad_request(
                "OTP code has expired. Please request a new OTP.",
            ));
        }

        if !codes_match(&code, &otp.code) {
            self.limiter.record_failure(&limiter_key).await;
            return Err(AuthError::bad_request(
                "Invalid OTP code. Please check and try again.",
            ));
        }

        if !self.otps.consume(otp.id).await? {
            return Err(AuthError::bad_request(OTP_ALREADY_USED));
        }
        self.limiter.reset(&limiter_key).await;

        match purpose {
            OtpPurpose::Signup => {
                let user = self.users.find_by_email(&email).await?.ok_or_else(|| {
                    AuthError::not_found("User not found. Please register first.")
                })?;
                if user.is_verified {
                    return Err(AuthError::bad_request(
                        "Email is already verified. You can login directly.",
                    ));
                }

                self.users.mark_verified(user.id).await?;
                info!("Verified email for user {}", user.id);

                Ok(OtpVerifyResponse {
                    message: "Email verified successfully. You are now logged in.".to_string(),
                    verified: true,
                    token: Some(self.jwt.issue_session_token(&user)?),
                    reset_token: None,
                })
            }
            OtpPurpose::ForgotPassword => {
                let user = self
                    .users
                    .find_by_email(&email)
                    .await?
                    .ok_or_else(|| AuthError::not_found("User not found"))?;

                Ok(OtpVerifyResponse {
                    message: "OTP verified successfully. You can now reset your password."
                        .to_string(),
                    verified: true,
                    token: None,
                    reset_token: Some(self.jwt.issue_reset_token(&user)?),
                })
            }
        }
    }

    /// Check credentials under the failed-attempt limiter for `limiter_key`
    async fn check_credentials(
        &self,
        limiter_key: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<User> {
        if !self.limiter.check(limiter_key).await {
            return Err(AuthError::TooManyAttempts);
        }

        let user = match self.users.find_by_email(email).await? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                self.limiter.record_failure(limiter_key).await;
                return Err(AuthError::unauthorized(INVALID_CREDENTIALS));
            }
        };

        self.limiter.reset(limiter_key).await;
        Ok(user)
    }

    /// Exchange credentials for a session token
    pub async fn login(&self, request: LoginRequest) -> AuthResult<LoginResponse> {
        let email = normalize_email(&request.email);
        let user = self
            .check_credentials(&format!("login:{}", email), &email, &request.password)
            .await?;

        if !user.is_active {
            return Err(AuthError::forbidden("User account is inactive"));
        }
        if !user.is_verified {
            return Err(AuthError::forbidden(
                "Please verify your email first. Check your email for OTP code.",
            ));
        }

        info!("User {} logged in", user.id);
        self.login_response(&user, None)
    }

    /// Login restricted to admin accounts
    pub async fn admin_login(&self, request: LoginRequest) -> AuthResult<LoginResponse> {
        let email = normalize_email(&request.email);
        let user = self
            .check_credentials(&format!("admin-login:{}", email), &email, &request.password)
            .await?;

        if !user.is_admin {
            return Err(AuthError::forbidden(
                "Admin access required. This account is not an admin.",
            ));
        }
        if !user.is_active {
            return Err(AuthError::forbidden("Admin account is inactive"));
        }

        info!("Admin {} logged in", user.id);
        self.login_response(&user, Some(true))
    }

    fn login_response(&self, user: &User, is_admin: Option<bool>) -> AuthResult<LoginResponse> {
        Ok(LoginResponse {
            access_token: self.jwt.issue_session_token(user)?,
            token_type: "bearer".to_string(),
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            is_admin,
        })
    }

    /// Mail a password reset OTP when the account exists. Always acknowledges.
    pub async fn forgot_password(&self, request: ForgotPasswordRequest) -> MessageResponse {
        let email = normalize_email(&request.email);

        match self.users.find_by_email(&email).await {
            Ok(Some(_)) => {
                if let Err(e) = self.issue_otp(&email, OtpPurpose::ForgotPassword).await {
                    error!("Failed to issue password reset OTP for {}: {}", email, e);
                }
            }
            Ok(None) => info!("Password reset requested for unknown email"),
            Err(e) => error!("Failed to look up user for password reset: {}", e),
        }

        MessageResponse::new(FORGOT_PASSWORD_ACK)
    }

    /// Replace a password using a single-use reset token.
    ///
    /// `header_token` takes precedence over the token in the body.
    pub async fn reset_password(
        &self,
        request: ResetPasswordRequest,
        header_token: Option<&str>,
    ) -> AuthResult<MessageResponse> {
        if request.new_password != request.confirm_password {
            return Err(AuthError::bad_request("Passwords do not match"));
        }
        validate_password(&request.new_password).map_err(AuthError::BadRequest)?;

        let token = header_token
            .or(request.reset_token.as_deref())
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AuthError::unauthorized("Reset token is required. Please verify OTP first.")
            })?;

        let claims = self.jwt.verify_reset(token).map_err(|e| match e {
            TokenError::Invalid => AuthError::unauthorized("Invalid or expired reset token"),
            TokenError::WrongPurpose => AuthError::unauthorized("Invalid token purpose"),
        })?;

        if self.blacklist.is_revoked(&claims.jti).await? {
            return Err(AuthError::unauthorized("Invalid or expired reset token"));
        }

        let email = normalize_email(&request.email);
        if claims.sub != email {
            return Err(AuthError::bad_request("Email does not match reset token"));
        }

        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::not_found("User not found"))?;

        self.users
            .update_password(user.id, &hash_password(&request.new_password)?)
            .await?;
        self.blacklist
            .revoke(&claims.jti, claims.remaining_lifetime())
            .await?;
        info!("Password reset for user {}", user.id);

        Ok(MessageResponse::new(
            "Password reset successfully. You can now login with your new password.",
        ))
    }

    /// Resolve a bearer session token to the active user it belongs to
    pub async fn authenticate(&self, token: &str) -> AuthResult<AuthUser> {
        let claims = self
            .jwt
            .verify_session(token)
            .map_err(|_| AuthError::unauthorized(INVALID_SESSION))?;

        if self.blacklist.is_revoked(&claims.jti).await? {
            return Err(AuthError::unauthorized(INVALID_SESSION));
        }

        let user = self
            .users
            .find_by_email(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::unauthorized(INVALID_SESSION))?;

        if !user.is_active {
            return Err(AuthError::forbidden("User account is inactive"));
        }

        Ok(AuthUser {
            id: user.id,
            email: user.email,
            name: user.name,
            is_admin: user.is_admin,
            jti: claims.jti,
            token_exp: claims.exp,
        })
    }

    /// Revoke the session token behind `auth`
    pub async fn logout(&self, auth: &AuthUser) -> AuthResult<MessageResponse> {
        let ttl = auth
            .token_exp
            .saturating_sub(Utc::now().timestamp().max(0) as u64)
            .max(1);
        self.blacklist.revoke(&auth.jti, ttl).await?;
        info!("User {} logged out", auth.id);

        Ok(MessageResponse::new("Successfully logged out"))
    }

    pub async fn current_user(&self, auth: &AuthUser) -> AuthResult<UserProfile> {
        let user = self
            .users
            .find_by_id(auth.id)
            .await?
            .ok_or_else(|| AuthError::not_found("User not found"))?;
        Ok(user.into())
    }

    /// Create a verified admin account unless the email is taken.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_admin_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> AuthResult<bool> {
        let email = normalize_email(email);
        validate_email(&email).map_err(AuthError::BadRequest)?;
        validate_password(password).map_err(AuthError::BadRequest)?;

        if let Some(existing) = self.users.find_by_email(&email).await? {
            if !existing.is_admin {
                warn!("Bootstrap admin email {} belongs to a non-admin account", email);
            }
            return Ok(false);
        }

        let admin = self
            .users
            .create(&NewUser {
                name: name.to_string(),
                email,
                password_hash: hash_password(password)?,
                is_verified: true,
                is_admin: true,
            })
            .await?;
        info!("Created admin account {}", admin.id);
        Ok(true)
    }
}

fn email_taken() -> AuthError {
    AuthError::Conflict("Email already registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::memory::{
        MemoryBlacklist, MemoryOtpRepository, MemoryUserRepository, RecordingEmailSender,
    };

    fn settings() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret-unit-test-secret-unit".to_string(),
            max_attempts: 3,
            ..AuthConfig::default()
        }
    }

    fn service(mailer: Arc<RecordingEmailSender>) -> AuthService {
        AuthService::new(
            &settings(),
            AuthStores {
                users: Arc::new(MemoryUserRepository::new()),
                otps: Arc::new(MemoryOtpRepository::new()),
                blacklist: Arc::new(MemoryBlacklist::new()),
                email: mailer,
            },
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Jane".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_sends_code() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let auth = service(mailer.clone());

        let response = auth.register(register_request("  Jane@X.com ")).await.unwrap();
        assert_eq!(response.email, "jane@x.com");

        let code = mailer.last_code("jane@x.com", OtpPurpose::Signup).unwrap();
        assert_eq!(code.len(), 6);

        let stored = auth.users().find_by_email("jane@x.com").await.unwrap().unwrap();
        assert!(!stored.is_verified);
        assert_ne!(stored.password_hash, "secret1");
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let auth = service(Arc::new(RecordingEmailSender::new()));

        let mut short_name = register_request("jane@x.com");
        short_name.name = "J".to_string();
        assert!(matches!(auth.register(short_name).await, Err(AuthError::BadRequest(_))));

        let mut short_password = register_request("jane@x.com");
        short_password.password = "abc".to_string();
        assert!(matches!(auth.register(short_password).await, Err(AuthError::BadRequest(_))));

        assert!(matches!(
            auth.register(register_request("not-an-email")).await,
            Err(AuthError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_register_survives_email_failure() {
        let auth = service(Arc::new(RecordingEmailSender::failing()));
        assert!(auth.register(register_request("jane@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_otp_lockout_after_repeated_mismatch() {
        let mailer = Arc::new(RecordingEmailSender::new());
        let auth = service(mailer.clone());
        auth.register(register_request("jane@x.com")).await.unwrap();
        let code = mailer.last_code("jane@x.com", OtpPurpose::Signup).unwrap();
        let wrong = if code == "000000" { "111111" } else { "000000" };

        for _ in 0..3 {
            let result = auth
                .verify_otp(OtpVerifyRequest {
                    email: "jane@x.com".to_string(),
                    otp_code: wrong.to_string(),
                    purpose: OtpPurpose::Signup,
                })
                .await;
            assert!(matches!(result, Err(AuthError::BadRequest(_))));
        }

        let result = auth
            .verify_otp(OtpVerifyRequest {
                email: "jane@x.com".to_string(),
                otp_code: code,
                purpose: OtpPurpose::Signup,
            })
            .await;
        assert!(matches!(result, Err(AuthError::TooManyAttempts)));
    }

    #[tokio::test]
    async fn test_malformed_code_is_bad_request() {
        let auth = service(Arc::new(RecordingEmailSender::new()));
        let result = auth
            .verify_otp(OtpVerifyRequest {
                email: "jane@x.com".to_string(),
                otp_code: "12".to_string(),
                purpose: OtpPurpose::Signup,
            })
            .await;
        assert!(matches!(result, Err(AuthError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_ensure_admin_account_is_idempotent() {
        let auth = service(Arc::new(RecordingEmailSender::new()));
        assert!(auth.ensure_admin_account("admin@x.com", "secret1", "Admin").await.unwrap());
        assert!(!auth.ensure_admin_account("admin@x.com", "secret1", "Admin").await.unwrap());

        let admin = auth.users().find_by_email("admin@x.com").await.unwrap().unwrap();
        assert!(admin.is_admin && admin.is_verified && admin.is_active);
    }
}
