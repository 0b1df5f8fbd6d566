//! Request and response payloads of the authentication flows

use serde::{Deserialize, Serialize};

use super::otp::OtpPurpose;

/// Request for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpVerifyRequest {
    pub email: String,
    pub otp_code: String,
    pub purpose: OtpPurpose,
}

/// OTP check on the dedicated forgot-password route.
///
/// The purpose is implied; a `purpose` field in the body is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordOtpRequest {
    pub email: String,
    pub otp_code: String,
}

impl From<ForgotPasswordOtpRequest> for OtpVerifyRequest {
    fn from(request: ForgotPasswordOtpRequest) -> Self {
        OtpVerifyRequest {
            email: request.email,
            otp_code: request.otp_code,
            purpose: OtpPurpose::ForgotPassword,
        }
    }
}

/// Outcome of a successful OTP verification
///
/// Exactly one of `token` (signup) and `reset_token` (forgot password) is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerifyResponse {
    pub message: String,
    pub verified: bool,
    pub token: Option<String>,
    pub reset_token: Option<String>,
}

/// Request for user login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response for user login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user_id: i64,
    pub email: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub is_admin: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub reset_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
