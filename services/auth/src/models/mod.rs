//! Authentication service models

pub mod auth;
pub mod otp;
pub mod user;

// Re-export for convenience
pub use auth::{
    ForgotPasswordOtpRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    OtpVerifyRequest, OtpVerifyResponse, RegisterRequest, RegisterResponse, ResetPasswordRequest,
};
pub use otp::{NewOtp, Otp, OtpPurpose};
pub use user::{AuthUser, NewUser, User, UserProfile};
