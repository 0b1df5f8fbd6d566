//! Authentication for TubeMind
//!
//! Users register with an email and password, prove control of the email with
//! a one-time passcode, then receive HS256 session tokens. Password resets go
//! through a second OTP and a single-use reset token.

pub mod email;
pub mod error;
pub mod jwt;
pub mod models;
pub mod otp;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod service;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use service::{AuthService, AuthStores};
