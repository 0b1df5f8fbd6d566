//! One-time passcode generation and comparison

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;

/// Shortest and longest accepted code
pub const MIN_CODE_LENGTH: usize = 4;
pub const MAX_CODE_LENGTH: usize = 6;

/// Draw a decimal code of `length` digits from the OS CSPRNG
pub fn generate_otp(length: usize) -> String {
    let mut rng = OsRng;
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Keep only the digits of a submitted code.
///
/// Returns `None` when what remains is not a 4 to 6 digit code.
pub fn normalize_code(code: &str) -> Option<String> {
    let digits: String = code.chars().filter(|c| c.is_ascii_digit()).collect();
    let stripped_other = code
        .chars()
        .any(|c| !c.is_ascii_digit() && !c.is_whitespace() && !c.is_ascii_punctuation());

    if stripped_other || !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&digits.len()) {
        return None;
    }
    Some(digits)
}

/// Constant-time equality of two codes
pub fn codes_match(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}

pub fn compute_expiry(now: DateTime<Utc>, ttl_minutes: i64) -> DateTime<Utc> {
    now + Duration::minutes(ttl_minutes)
}
