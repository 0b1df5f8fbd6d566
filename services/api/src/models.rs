//! API models for request and response payloads

use serde::Deserialize;

pub mod admin;
pub mod chat;
pub mod pdf;
pub mod video;

/// Largest page size any listing accepts
pub const MAX_PAGE_SIZE: i64 = 200;

/// `skip`/`limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// Offset and limit, with `default_limit` when none was given
    pub fn resolve(&self, default_limit: i64) -> (i64, i64) {
        let skip = self.skip.unwrap_or(0).max(0);
        let limit = self.limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
        (skip, limit)
    }
}
