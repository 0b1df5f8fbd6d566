//! Admin panel listings and statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStats {
    pub total: i64,
    pub active: i64,
    pub verified: i64,
    pub new_today: i64,
    pub new_last_7_days: i64,
}

/// Counts for a kind of document
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentStats {
    pub total: i64,
    pub with_notes: i64,
    pub new_today: i64,
    pub new_last_7_days: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatStats {
    pub total: i64,
    pub new_today: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardStats {
    pub users: UserStats,
    pub videos: DocumentStats,
    pub chats: ChatStats,
    pub pdfs: DocumentStats,
    pub pdf_chats: ChatStats,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
}

/// Filter shared by the video and PDF listings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub user_id: Option<i64>,
}

/// `%term%` pattern for a non-blank search term
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s))
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub video_count: i64,
    pub chat_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminVideo {
    pub id: i64,
    pub video_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub has_notes: bool,
    pub chat_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminPdf {
    pub id: i64,
    pub file_name: String,
    pub file_size: i64,
    pub page_count: Option<i32>,
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub has_notes: bool,
    pub chat_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminUserList {
    pub users: Vec<AdminUser>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminVideoList {
    pub videos: Vec<AdminVideo>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminPdfList {
    pub pdfs: Vec<AdminPdf>,
    pub total: i64,
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserActivationResponse {
    pub message: String,
    pub user_id: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoDeleteResponse {
    pub message: String,
    pub video_id: i64,
}
