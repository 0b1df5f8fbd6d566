//! YouTube video records and payloads

use chrono::{DateTime, Utc};
use notes::Notes;
use serde::{Deserialize, Serialize};

/// Stored video row
#[derive(Debug, Clone)]
pub struct Video {
    pub id: i64,
    pub user_id: i64,
    /// YouTube video id
    pub video_id: String,
    pub video_url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub transcript: Option<String>,
    pub summary: Option<String>,
    pub key_points: Option<String>,
    pub bullet_notes: Option<String>,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Stored notes, when all three sections are present
    pub fn notes(&self) -> Option<Notes> {
        Some(Notes {
            summary: self.summary.clone()?,
            key_points: self.key_points.clone()?,
            bullet_notes: self.bullet_notes.clone()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: i64,
    pub video_id: String,
    pub video_url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateVideoRequest {
    pub video_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoGenerateResponse {
    pub message: String,
    pub video_id: i64,
    pub youtube_video_id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub summary: Option<String>,
    pub key_points: Option<String>,
    pub bullet_notes: Option<String>,
    pub status: String,
}

impl VideoGenerateResponse {
    pub fn completed(message: impl Into<String>, video: Video) -> Self {
        Self {
            message: message.into(),
            video_id: video.id,
            youtube_video_id: video.video_id,
            title: video.title,
            thumbnail_url: video.thumbnail_url,
            summary: video.summary,
            key_points: video.key_points,
            bullet_notes: video.bullet_notes,
            status: "completed".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoResponse {
    pub id: i64,
    pub video_id: String,
    pub video_url: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration: Option<String>,
    pub summary: Option<String>,
    pub key_points: Option<String>,
    pub bullet_notes: Option<String>,
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Video> for VideoResponse {
    fn from(video: Video) -> Self {
        Self {
            id: video.id,
            video_id: video.video_id,
            video_url: video.video_url,
            title: video.title,
            thumbnail_url: video.thumbnail_url,
            duration: video.duration,
            summary: video.summary,
            key_points: video.key_points,
            bullet_notes: video.bullet_notes,
            is_saved: video.is_saved,
            created_at: video.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoResponse>,
    pub total: i64,
}
