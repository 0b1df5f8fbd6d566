//! Video repository for database operations

use common::error::DatabaseResult;
use notes::Notes;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::READY;
use crate::models::video::{NewVideo, Video};

const VIDEO_COLUMNS: &str = "id, user_id, video_id, video_url, title, thumbnail_url, duration, \
     transcript, summary, key_points, bullet_notes, is_saved, created_at, updated_at";

fn video_from_row(row: &PgRow) -> Video {
    Video {
        id: row.get("id"),
        user_id: row.get("user_id"),
        video_id: row.get("video_id"),
        video_url: row.get("video_url"),
        title: row.get("title"),
        thumbnail_url: row.get("thumbnail_url"),
        duration: row.get("duration"),
        transcript: row.get("transcript"),
        summary: row.get("summary"),
        key_points: row.get("key_points"),
        bullet_notes: row.get("bullet_notes"),
        is_saved: row.get("is_saved"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, video: &NewVideo) -> DatabaseResult<Video> {
        let query = format!(
            r#"
            INSERT INTO videos (user_id, video_id, video_url, title, thumbnail_url, duration, transcript)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(video.user_id)
            .bind(&video.video_id)
            .bind(&video.video_url)
            .bind(&video.title)
            .bind(&video.thumbnail_url)
            .bind(&video.duration)
            .bind(&video.transcript)
            .fetch_one(&self.pool)
            .await?;

        Ok(video_from_row(&row))
    }

    /// Find a video owned by `user_id`
    pub async fn find_for_user(&self, id: i64, user_id: i64) -> DatabaseResult<Option<Video>> {
        let query = format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1 AND user_id = $2");
        let row = sqlx::query(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(video_from_row))
    }

    pub async fn find_by_youtube_id(
        &self,
        user_id: i64,
        youtube_id: &str,
    ) -> DatabaseResult<Option<Video>> {
        let query =
            format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 AND video_id = $2");
        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(youtube_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(video_from_row))
    }

    pub async fn save_notes(&self, id: i64, notes: &Notes) -> DatabaseResult<Video> {
        let query = format!(
            r#"
            UPDATE videos
            SET summary = $2, key_points = $3, bullet_notes = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(&notes.summary)
            .bind(&notes.key_points)
            .bind(&notes.bullet_notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(video_from_row(&row))
    }

    /// Page of the user's videos with notes, newest first, and their total
    pub async fn list_ready(
        &self,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<Video>, i64)> {
        let query = format!(
            r#"
            SELECT {VIDEO_COLUMNS}
            FROM videos
            WHERE user_id = $1 AND {READY}
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        let count_query = format!("SELECT COUNT(*) FROM videos WHERE user_id = $1 AND {READY}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.iter().map(video_from_row).collect(), total))
    }

    pub async fn mark_saved(&self, id: i64, user_id: i64) -> DatabaseResult<Option<Video>> {
        let query = format!(
            r#"
            UPDATE videos SET is_saved = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {VIDEO_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(video_from_row))
    }

    /// Delete a video and, by cascade, its chat rows
    pub async fn delete(&self, id: i64, user_id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
