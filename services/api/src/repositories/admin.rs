//! Cross-user queries for the admin panel

use common::error::DatabaseResult;
use sqlx::{PgPool, Row};

use super::READY;
use crate::models::admin::{
    AdminPdf, AdminUser, AdminVideo, ChatStats, DashboardStats, DocumentStats, UserStats,
};

#[derive(Clone)]
pub struct AdminRepository {
    pool: PgPool,
}

impl AdminRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn document_stats(&self, table: &str) -> DatabaseResult<DocumentStats> {
        let query = format!(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE {READY}) AS with_notes,
                   COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE) AS new_today,
                   COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '7 days') AS new_last_7_days
            FROM {table}
            "#
        );
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;

        Ok(DocumentStats {
            total: row.get("total"),
            with_notes: row.get("with_notes"),
            new_today: row.get("new_today"),
            new_last_7_days: row.get("new_last_7_days"),
        })
    }

    async fn chat_stats(&self, table: &str) -> DatabaseResult<ChatStats> {
        let query = format!(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE) AS new_today
            FROM {table}
            "#
        );
        let row = sqlx::query(&query).fetch_one(&self.pool).await?;

        Ok(ChatStats {
            total: row.get("total"),
            new_today: row.get("new_today"),
        })
    }

    pub async fn dashboard_stats(&self) -> DatabaseResult<DashboardStats> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE is_active) AS active,
                   COUNT(*) FILTER (WHERE is_verified) AS verified,
                   COUNT(*) FILTER (WHERE created_at::date = CURRENT_DATE) AS new_today,
                   COUNT(*) FILTER (WHERE created_at >= NOW() - INTERVAL '7 days') AS new_last_7_days
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let users = UserStats {
            total: row.get("total"),
            active: row.get("active"),
            verified: row.get("verified"),
            new_today: row.get("new_today"),
            new_last_7_days: row.get("new_last_7_days"),
        };

        Ok(DashboardStats {
            users,
            videos: self.document_stats("videos").await?,
            chats: self.chat_stats("chats").await?,
            pdfs: self.document_stats("pdfs").await?,
            pdf_chats: self.chat_stats("pdf_chats").await?,
        })
    }

    /// Users matching the filters, newest first, and the number of matches
    pub async fn list_users(
        &self,
        pattern: Option<&str>,
        is_active: Option<bool>,
        is_verified: Option<bool>,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<AdminUser>, i64)> {
        const FILTER: &str = r#"
            ($1::text IS NULL OR u.name ILIKE $1 OR u.email ILIKE $1)
            AND ($2::bool IS NULL OR u.is_active = $2)
            AND ($3::bool IS NULL OR u.is_verified = $3)
        "#;

        let query = format!(
            r#"
            SELECT u.id, u.name, u.email, u.is_active, u.is_verified, u.is_admin, u.created_at,
                   (SELECT COUNT(*) FROM videos v WHERE v.user_id = u.id) AS video_count,
                   (SELECT COUNT(*) FROM chats c WHERE c.user_id = u.id) AS chat_count
            FROM users u
            WHERE {FILTER}
            ORDER BY u.created_at DESC, u.id DESC
            LIMIT $4 OFFSET $5
            "#
        );
        let rows = sqlx::query(&query)
            .bind(pattern)
            .bind(is_active)
            .bind(is_verified)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        let users = rows
            .iter()
            .map(|row| AdminUser {
                id: row.get("id"),
                name: row.get("name"),
                email: row.get("email"),
                is_active: row.get("is_active"),
                is_verified: row.get("is_verified"),
                is_admin: row.get("is_admin"),
                created_at: row.get("created_at"),
                video_count: row.get("video_count"),
                chat_count: row.get("chat_count"),
            })
            .collect();

        let count_query = format!("SELECT COUNT(*) FROM users u WHERE {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(pattern)
            .bind(is_active)
            .bind(is_verified)
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    /// Flip a user's active flag, returning the new value
    pub async fn toggle_active(&self, user_id: i64) -> DatabaseResult<Option<bool>> {
        let active: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE users SET is_active = NOT is_active, updated_at = NOW()
            WHERE id = $1
            RETURNING is_active
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(active)
    }

    pub async fn list_videos(
        &self,
        pattern: Option<&str>,
        user_id: Option<i64>,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<AdminVideo>, i64)> {
        const FILTER: &str = r#"
            ($1::text IS NULL OR v.title ILIKE $1)
            AND ($2::bigint IS NULL OR v.user_id = $2)
        "#;

        let query = format!(
            r#"
            SELECT v.id, v.video_id, v.title, v.thumbnail_url, v.user_id, v.created_at,
                   COALESCE(u.name, 'Unknown') AS user_name,
                   COALESCE(u.email, 'Unknown') AS user_email,
                   (v.summary IS NOT NULL AND v.key_points IS NOT NULL
                    AND v.bullet_notes IS NOT NULL) AS has_notes,
                   (SELECT COUNT(*) FROM chats c WHERE c.video_id = v.id) AS chat_count
            FROM videos v
            LEFT JOIN users u ON u.id = v.user_id
            WHERE {FILTER}
            ORDER BY v.created_at DESC, v.id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query(&query)
            .bind(pattern)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        let videos = rows
            .iter()
            .map(|row| AdminVideo {
                id: row.get("id"),
                video_id: row.get("video_id"),
                title: row.get("title"),
                thumbnail_url: row.get("thumbnail_url"),
                user_id: row.get("user_id"),
                user_name: row.get("user_name"),
                user_email: row.get("user_email"),
                has_notes: row.get("has_notes"),
                chat_count: row.get("chat_count"),
                created_at: row.get("created_at"),
            })
            .collect();

        let count_query = format!("SELECT COUNT(*) FROM videos v WHERE {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(pattern)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((videos, total))
    }

    /// Delete any user's video
    pub async fn delete_video(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn list_pdfs(
        &self,
        pattern: Option<&str>,
        user_id: Option<i64>,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<AdminPdf>, i64)> {
        const FILTER: &str = r#"
            ($1::text IS NULL OR p.file_name ILIKE $1)
            AND ($2::bigint IS NULL OR p.user_id = $2)
        "#;

        let query = format!(
            r#"
            SELECT p.id, p.file_name, p.file_size, p.page_count, p.user_id, p.created_at,
                   COALESCE(u.name, 'Unknown') AS user_name,
                   COALESCE(u.email, 'Unknown') AS user_email,
                   (p.summary IS NOT NULL AND p.key_points IS NOT NULL
                    AND p.bullet_notes IS NOT NULL) AS has_notes,
                   (SELECT COUNT(*) FROM pdf_chats c WHERE c.pdf_id = p.id) AS chat_count
            FROM pdfs p
            LEFT JOIN users u ON u.id = p.user_id
            WHERE {FILTER}
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query(&query)
            .bind(pattern)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        let pdfs = rows
            .iter()
            .map(|row| AdminPdf {
                id: row.get("id"),
                file_name: row.get("file_name"),
                file_size: row.get("file_size"),
                page_count: row.get("page_count"),
                user_id: row.get("user_id"),
                user_name: row.get("user_name"),
                user_email: row.get("user_email"),
                has_notes: row.get("has_notes"),
                chat_count: row.get("chat_count"),
                created_at: row.get("created_at"),
            })
            .collect();

        let count_query = format!("SELECT COUNT(*) FROM pdfs p WHERE {FILTER}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(pattern)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((pdfs, total))
    }
}
