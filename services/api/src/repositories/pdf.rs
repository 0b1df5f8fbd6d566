//! PDF repository for database operations

use common::error::DatabaseResult;
use notes::Notes;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::READY;
use crate::models::pdf::{NewPdf, Pdf};

const PDF_COLUMNS: &str = "id, user_id, file_name, file_path, file_size, page_count, \
     extracted_text, summary, key_points, bullet_notes, is_saved, created_at, updated_at";

fn pdf_from_row(row: &PgRow) -> Pdf {
    Pdf {
        id: row.get("id"),
        user_id: row.get("user_id"),
        file_name: row.get("file_name"),
        file_path: row.get("file_path"),
        file_size: row.get("file_size"),
        page_count: row.get("page_count"),
        extracted_text: row.get("extracted_text"),
        summary: row.get("summary"),
        key_points: row.get("key_points"),
        bullet_notes: row.get("bullet_notes"),
        is_saved: row.get("is_saved"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[derive(Clone)]
pub struct PdfRepository {
    pool: PgPool,
}

impl PdfRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, pdf: &NewPdf) -> DatabaseResult<Pdf> {
        let query = format!(
            r#"
            INSERT INTO pdfs (user_id, file_name, file_path, file_size, page_count, extracted_text)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PDF_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(pdf.user_id)
            .bind(&pdf.file_name)
            .bind(&pdf.file_path)
            .bind(pdf.file_size)
            .bind(pdf.page_count)
            .bind(&pdf.extracted_text)
            .fetch_one(&self.pool)
            .await?;

        Ok(pdf_from_row(&row))
    }

    /// Find a PDF owned by `user_id`
    pub async fn find_for_user(&self, id: i64, user_id: i64) -> DatabaseResult<Option<Pdf>> {
        let query = format!("SELECT {PDF_COLUMNS} FROM pdfs WHERE id = $1 AND user_id = $2");
        let row = sqlx::query(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(pdf_from_row))
    }

    /// Store re-extracted text
    pub async fn update_text(
        &self,
        id: i64,
        text: &str,
        page_count: i32,
    ) -> DatabaseResult<()> {
        sqlx::query(
            r#"
            UPDATE pdfs SET extracted_text = $2, page_count = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(text)
        .bind(page_count)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn save_notes(&self, id: i64, notes: &Notes) -> DatabaseResult<Pdf> {
        let query = format!(
            r#"
            UPDATE pdfs
            SET summary = $2, key_points = $3, bullet_notes = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {PDF_COLUMNS}
            "#
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(&notes.summary)
            .bind(&notes.key_points)
            .bind(&notes.bullet_notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(pdf_from_row(&row))
    }

    /// Page of the user's PDFs with notes, newest first, and their total
    pub async fn list_ready(
        &self,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<Pdf>, i64)> {
        let query = format!(
            r#"
            SELECT {PDF_COLUMNS}
            FROM pdfs
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

        let count_query = format!("SELECT COUNT(*) FROM pdfs WHERE user_id = $1 AND {READY}");
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.iter().map(pdf_from_row).collect(), total))
    }

    /// Delete a PDF row, returning the stored file path
    pub async fn delete(&self, id: i64) -> DatabaseResult<Option<String>> {
        let path: Option<String> =
            sqlx::query_scalar("DELETE FROM pdfs WHERE id = $1 RETURNING file_path")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(path)
    }
}
