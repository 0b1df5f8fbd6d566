//! Chat transcripts for videos (`chats`) and PDFs (`pdf_chats`)

use common::error::DatabaseResult;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::READY;
use crate::models::chat::{ChatMessage, ChatSummary, ChatTarget};

fn chat_from_row(row: &PgRow) -> ChatMessage {
    ChatMessage {
        id: row.get("id"),
        user_id: row.get("user_id"),
        message: row.get("message"),
        response: row.get("response"),
        is_user_message: row.get("is_user_message"),
        created_at: row.get("created_at"),
    }
}

#[derive(Clone)]
pub struct ChatRepository {
    pool: PgPool,
}

impl ChatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Store a question and its answer as two rows in one transaction.
    ///
    /// Returns the user row.
    pub async fn record_exchange(
        &self,
        target: ChatTarget,
        document_id: i64,
        user_id: i64,
        question: &str,
        answer: &str,
    ) -> DatabaseResult<ChatMessage> {
        let query = format!(
            r#"
            INSERT INTO {table} ({column}, user_id, message, response, is_user_message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, message, response, is_user_message, created_at
            "#,
            table = target.chat_table(),
            column = target.document_column(),
        );

        let mut tx = self.pool.begin().await?;

        let user_row = sqlx::query(&query)
            .bind(document_id)
            .bind(user_id)
            .bind(question)
            .bind(None::<String>)
            .bind(true)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(&query)
            .bind(document_id)
            .bind(user_id)
            .bind("")
            .bind(answer)
            .bind(false)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(chat_from_row(&user_row))
    }

    /// Transcript page in conversation order, and the number of rows
    pub async fn history(
        &self,
        target: ChatTarget,
        document_id: i64,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<ChatMessage>, i64)> {
        let query = format!(
            r#"
            SELECT id, user_id, message, response, is_user_message, created_at
            FROM {table}
            WHERE {column} = $1 AND user_id = $2
            ORDER BY created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "#,
            table = target.chat_table(),
            column = target.document_column(),
        );
        let rows = sqlx::query(&query)
            .bind(document_id)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        let count_query = format!(
            "SELECT COUNT(*) FROM {table} WHERE {column} = $1 AND user_id = $2",
            table = target.chat_table(),
            column = target.document_column(),
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(document_id)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows.iter().map(chat_from_row).collect(), total))
    }

    /// Chat activity for each of the user's ready documents, most recently
    /// discussed first, and the number of ready documents
    pub async fn summaries(
        &self,
        target: ChatTarget,
        user_id: i64,
        skip: i64,
        limit: i64,
    ) -> DatabaseResult<(Vec<ChatSummary>, i64)> {
        let query = format!(
            r#"
            SELECT d.id, d.{title} AS title, d.created_at,
                   lu.message AS last_user_message, lu.created_at AS last_user_at,
                   la.response AS last_response, la.created_at AS last_response_at,
                   (SELECT COUNT(*) FROM {chats} c
                    WHERE c.{column} = d.id AND c.user_id = $1 AND c.is_user_message) AS message_count
            FROM {docs} d
            LEFT JOIN LATERAL (
                SELECT message, created_at FROM {chats} c
                WHERE c.{column} = d.id AND c.user_id = $1 AND c.is_user_message
                ORDER BY created_at DESC, id DESC LIMIT 1
            ) lu ON TRUE
            LEFT JOIN LATERAL (
                SELECT response, created_at FROM {chats} c
                WHERE c.{column} = d.id AND c.user_id = $1 AND NOT c.is_user_message
                ORDER BY created_at DESC, id DESC LIMIT 1
            ) la ON TRUE
            WHERE d.user_id = $1 AND d.{ready}
            ORDER BY COALESCE(lu.created_at, d.created_at) DESC, d.id DESC
            LIMIT $2 OFFSET $3
            "#,
            title = target.title_column(),
            chats = target.chat_table(),
            docs = target.document_table(),
            column = target.document_column(),
            ready = READY.replace(" AND ", " AND d."),
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        let summaries = rows
            .iter()
            .map(|row| ChatSummary {
                document_id: row.get("id"),
                title: row.get("title"),
                document_created_at: row.get("created_at"),
                last_user_message: row.get("last_user_message"),
                last_user_at: row.get("last_user_at"),
                last_response: row.get("last_response"),
                last_response_at: row.get("last_response_at"),
                message_count: row.get("message_count"),
            })
            .collect();

        let count_query = format!(
            "SELECT COUNT(*) FROM {docs} WHERE user_id = $1 AND {READY}",
            docs = target.document_table(),
        );
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok((summaries, total))
    }
}
