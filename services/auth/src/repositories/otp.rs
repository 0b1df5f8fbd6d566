//! OTP ledger backed by Postgres

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use super::OtpRepository;
use crate::models::{NewOtp, Otp, OtpPurpose};

const OTP_COLUMNS: &str = "id, email, code, purpose, is_used, expires_at, created_at";

#[derive(Clone)]
pub struct PgOtpRepository {
    pool: PgPool,
}

impl PgOtpRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn otp_from_row(row: &PgRow) -> DatabaseResult<Otp> {
    let purpose: String = row.get("purpose");
    let purpose = purpose
        .parse::<OtpPurpose>()
        .map_err(|e| DatabaseError::Query(sqlx::Error::Decode(e.into())))?;

    Ok(Otp {
        id: row.get("id"),
        email: row.get("email"),
        code: row.get("code"),
        purpose,
        is_used: row.get("is_used"),
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl OtpRepository for PgOtpRepository {
    async fn insert(&self, otp: &NewOtp) -> DatabaseResult<Otp> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE otps SET is_used = TRUE WHERE email = $1 AND purpose = $2 AND is_used = FALSE",
        )
        .bind(&otp.email)
        .bind(otp.purpose.as_str())
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO otps (email, code, purpose, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {OTP_COLUMNS}
            "#
        ))
        .bind(&otp.email)
        .bind(&otp.code)
        .bind(otp.purpose.as_str())
        .bind(otp.expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        otp_from_row(&row)
    }

    async fn latest_unused(
        &self,
        email: &str,
        purpose: OtpPurpose,
    ) -> DatabaseResult<Option<Otp>> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {OTP_COLUMNS} FROM otps
            WHERE email = $1 AND purpose = $2 AND is_used = FALSE
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(email)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(otp_from_row).transpose()
    }

    async fn latest_is_used(&self, email: &str, purpose: OtpPurpose) -> DatabaseResult<bool> {
        let used: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT is_used FROM otps
            WHERE email = $1 AND purpose = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(used.unwrap_or(false))
    }

    async fn consume(&self, id: i64) -> DatabaseResult<bool> {
        let result = sqlx::query("UPDATE otps SET is_used = TRUE WHERE id = $1 AND is_used = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
