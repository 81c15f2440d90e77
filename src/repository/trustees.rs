//! Trustees repository

use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, CheckInWriteError},
    models::{CreateTrustee, ScanLog, Trustee},
};

use super::{CheckInWrite, CommittedCheckIn};

#[derive(Clone)]
pub struct TrusteesRepository {
    pool: Pool<Postgres>,
}

impl TrusteesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Find a trustee by exact QR code value
    pub async fn find_by_qr_code(&self, qr_code: &str) -> AppResult<Option<Trustee>> {
        let row = sqlx::query_as::<_, Trustee>("SELECT * FROM trustees WHERE qr_code_value = $1")
            .bind(qr_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Get trustee by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Option<Trustee>> {
        let row = sqlx::query_as::<_, Trustee>("SELECT * FROM trustees WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// List all trustees by name
    pub async fn list(&self) -> AppResult<Vec<Trustee>> {
        let rows = sqlx::query_as::<_, Trustee>(
            "SELECT * FROM trustees ORDER BY last_name, first_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Create a trustee with a fresh daily count
    pub async fn create(&self, data: &CreateTrustee) -> AppResult<Trustee> {
        let row = sqlx::query_as::<_, Trustee>(
            r#"
            INSERT INTO trustees (first_name, last_name, qr_code_value, gaam, family_size_limit)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.qr_code_value)
        .bind(&data.gaam)
        .bind(data.family_size_limit)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Reset the daily count for a new day. A no-op when another
    /// check-in already reset it for `today`.
    pub async fn reset_daily_count(&self, id: Uuid, today: NaiveDate) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE trustees SET daily_scan_count = 0, last_scan_date = $2
            WHERE id = $1 AND last_scan_date IS DISTINCT FROM $2
            "#,
        )
        .bind(id)
        .bind(today)
        .execute(&self.pool)
        .await?;

        tracing::debug!(trustee_id = %id, rows = result.rows_affected(), "Daily count reset");
        Ok(())
    }

    /// Record a check-in: optional reset, log insert and guarded increment
    /// in a single transaction. Any failure rolls back everything.
    pub async fn commit_check_in(&self, write: &CheckInWrite) -> Result<CommittedCheckIn, CheckInWriteError> {
        let first_step = |e: sqlx::Error| -> CheckInWriteError {
            if write.reset_date.is_some() {
                CheckInWriteError::Reset(e.into())
            } else {
                CheckInWriteError::Log(e.into())
            }
        };

        let mut tx = self.pool.begin().await.map_err(first_step)?;

        if let Some(today) = write.reset_date {
            sqlx::query(
                r#"
                UPDATE trustees SET daily_scan_count = 0, last_scan_date = $2
                WHERE id = $1 AND last_scan_date IS DISTINCT FROM $2
                "#,
            )
            .bind(write.trustee_id)
            .bind(today)
            .execute(&mut *tx)
            .await
            .map_err(|e| CheckInWriteError::Reset(e.into()))?;
        }

        let log = sqlx::query_as::<_, ScanLog>(
            r#"
            INSERT INTO scan_logs (trustee_id, scanned_by)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(write.trustee_id)
        .bind(&write.scanned_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| CheckInWriteError::Log(e.into()))?;

        let new_count: Option<i32> = sqlx::query_scalar(
            r#"
            UPDATE trustees SET daily_scan_count = daily_scan_count + 1
            WHERE id = $1 AND daily_scan_count < family_size_limit
            RETURNING daily_scan_count
            "#,
        )
        .bind(write.trustee_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| CheckInWriteError::Increment(e.into()))?;

        let Some(new_count) = new_count else {
            tx.rollback()
                .await
                .map_err(|e| CheckInWriteError::Increment(AppError::from(e)))?;
            return Err(CheckInWriteError::LimitReached);
        };

        tx.commit()
            .await
            .map_err(|e| CheckInWriteError::Increment(e.into()))?;

        tracing::debug!(trustee_id = %write.trustee_id, new_count, "Check-in committed");
        Ok(CommittedCheckIn {
            log,
            daily_scan_count: new_count,
        })
    }
}
