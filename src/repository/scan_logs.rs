//! Scan logs repository

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{RecentScan, ScanLogEntry, TrusteeSummary},
};

#[derive(Clone)]
pub struct ScanLogsRepository {
    pool: Pool<Postgres>,
}

impl ScanLogsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All scan logs joined with trustee display fields, newest first
    pub async fn list_with_trustees(&self) -> AppResult<Vec<ScanLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.scan_time, l.scanned_by,
                   t.first_name, t.last_name, t.gaam
            FROM scan_logs l
            JOIN trustees t ON l.trustee_id = t.id
            ORDER BY l.scan_time DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(|row| ScanLogEntry {
                id: row.get("id"),
                scan_time: row.get("scan_time"),
                scanned_by: row.get("scanned_by"),
                trustee: TrusteeSummary {
                    first_name: row.get("first_name"),
                    last_name: row.get("last_name"),
                    gaam: row.get("gaam"),
                },
            })
            .collect();

        Ok(entries)
    }

    /// Last scans of one trustee, newest first
    pub async fn recent_for_trustee(&self, trustee_id: Uuid, limit: i64) -> AppResult<Vec<RecentScan>> {
        let rows = sqlx::query_as::<_, RecentScan>(
            r#"
            SELECT id, scan_time FROM scan_logs
            WHERE trustee_id = $1
            ORDER BY scan_time DESC
            LIMIT $2
            "#,
        )
        .bind(trustee_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
