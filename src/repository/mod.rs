//! Repository layer for database operations

pub mod scan_logs;
pub mod trustees;

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppResult, CheckInWriteError},
    models::{CreateTrustee, RecentScan, ScanLog, ScanLogEntry, Trustee},
};

/// Everything a successful check-in persists, committed as one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInWrite {
    pub trustee_id: Uuid,
    /// Set when the stored count belongs to an earlier day
    pub reset_date: Option<NaiveDate>,
    pub scanned_by: Option<String>,
}

/// A committed check-in: the new log row and the count it brought the trustee to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedCheckIn {
    pub log: ScanLog,
    /// Daily count after the increment, as stored
    pub daily_scan_count: i32,
}

/// Data access used by the check-in and log services.
/// This is the only integration point with persistent storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckInStore: Send + Sync {
    /// Point lookup by unique QR code value
    async fn find_trustee_by_qr_code(&self, qr_code: &str) -> AppResult<Option<Trustee>>;

    async fn get_trustee(&self, id: Uuid) -> AppResult<Option<Trustee>>;

    async fn list_trustees(&self) -> AppResult<Vec<Trustee>>;

    async fn create_trustee(&self, data: &CreateTrustee) -> AppResult<Trustee>;

    /// Set the count to 0 for `today`, unless it was already reset for that day
    async fn reset_daily_count(&self, id: Uuid, today: NaiveDate) -> AppResult<()>;

    /// Reset (if requested), append the log row and increment the count atomically
    async fn commit_check_in(&self, write: &CheckInWrite) -> Result<CommittedCheckIn, CheckInWriteError>;

    /// Most recent scans of one trustee, newest first
    async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> AppResult<Vec<RecentScan>>;

    /// Every scan log row joined with trustee fields, newest first
    async fn list_scan_logs(&self) -> AppResult<Vec<ScanLogEntry>>;

    /// Connectivity check for readiness probes
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub trustees: trustees::TrusteesRepository,
    pub scan_logs: scan_logs::ScanLogsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            trustees: trustees::TrusteesRepository::new(pool.clone()),
            scan_logs: scan_logs::ScanLogsRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl CheckInStore for Repository {
    async fn find_trustee_by_qr_code(&self, qr_code: &str) -> AppResult<Option<Trustee>> {
        self.trustees.find_by_qr_code(qr_code).await
    }

    async fn get_trustee(&self, id: Uuid) -> AppResult<Option<Trustee>> {
        self.trustees.get_by_id(id).await
    }

    async fn list_trustees(&self) -> AppResult<Vec<Trustee>> {
        self.trustees.list().await
    }

    async fn create_trustee(&self, data: &CreateTrustee) -> AppResult<Trustee> {
        self.trustees.create(data).await
    }

    async fn reset_daily_count(&self, id: Uuid, today: NaiveDate) -> AppResult<()> {
        self.trustees.reset_daily_count(id, today).await
    }

    async fn commit_check_in(&self, write: &CheckInWrite) -> Result<CommittedCheckIn, CheckInWriteError> {
        self.trustees.commit_check_in(write).await
    }

    async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> AppResult<Vec<RecentScan>> {
        self.scan_logs.recent_for_trustee(trustee_id, limit).await
    }

    async fn list_scan_logs(&self) -> AppResult<Vec<ScanLogEntry>> {
        self.scan_logs.list_with_trustees().await
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
