//! Scan log queries (admin log view and per-trustee activity)

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{RecentScan, ScanLogEntry},
    repository::CheckInStore,
};

/// Upper bound on the per-trustee activity list
const MAX_RECENT_SCANS: i64 = 100;

#[derive(Clone)]
pub struct ScanLogsService {
    store: Arc<dyn CheckInStore>,
    default_recent: i64,
}

impl ScanLogsService {
    pub fn new(store: Arc<dyn CheckInStore>, default_recent: i64) -> Self {
        Self { store, default_recent }
    }

    /// Every scan log row with trustee details, newest first
    pub async fn list_all(&self) -> AppResult<Vec<ScanLogEntry>> {
        self.store.list_scan_logs().await
    }

    /// Recent scans of one trustee
    pub async fn recent_for_trustee(&self, trustee_id: Uuid, limit: Option<i64>) -> AppResult<Vec<RecentScan>> {
        let limit = limit.unwrap_or(self.default_recent);
        if !(1..=MAX_RECENT_SCANS).contains(&limit) {
            return Err(AppError::BadRequest(format!(
                "limit must be between 1 and {}",
                MAX_RECENT_SCANS
            )));
        }

        if self.store.get_trustee(trustee_id).await?.is_none() {
            return Err(AppError::TrusteeNotFound(trustee_id));
        }
        self.store.recent_scans(trustee_id, limit).await
    }
}
