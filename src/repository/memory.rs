//! In-memory store used by unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, CheckInWriteError},
    models::{CreateTrustee, RecentScan, ScanLog, ScanLogEntry, Trustee, TrusteeSummary},
};

use super::{CheckInStore, CheckInWrite, CommittedCheckIn};

#[derive(Default)]
pub(crate) struct MemoryStore {
    pub trustees: Mutex<Vec<Trustee>>,
    pub logs: Mutex<Vec<ScanLog>>,
    /// Make the log insert of the next commits fail
    pub fail_log_insert: Mutex<bool>,
}

impl MemoryStore {
    pub fn with_trustees(trustees: Vec<Trustee>) -> Self {
        Self {
            trustees: Mutex::new(trustees),
            ..Default::default()
        }
    }

    pub fn trustee(&self, id: Uuid) -> Option<Trustee> {
        self.trustees.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    pub fn log_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

#[async_trait]
impl CheckInStore for MemoryStore {
    async fn find_trustee_by_qr_code(&self, qr_code: &str) -> AppResult<Option<Trustee>> {
        let trustees = self.trustees.lock().unwrap();
        Ok(trustees.iter().find(|t| t.qr_code_value == qr_code).cloned())
    }

    async fn get_trustee(&self, id: Uuid) -> AppResult<Option<Trustee>> {
        Ok(self.trustee(id))
    }

    async fn list_trustees(&self) -> AppResult<Vec<Trustee>> {
        Ok(self.trustees.lock().unwrap().clone())
    }

    async fn create_trustee(&self, data: &CreateTrustee) -> AppResult<Trustee> {
        let mut trustees = self.trustees.lock().unwrap();
        if trustees.iter().any(|t| t.qr_code_value == data.qr_code_value) {
            return Err(AppError::Conflict("QR code already assigned".to_string()));
        }
        let trustee = Trustee {
            id: Uuid::new_v4(),
            first_name: data.first_name.clone(),
            last_name: data.last_name.clone(),
            qr_code_value: data.qr_code_value.clone(),
            gaam: data.gaam.clone(),
            daily_scan_count: 0,
            family_size_limit: data.family_size_limit,
            last_scan_date: None,
            created_at: Some(Utc::now()),
        };
        trustees.push(trustee.clone());
        Ok(trustee)
    }

    async fn reset_daily_count(&self, id: Uuid, today: NaiveDate) -> AppResult<()> {
        let mut trustees = self.trustees.lock().unwrap();
        if let Some(t) = trustees.iter_mut().find(|t| t.id == id) {
            if t.last_scan_date != Some(today) {
                t.daily_scan_count = 0;
                t.last_scan_date = Some(today);
            }
        }
        Ok(())
    }

    async fn commit_check_in(&self, write: &CheckInWrite) -> Result<CommittedCheckIn, CheckInWriteError> {
        let mut trustees = self.trustees.lock().unwrap();
        let Some(current) = trustees.iter().find(|t| t.id == write.trustee_id).cloned() else {
            return Err(CheckInWriteError::Increment(AppError::TrusteeNotFound(write.trustee_id)));
        };

        // Work on a copy so a failing step leaves nothing behind
        let mut updated = current;
        if let Some(today) = write.reset_date {
            if updated.last_scan_date != Some(today) {
                updated.daily_scan_count = 0;
                updated.last_scan_date = Some(today);
            }
        }

        if *self.fail_log_insert.lock().unwrap() {
            return Err(CheckInWriteError::Log(AppError::Internal(
                "log insert failed".to_string(),
            )));
        }
        let log = ScanLog {
            id: Uuid::new_v4(),
            trustee_id: write.trustee_id,
            scan_time: Utc::now(),
            scanned_by: write.scanned_by.clone(),
        };

        if updated.limit_reached() {
            return Err(CheckInWriteError::LimitReached);
        }
        updated.daily_scan_count += 1;
        let daily_scan_count = updated.daily_scan_count;

        if let Some(t) = trustees.iter_mut().find(|t| t.id == write.trustee_id) {
            *t = updated;
        }
        self.logs.lock().unwrap().push(log.clone());
        Ok(CommittedCheckIn {
            log,
            daily_scan_count,
        })
    }

    async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> AppResult<Vec<RecentScan>> {
        let mut scans: Vec<RecentScan> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.trustee_id == trustee_id)
            .map(|l| RecentScan { id: l.id, scan_time: l.scan_time })
            .collect();
        scans.sort_by(|a, b| b.scan_time.cmp(&a.scan_time));
        scans.truncate(limit.max(0) as usize);
        Ok(scans)
    }

    async fn list_scan_logs(&self) -> AppResult<Vec<ScanLogEntry>> {
        let trustees = self.trustees.lock().unwrap();
        let mut entries: Vec<ScanLogEntry> = self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter_map(|l| {
                let t = trustees.iter().find(|t| t.id == l.trustee_id)?;
                Some(ScanLogEntry {
                    id: l.id,
                    scan_time: l.scan_time,
                    scanned_by: l.scanned_by.clone(),
                    trustee: TrusteeSummary {
                        first_name: t.first_name.clone(),
                        last_name: t.last_name.clone(),
                        gaam: t.gaam.clone(),
                    },
                })
            })
            .collect();
        entries.sort_by(|a, b| b.scan_time.cmp(&a.scan_time));
        Ok(entries)
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
