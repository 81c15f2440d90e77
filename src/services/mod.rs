//! Business logic services

pub mod checkin;
pub mod scan_logs;
pub mod trustees;

use std::sync::Arc;

use crate::{config::ScannerConfig, error::AppResult, repository::CheckInStore};

pub use checkin::{CheckInService, Clock, SystemClock};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub checkin: checkin::CheckInService,
    pub trustees: trustees::TrusteesService,
    pub scan_logs: scan_logs::ScanLogsService,
    store: Arc<dyn CheckInStore>,
}

impl Services {
    /// Create all services on top of the given store
    pub fn new(store: Arc<dyn CheckInStore>, clock: Arc<dyn Clock>, scanner: &ScannerConfig) -> Self {
        Self {
            checkin: checkin::CheckInService::new(store.clone(), clock),
            trustees: trustees::TrusteesService::new(store.clone()),
            scan_logs: scan_logs::ScanLogsService::new(store.clone(), scanner.recent_scans),
            store,
        }
    }

    /// Check that the backing store answers
    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
