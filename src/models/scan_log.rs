//! Scan log model (append-only audit trail of check-ins)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Scan log row as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScanLog {
    pub id: Uuid,
    pub trustee_id: Uuid,
    pub scan_time: DateTime<Utc>,
    /// Operator label of the kiosk that recorded the scan
    pub scanned_by: Option<String>,
}

/// Trustee display fields joined onto a scan log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TrusteeSummary {
    pub first_name: String,
    pub last_name: String,
    pub gaam: String,
}

impl TrusteeSummary {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Scan log row with trustee details, as shown in the log browser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanLogEntry {
    pub id: Uuid,
    pub scan_time: DateTime<Utc>,
    pub scanned_by: Option<String>,
    pub trustee: TrusteeSummary,
}

/// Entry of a trustee's recent activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RecentScan {
    pub id: Uuid,
    pub scan_time: DateTime<Utc>,
}

/// Query parameters for recent scans
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RecentScanQuery {
    /// Maximum number of entries (default 5)
    pub limit: Option<i64>,
}
