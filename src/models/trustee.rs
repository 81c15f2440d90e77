//! Trustee model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Person record checked in at the kiosk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Trustee {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    /// Value encoded in the trustee's QR code (unique)
    pub qr_code_value: String,
    /// Group / family label
    pub gaam: String,
    /// Successful check-ins on `last_scan_date`
    pub daily_scan_count: i32,
    /// Daily quota ceiling
    pub family_size_limit: i32,
    /// Day the count refers to; `None` until the first scan
    pub last_scan_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Trustee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether the stored count belongs to an earlier day than `today`
    pub fn needs_reset(&self, today: NaiveDate) -> bool {
        self.last_scan_date != Some(today)
    }

    pub fn limit_reached(&self) -> bool {
        self.daily_scan_count >= self.family_size_limit
    }
}

/// Create trustee request
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateTrustee {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(length(min = 1, max = 255))]
    pub qr_code_value: String,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub gaam: String,
    #[validate(range(min = 1))]
    pub family_size_limit: i32,
}
