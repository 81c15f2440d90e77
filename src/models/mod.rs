//! Data models for trustee check-in

pub mod checkin;
pub mod scan_log;
pub mod trustee;

// Re-export commonly used types
pub use checkin::{CheckInOutcome, CheckInRequest, CheckInResponse, FailureReason};
pub use scan_log::{RecentScan, ScanLog, ScanLogEntry, TrusteeSummary};
pub use trustee::{CreateTrustee, Trustee};
