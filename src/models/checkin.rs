//! Check-in request and validation outcome types

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::trustee::Trustee;

/// Check-in request sent by the kiosk
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CheckInRequest {
    /// Decoded QR code text
    #[validate(length(min = 1, max = 255))]
    pub qr_code: String,
}

/// Why a check-in was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    ResetFailed,
    LimitReached,
    LogFailed,
    IncrementFailed,
}

impl FailureReason {
    /// Message shown to the operator
    pub fn message(&self) -> &'static str {
        match self {
            FailureReason::NotFound => "QR Code not found",
            FailureReason::ResetFailed => "Error resetting daily count",
            FailureReason::LimitReached => "Daily scan limit reached",
            FailureReason::LogFailed => "Error logging the scan",
            FailureReason::IncrementFailed => "Error updating scan count",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of validating one scanned code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    /// Checked in. The record is the one before the increment.
    Success { trustee: Trustee },
    /// Refused, with the record when one was found
    Failure {
        reason: FailureReason,
        trustee: Option<Trustee>,
    },
}

impl CheckInOutcome {
    pub fn failure(reason: FailureReason, trustee: Option<Trustee>) -> Self {
        CheckInOutcome::Failure { reason, trustee }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckInOutcome::Success { .. })
    }

    pub fn trustee(&self) -> Option<&Trustee> {
        match self {
            CheckInOutcome::Success { trustee } => Some(trustee),
            CheckInOutcome::Failure { trustee, .. } => trustee.as_ref(),
        }
    }
}

/// Check-in response body
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub success: bool,
    /// Failure reason code, absent on success
    pub reason: Option<FailureReason>,
    /// Operator-facing failure message, absent on success
    pub message: Option<String>,
    pub trustee: Option<Trustee>,
    /// Today's check-in number for the trustee, including this one
    pub scan_number: Option<i32>,
}

impl From<CheckInOutcome> for CheckInResponse {
    fn from(outcome: CheckInOutcome) -> Self {
        match outcome {
            CheckInOutcome::Success { trustee } => CheckInResponse {
                success: true,
                reason: None,
                message: None,
                scan_number: Some(trustee.daily_scan_count + 1),
                trustee: Some(trustee),
            },
            CheckInOutcome::Failure { reason, trustee } => CheckInResponse {
                success: false,
                reason: Some(reason),
                message: Some(reason.message().to_string()),
                scan_number: None,
                trustee,
            },
        }
    }
}

impl CheckInResponse {
    /// Rebuild the outcome on the kiosk side. `None` when the body is inconsistent.
    pub fn into_outcome(self) -> Option<CheckInOutcome> {
        match (self.success, self.reason, self.trustee) {
            (true, _, Some(trustee)) => Some(CheckInOutcome::Success { trustee }),
            (false, Some(reason), trustee) => Some(CheckInOutcome::Failure { reason, trustee }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn trustee() -> Trustee {
        Trustee {
            id: Uuid::new_v4(),
            first_name: "Alice".to_string(),
            last_name: "Patel".to_string(),
            qr_code_value: "QR-1".to_string(),
            gaam: "Gaam1".to_string(),
            daily_scan_count: 1,
            family_size_limit: 3,
            last_scan_date: None,
            created_at: None,
        }
    }

    #[test]
    fn test_success_response_shows_next_count() {
        let response = CheckInResponse::from(CheckInOutcome::Success { trustee: trustee() });
        assert!(response.success);
        assert_eq!(response.scan_number, Some(2));
        assert!(response.message.is_none());
    }

    #[test]
    fn test_failure_response_carries_message() {
        let response =
            CheckInResponse::from(CheckInOutcome::failure(FailureReason::NotFound, None));
        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("QR Code not found"));
        assert_eq!(
            response.into_outcome(),
            Some(CheckInOutcome::failure(FailureReason::NotFound, None))
        );
    }

    #[test]
    fn test_inconsistent_response_is_rejected() {
        let response = CheckInResponse {
            success: true,
            reason: None,
            message: None,
            trustee: None,
            scan_number: None,
        };
        assert!(response.into_outcome().is_none());
    }
}
