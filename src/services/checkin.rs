//! Check-in validation service
//!
//! Validates a scanned QR code: trustee lookup, daily reset, quota check,
//! then the log row and count increment committed together.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::{
    error::{AppResult, CheckInWriteError},
    models::{CheckInOutcome, FailureReason},
    repository::{CheckInStore, CheckInWrite},
};

/// Source of the current calendar day
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Clone)]
pub struct CheckInService {
    store: Arc<dyn CheckInStore>,
    clock: Arc<dyn Clock>,
}

impl CheckInService {
    pub fn new(store: Arc<dyn CheckInStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Validate a scanned code and record the check-in.
    ///
    /// Business refusals (unknown code, quota reached, failed writes) are
    /// `Ok(CheckInOutcome::Failure)`. Only an unexpected lookup error is `Err`.
    pub async fn validate(&self, qr_code: &str, scanned_by: Option<&str>) -> AppResult<CheckInOutcome> {
        let qr_code = qr_code.trim();

        let Some(mut trustee) = self.store.find_trustee_by_qr_code(qr_code).await? else {
            tracing::info!(qr_code, "Check-in refused: unknown QR code");
            return Ok(CheckInOutcome::failure(FailureReason::NotFound, None));
        };

        let today = self.clock.today();
        let reset_date = trustee.needs_reset(today).then_some(today);
        if reset_date.is_some() {
            trustee.daily_scan_count = 0;
            trustee.last_scan_date = Some(today);
        }

        if trustee.limit_reached() {
            if reset_date.is_some() {
                if let Err(e) = self.store.reset_daily_count(trustee.id, today).await {
                    tracing::error!(trustee_id = %trustee.id, "Daily count reset failed: {}", e);
                    return Ok(CheckInOutcome::failure(FailureReason::ResetFailed, Some(trustee)));
                }
            }
            tracing::info!(
                trustee_id = %trustee.id,
                count = trustee.daily_scan_count,
                limit = trustee.family_size_limit,
                "Check-in refused: daily limit reached"
            );
            return Ok(CheckInOutcome::failure(FailureReason::LimitReached, Some(trustee)));
        }

        let write = CheckInWrite {
            trustee_id: trustee.id,
            reset_date,
            scanned_by: scanned_by.map(str::to_string),
        };

        match self.store.commit_check_in(&write).await {
            Ok(committed) => {
                // Concurrent kiosks may have checked in since the lookup;
                // report the count the write actually produced
                trustee.daily_scan_count = committed.daily_scan_count - 1;
                trustee.last_scan_date = Some(today);
                tracing::info!(
                    trustee_id = %trustee.id,
                    log_id = %committed.log.id,
                    scan_number = committed.daily_scan_count,
                    "Check-in recorded"
                );
                Ok(CheckInOutcome::Success { trustee })
            }
            Err(e) => {
                let reason = match &e {
                    CheckInWriteError::Reset(_) => FailureReason::ResetFailed,
                    CheckInWriteError::Log(_) => FailureReason::LogFailed,
                    CheckInWriteError::Increment(_) => FailureReason::IncrementFailed,
                    CheckInWriteError::LimitReached => FailureReason::LimitReached,
                };
                tracing::warn!(trustee_id = %trustee.id, "Check-in not recorded: {}", e);
                Ok(CheckInOutcome::failure(reason, Some(trustee)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        models::{CheckInResponse, ScanLog, Trustee},
        repository::{memory::MemoryStore, CommittedCheckIn, MockCheckInStore},
    };
    use uuid::Uuid;

    struct FixedClock(NaiveDate);

    impl Clock for FixedClock {
        fn today(&self) -> NaiveDate {
            self.0
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 2).unwrap()
    }

    fn yesterday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    fn trustee(count: i32, limit: i32, last: Option<NaiveDate>) -> Trustee {
        Trustee {
            id: Uuid::new_v4(),
            first_name: "Alice".to_string(),
            last_name: "Patel".to_string(),
            qr_code_value: "QR-ALICE".to_string(),
            gaam: "Gaam1".to_string(),
            daily_scan_count: count,
            family_size_limit: limit,
            last_scan_date: last,
            created_at: None,
        }
    }

    fn service(store: Arc<dyn CheckInStore>) -> CheckInService {
        CheckInService::new(store, Arc::new(FixedClock(today())))
    }

    #[tokio::test]
    async fn test_first_scan_of_day_resets_then_succeeds() {
        let t = trustee(0, 2, Some(yesterday()));
        let id = t.id;
        let store = Arc::new(MemoryStore::with_trustees(vec![t]));

        let outcome = service(store.clone()).validate("QR-ALICE", Some("desk-1")).await.unwrap();

        match outcome {
            CheckInOutcome::Success { trustee } => {
                assert_eq!(trustee.daily_scan_count, 0);
                assert_eq!(trustee.last_scan_date, Some(today()));
            }
            other => panic!("expected success, got {:?}", other),
        }
        let stored = store.trustee(id).unwrap();
        assert_eq!(stored.daily_scan_count, 1);
        assert_eq!(stored.last_scan_date, Some(today()));
        assert_eq!(store.log_count(), 1);
        assert_eq!(store.logs.lock().unwrap()[0].scanned_by.as_deref(), Some("desk-1"));
    }

    #[tokio::test]
    async fn test_stale_count_is_reset_before_quota_check() {
        // Yesterday's full quota must not block today's first scan
        let t = trustee(2, 2, Some(yesterday()));
        let id = t.id;
        let store = Arc::new(MemoryStore::with_trustees(vec![t]));

        let outcome = service(store.clone()).validate("QR-ALICE", None).await.unwrap();

        assert!(outcome.is_success());
        assert_eq!(store.trustee(id).unwrap().daily_scan_count, 1);
    }

    #[tokio::test]
    async fn test_limit_reached_writes_nothing() {
        let t = trustee(2, 2, Some(today()));
        let id = t.id;
        let store = Arc::new(MemoryStore::with_trustees(vec![t]));

        let outcome = service(store.clone()).validate("QR-ALICE", None).await.unwrap();

        match outcome {
            CheckInOutcome::Failure { reason, trustee } => {
                assert_eq!(reason, FailureReason::LimitReached);
                assert_eq!(reason.message(), "Daily scan limit reached");
                assert_eq!(trustee.unwrap().daily_scan_count, 2);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(store.trustee(id).unwrap().daily_scan_count, 2);
        assert_eq!(store.log_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_code() {
        let t = trustee(0, 2, Some(today()));
        let store = Arc::new(MemoryStore::with_trustees(vec![t.clone()]));

        let outcome = service(store.clone()).validate("QR-NOBODY", None).await.unwrap();

        assert_eq!(outcome, CheckInOutcome::failure(FailureReason::NotFound, None));
        assert_eq!(store.trustee(t.id).unwrap(), t);
        assert_eq!(store.log_count(), 0);
    }

    #[tokio::test]
    async fn test_same_day_scans_do_not_reset_again() {
        let t = trustee(0, 3, Some(yesterday()));
        let id = t.id;
        let store = Arc::new(MemoryStore::with_trustees(vec![t]));
        let service = service(store.clone());

        for expected in 1..=3 {
            let outcome = service.validate("QR-ALICE", None).await.unwrap();
            assert!(outcome.is_success());
            assert_eq!(store.trustee(id).unwrap().daily_scan_count, expected);
        }

        let outcome = service.validate("QR-ALICE", None).await.unwrap();
        assert!(!outcome.is_success());
        assert_eq!(store.trustee(id).unwrap().daily_scan_count, 3);
        assert_eq!(store.log_count(), 3);
    }

    #[tokio::test]
    async fn test_code_is_trimmed() {
        let store = Arc::new(MemoryStore::with_trustees(vec![trustee(0, 1, None)]));
        let outcome = service(store).validate("  QR-ALICE\n", None).await.unwrap();
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_log_failure_leaves_count_untouched() {
        let t = trustee(1, 3, Some(today()));
        let id = t.id;
        let store = Arc::new(MemoryStore::with_trustees(vec![t]));
        *store.fail_log_insert.lock().unwrap() = true;

        let outcome = service(store.clone()).validate("QR-ALICE", None).await.unwrap();

        match outcome {
            CheckInOutcome::Failure { reason, trustee } => {
                assert_eq!(reason, FailureReason::LogFailed);
                assert_eq!(reason.message(), "Error logging the scan");
                assert!(trustee.is_some());
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(store.trustee(id).unwrap().daily_scan_count, 1);
        assert_eq!(store.log_count(), 0);
    }

    #[tokio::test]
    async fn test_write_step_failures_map_to_reasons() {
        let cases = [
            (
                CheckInWriteError::Reset(AppError::Internal("down".to_string())),
                FailureReason::ResetFailed,
            ),
            (
                CheckInWriteError::Increment(AppError::Internal("down".to_string())),
                FailureReason::IncrementFailed,
            ),
            (CheckInWriteError::LimitReached, FailureReason::LimitReached),
        ];

        for (error, expected) in cases {
            let t = trustee(0, 2, Some(yesterday()));
            let mut store = MockCheckInStore::new();
            let found = t.clone();
            store
                .expect_find_trustee_by_qr_code()
                .returning(move |_| Ok(Some(found.clone())));
            let mut error = Some(error);
            store
                .expect_commit_check_in()
                .withf(|write| write.reset_date == Some(today()))
                .times(1)
                .returning(move |_| Err(error.take().unwrap()));

            let outcome = service(Arc::new(store)).validate("QR-ALICE", None).await.unwrap();

            match outcome {
                CheckInOutcome::Failure { reason, trustee } => {
                    assert_eq!(reason, expected);
                    assert_eq!(trustee.map(|t| t.id), Some(t.id));
                }
                other => panic!("expected failure, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_success_reports_committed_count() {
        // Another kiosk checked the same trustee in between lookup and commit
        let t = trustee(0, 3, Some(today()));
        let mut store = MockCheckInStore::new();
        let found = t.clone();
        store
            .expect_find_trustee_by_qr_code()
            .returning(move |_| Ok(Some(found.clone())));
        let trustee_id = t.id;
        store.expect_commit_check_in().times(1).returning(move |write| {
            Ok(CommittedCheckIn {
                log: ScanLog {
                    id: Uuid::new_v4(),
                    trustee_id,
                    scan_time: chrono::Utc::now(),
                    scanned_by: write.scanned_by.clone(),
                },
                daily_scan_count: 2,
            })
        });

        let outcome = service(Arc::new(store)).validate("QR-ALICE", Some("desk-2")).await.unwrap();

        match &outcome {
            CheckInOutcome::Success { trustee } => {
                assert_eq!(trustee.daily_scan_count, 1);
                assert_eq!(trustee.last_scan_date, Some(today()));
            }
            other => panic!("expected success, got {:?}", other),
        }
        assert_eq!(CheckInResponse::from(outcome).scan_number, Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_check_ins_get_distinct_scan_numbers() {
        let t = trustee(0, 2, Some(today()));
        let store = Arc::new(MemoryStore::with_trustees(vec![t]));
        let service = service(store.clone());

        let (first, second) = tokio::join!(
            service.validate("QR-ALICE", Some("desk-1")),
            service.validate("QR-ALICE", Some("desk-2"))
        );
        let mut numbers: Vec<Option<i32>> = [first.unwrap(), second.unwrap()]
            .into_iter()
            .map(|o| CheckInResponse::from(o).scan_number)
            .collect();
        numbers.sort();

        assert_eq!(numbers, vec![Some(1), Some(2)]);
        assert_eq!(store.log_count(), 2);
    }

    #[tokio::test]
    async fn test_reset_failure_on_full_quota() {
        // A limit of zero can only be hit right after a reset
        let t = trustee(0, 0, Some(yesterday()));
        let mut store = MockCheckInStore::new();
        let found = t.clone();
        store
            .expect_find_trustee_by_qr_code()
            .returning(move |_| Ok(Some(found.clone())));
        store
            .expect_reset_daily_count()
            .times(1)
            .returning(|_, _| Err(AppError::Internal("down".to_string())));
        store.expect_commit_check_in().never();

        let outcome = service(Arc::new(store)).validate("QR-ALICE", None).await.unwrap();

        assert!(matches!(
            outcome,
            CheckInOutcome::Failure { reason: FailureReason::ResetFailed, trustee: Some(_) }
        ));
    }

    #[tokio::test]
    async fn test_lookup_error_is_unexpected() {
        let mut store = MockCheckInStore::new();
        store
            .expect_find_trustee_by_qr_code()
            .returning(|_| Err(AppError::Internal("connection refused".to_string())));

        let result = service(Arc::new(store)).validate("QR-ALICE", None).await;

        assert!(result.is_err());
    }
}
