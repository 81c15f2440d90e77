//! Kiosk scanner session
//!
//! Drives one decoder at a time through
//! `Idle -> Scanning -> Processing -> SuccessDisplay | FailureDisplay -> Scanning`.
//! The decoder is stopped and released before a decoded code is validated,
//! and every restart acquires a fresh decoder from the [`DecoderRegistry`].

pub mod decoder;
pub mod feedback;
pub mod registry;

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
    config::ScannerConfig,
    models::{CheckInOutcome, RecentScan},
    services::Services,
};

use decoder::{DecodeEvent, DecoderConfig};
use feedback::Feedback;
use registry::DecoderRegistry;

pub const UNABLE_TO_START: &str = "Unable to start the camera scanner.";
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred during scanning.";

/// Validation backend used by the session: the server API or in-process services
#[async_trait]
pub trait CheckInValidator: Send + Sync {
    async fn validate(&self, qr_code: &str, scanned_by: Option<&str>) -> anyhow::Result<CheckInOutcome>;

    async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> anyhow::Result<Vec<RecentScan>>;
}

#[async_trait]
impl CheckInValidator for Services {
    async fn validate(&self, qr_code: &str, scanned_by: Option<&str>) -> anyhow::Result<CheckInOutcome> {
        Ok(self.checkin.validate(qr_code, scanned_by).await?)
    }

    async fn recent_scans(&self, trustee_id: Uuid, limit: i64) -> anyhow::Result<Vec<RecentScan>> {
        Ok(self.scan_logs.recent_for_trustee(trustee_id, Some(limit)).await?)
    }
}

/// What the operator sees after a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanDisplay {
    /// Decoded text as read
    pub scanned: String,
    pub outcome: CheckInOutcome,
    /// Recent activity of the matched trustee. `None` when there is no
    /// trustee or the history could not be loaded.
    pub recent: Option<Vec<RecentScan>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Scanning,
    Processing { scanned: String },
    SuccessDisplay(ScanDisplay),
    FailureDisplay(ScanDisplay),
    /// Stopped on a device or unexpected error; needs an explicit restart
    Faulted { message: String },
}

/// Operator actions while the session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    ScanNext,
    Stop,
}

/// Why [`ScannerSession::run`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionExit {
    Stopped,
    /// The decoder closed its event stream (input ended or torn down)
    DecoderClosed,
    Faulted { message: String },
}

pub struct ScannerSession<V, F> {
    registry: DecoderRegistry,
    validator: V,
    feedback: F,
    decoder_config: DecoderConfig,
    operator: Option<String>,
    recent_limit: i64,
    auto_restart: Option<Duration>,
    state: SessionState,
    events: Option<mpsc::Receiver<DecodeEvent>>,
}

impl<V, F> ScannerSession<V, F>
where
    V: CheckInValidator,
    F: Feedback,
{
    pub fn new(
        registry: DecoderRegistry,
        validator: V,
        feedback: F,
        config: &ScannerConfig,
        operator: Option<String>,
    ) -> Self {
        Self {
            registry,
            validator,
            feedback,
            decoder_config: DecoderConfig::from(config),
            operator,
            recent_limit: config.recent_scans,
            auto_restart: config.auto_restart(),
            state: SessionState::Idle,
            events: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Acquire a decoder and start scanning. Also the retry action of a
    /// faulted session.
    pub async fn start(&mut self) -> &SessionState {
        if self.state == SessionState::Scanning && self.events.is_some() {
            return &self.state;
        }

        match self.registry.acquire(&self.decoder_config).await {
            Ok(events) => {
                self.events = Some(events);
                self.state = SessionState::Scanning;
                self.feedback.scanning().await;
            }
            Err(e) => {
                tracing::error!("Unable to start scanner: {}", e);
                self.events = None;
                self.fault(UNABLE_TO_START).await;
            }
        }
        &self.state
    }

    /// Wait for the next decoded code and process it
    pub async fn scan_once(&mut self) -> &SessionState {
        if self.state != SessionState::Scanning {
            return &self.state;
        }

        match next_decode(&mut self.events).await {
            Some(code) => self.process(code).await,
            None => self.decoder_closed().await,
        }
        &self.state
    }

    /// Leave a result screen and scan again with a fresh decoder
    pub async fn scan_next(&mut self) -> &SessionState {
        match self.state {
            SessionState::SuccessDisplay(_)
            | SessionState::FailureDisplay(_)
            | SessionState::Faulted { .. } => self.start().await,
            _ => &self.state,
        }
    }

    /// Release the decoder whatever the current state
    pub async fn teardown(&mut self) {
        self.events = None;
        self.registry.release().await;
        self.state = SessionState::Idle;
    }

    /// Run scan cycles until stopped, the decoder closes or the session faults.
    /// Result screens restart on their own after the configured delay, or on
    /// `ScanNext`.
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<SessionCommand>) -> SessionExit {
        self.start().await;

        let exit = loop {
            match self.state {
                SessionState::Scanning => {
                    let decoded = tokio::select! {
                        decoded = next_decode(&mut self.events) => decoded,
                        command = commands.recv() => match command {
                            Some(SessionCommand::ScanNext) => continue,
                            Some(SessionCommand::Stop) | None => break SessionExit::Stopped,
                        },
                    };
                    match decoded {
                        Some(code) => self.process(code).await,
                        None => {
                            self.decoder_closed().await;
                            break SessionExit::DecoderClosed;
                        }
                    }
                }
                SessionState::SuccessDisplay(_) | SessionState::FailureDisplay(_) => {
                    let command = match self.auto_restart {
                        Some(delay) => tokio::select! {
                            _ = tokio::time::sleep(delay) => Some(SessionCommand::ScanNext),
                            command = commands.recv() => command,
                        },
                        None => commands.recv().await,
                    };
                    match command {
                        Some(SessionCommand::ScanNext) => {
                            self.scan_next().await;
                        }
                        Some(SessionCommand::Stop) | None => break SessionExit::Stopped,
                    }
                }
                SessionState::Faulted { ref message } => {
                    break SessionExit::Faulted {
                        message: message.clone(),
                    }
                }
                SessionState::Idle | SessionState::Processing { .. } => break SessionExit::Stopped,
            }
        };

        self.teardown().await;
        exit
    }

    async fn process(&mut self, scanned: String) {
        // Stop before validating so the same code is not decoded twice
        // while the request is in flight
        self.events = None;
        self.registry.release().await;
        self.state = SessionState::Processing {
            scanned: scanned.clone(),
        };
        tracing::debug!(code = %scanned, "Processing scan");

        let outcome = match self
            .validator
            .validate(&scanned, self.operator.as_deref())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Scan processing error: {:#}", e);
                self.fault(UNEXPECTED_ERROR).await;
                return;
            }
        };

        let recent = match outcome.trustee() {
            Some(trustee) => match self.validator.recent_scans(trustee.id, self.recent_limit).await {
                Ok(scans) => Some(scans),
                Err(e) => {
                    tracing::warn!(trustee_id = %trustee.id, "Error fetching recent scans: {:#}", e);
                    None
                }
            },
            None => None,
        };

        let display = ScanDisplay {
            scanned,
            outcome,
            recent,
        };

        if display.outcome.is_success() {
            self.feedback.success(&display).await;
            self.state = SessionState::SuccessDisplay(display);
        } else {
            self.feedback.failure(&display).await;
            self.state = SessionState::FailureDisplay(display);
        }
    }

    async fn decoder_closed(&mut self) {
        tracing::info!("Decoder closed, scanning stopped");
        self.events = None;
        self.registry.release().await;
        self.state = SessionState::Idle;
    }

    async fn fault(&mut self, message: &str) {
        self.feedback.fault(message).await;
        self.state = SessionState::Faulted {
            message: message.to_string(),
        };
    }
}

/// First decoded code of the subscription; frame errors are skipped.
/// `None` once the decoder has closed its stream.
async fn next_decode(events: &mut Option<mpsc::Receiver<DecodeEvent>>) -> Option<String> {
    let events = events.as_mut()?;
    while let Some(event) = events.recv().await {
        match event {
            DecodeEvent::Decoded(code) => return Some(code),
            DecodeEvent::FrameError(e) => tracing::debug!("QR scan error: {}", e),
        }
    }
    None
}
