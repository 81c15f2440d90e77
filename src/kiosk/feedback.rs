//! Operator feedback: audible cue, flash and result display

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use qrcode::{render::unicode::Dense1x2, QrCode};

use super::ScanDisplay;
use crate::models::CheckInOutcome;

/// How long a flash stays on screen
pub const FLASH_DURATION: Duration = Duration::from_millis(300);

#[async_trait]
pub trait Feedback: Send + Sync {
    /// Decoder is running and waiting for a code
    async fn scanning(&self) {}

    async fn success(&self, display: &ScanDisplay);

    async fn failure(&self, display: &ScanDisplay);

    /// The session stopped and needs an explicit restart
    async fn fault(&self, message: &str);
}

/// ANSI terminal rendering of the kiosk screen
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalFeedback;

const GREEN: &str = "\x1b[42;30m";
const RED: &str = "\x1b[41;37m";
const RESET: &str = "\x1b[0m";
const BELL: &str = "\x07";

impl TerminalFeedback {
    async fn flash(&self, color: &str, title: &str) {
        print_out(&format!("{color} {title} {RESET}\n"));
        tokio::time::sleep(FLASH_DURATION).await;
    }

    /// Text block shown under the flash. A refused code is echoed back as a QR
    /// image so the operator can compare it with the card.
    fn details(&self, display: &ScanDisplay) -> String {
        let mut out = String::new();
        if let Some(trustee) = display.outcome.trustee() {
            out.push_str(&format!("  {}\n  Gaam: {}\n", trustee.full_name(), trustee.gaam));
        }
        match &display.outcome {
            CheckInOutcome::Success { trustee } => {
                out.push_str(&format!(
                    "  Scan {} of {} today\n",
                    trustee.daily_scan_count + 1,
                    trustee.family_size_limit
                ));
            }
            CheckInOutcome::Failure { reason, .. } => {
                out.push_str(&format!("  {}\n  Scanned: {}\n", reason.message(), display.scanned));
                if let Some(image) = render_qr(&display.scanned) {
                    out.push_str(&image);
                    out.push('\n');
                }
            }
        }
        match &display.recent {
            Some(scans) if !scans.is_empty() => {
                out.push_str("  Recent scans:\n");
                for scan in scans {
                    out.push_str(&format!(
                        "    {}\n",
                        scan.scan_time.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
                    ));
                }
            }
            Some(_) => {}
            None if display.outcome.trustee().is_some() => {
                out.push_str("  Recent scans unavailable\n");
            }
            None => {}
        }
        out
    }
}

#[async_trait]
impl Feedback for TerminalFeedback {
    async fn scanning(&self) {
        print_out("Ready - scan a QR code\n");
    }

    async fn success(&self, display: &ScanDisplay) {
        print_out(BELL);
        self.flash(GREEN, "Check-In Successful").await;
        print_out(&self.details(display));
    }

    async fn failure(&self, display: &ScanDisplay) {
        self.flash(RED, "Check-In Failed").await;
        print_out(&self.details(display));
    }

    async fn fault(&self, message: &str) {
        print_out(&format!("{RED} Error {RESET}\n  {message}\n"));
    }
}

/// Half-block rendering of `value`, or `None` when it does not fit in a QR code
fn render_qr(value: &str) -> Option<String> {
    match QrCode::new(value.as_bytes()) {
        Ok(code) => Some(
            code.render::<Dense1x2>()
                .dark_color(Dense1x2::Light)
                .light_color(Dense1x2::Dark)
                .quiet_zone(true)
                .build(),
        ),
        Err(e) => {
            tracing::debug!("Scanned value not rendered as QR: {}", e);
            None
        }
    }
}

fn print_out(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        tracing::warn!("Failed to write to terminal: {}", e);
    }
}
