//! Decoder devices
//!
//! A decoder is acquired as a subscription: the device is started with a
//! [`DecoderConfig`] and yields decode events on a channel until it is
//! stopped, which closes the channel.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader, Lines},
    sync::{mpsc, Mutex},
    task::JoinHandle,
};

use crate::config::ScannerConfig;

/// Capacity of the decode event channel
const EVENT_BUFFER: usize = 16;

#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("camera access denied: {0}")]
    PermissionDenied(String),

    #[error("no camera available: {0}")]
    Unavailable(String),

    #[error("failed to stop decoder: {0}")]
    Stop(String),
}

/// Acquisition parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Viewport region the decoder renders into
    pub viewport: String,
    pub fps: u32,
    /// Side of the square detection box, in pixels
    pub qrbox: u32,
    pub facing_mode: String,
}

impl From<&ScannerConfig> for DecoderConfig {
    fn from(config: &ScannerConfig) -> Self {
        Self {
            viewport: config.viewport.clone(),
            fps: config.fps,
            qrbox: config.qrbox,
            facing_mode: config.facing_mode.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// A code was read
    Decoded(String),
    /// A frame could not be decoded. Not fatal.
    FrameError(String),
}

/// A started decoder and the events it produces
pub struct Subscription {
    pub decoder: Box<dyn ActiveDecoder>,
    pub events: mpsc::Receiver<DecodeEvent>,
}

/// Device that can start decoders
#[async_trait]
pub trait Camera: Send + Sync {
    async fn open(&self, config: &DecoderConfig) -> Result<Subscription, DeviceError>;
}

/// Handle on a running decoder
#[async_trait]
pub trait ActiveDecoder: Send {
    /// Stop decoding and release the device. Closes the event channel.
    async fn stop(&mut self) -> Result<(), DeviceError>;
}

/// Keyboard-wedge scanner: every input line is one decoded code.
/// Blank lines count as unreadable frames.
pub struct LineCamera<R> {
    lines: Arc<Mutex<Lines<BufReader<R>>>>,
}

impl<R> LineCamera<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(reader).lines())),
        }
    }
}

impl LineCamera<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[async_trait]
impl<R> Camera for LineCamera<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    async fn open(&self, config: &DecoderConfig) -> Result<Subscription, DeviceError> {
        tracing::debug!(
            viewport = %config.viewport,
            fps = config.fps,
            qrbox = config.qrbox,
            facing_mode = %config.facing_mode,
            "Starting line scanner"
        );

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let lines = self.lines.clone();

        let task = tokio::spawn(async move {
            loop {
                let Ok(permit) = tx.reserve().await else {
                    break;
                };
                // next_line is cancel safe, so aborting the task here loses nothing
                let next = lines.lock().await.next_line().await;
                match next {
                    Ok(Some(line)) => {
                        let code = line.trim();
                        if code.is_empty() {
                            permit.send(DecodeEvent::FrameError("empty scan".to_string()));
                        } else {
                            permit.send(DecodeEvent::Decoded(code.to_string()));
                        }
                    }
                    Ok(None) => {
                        tracing::info!("Scanner input closed");
                        break;
                    }
                    Err(e) => permit.send(DecodeEvent::FrameError(e.to_string())),
                }
            }
        });

        Ok(Subscription {
            decoder: Box::new(LineDecoder { task: Some(task) }),
            events: rx,
        })
    }
}

struct LineDecoder {
    task: Option<JoinHandle<()>>,
}

#[async_trait]
impl ActiveDecoder for LineDecoder {
    async fn stop(&mut self) -> Result<(), DeviceError> {
        if let Some(task) = self.task.take() {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(DeviceError::Stop(e.to_string())),
            }
        }
        Ok(())
    }
}

impl Drop for LineDecoder {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
