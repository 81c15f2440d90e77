//! Ownership of the active decoder
//!
//! The registry is the single place a decoder is started from. Starting a
//! new one stops the previous instance first, so at most one decoder holds
//! the camera at any time. A [`TeardownHandle`] lets code outside the
//! scanner session (navigation, shutdown) release the camera.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use super::decoder::{ActiveDecoder, Camera, DecodeEvent, DecoderConfig, DeviceError, Subscription};

type Slot = Arc<Mutex<Option<Box<dyn ActiveDecoder>>>>;

#[derive(Clone)]
pub struct DecoderRegistry {
    camera: Arc<dyn Camera>,
    active: Slot,
}

impl DecoderRegistry {
    pub fn new(camera: Arc<dyn Camera>) -> Self {
        Self {
            camera,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a fresh decoder and return its event stream
    pub async fn acquire(&self, config: &DecoderConfig) -> Result<mpsc::Receiver<DecodeEvent>, DeviceError> {
        let mut slot = self.active.lock().await;
        if let Some(mut previous) = slot.take() {
            tracing::warn!("Decoder still active on acquire, stopping it");
            stop_decoder(previous.as_mut()).await;
        }

        let Subscription { decoder, events } = self.camera.open(config).await?;
        *slot = Some(decoder);
        Ok(events)
    }

    /// Stop and release the active decoder. Returns false when none was active.
    pub async fn release(&self) -> bool {
        release_slot(&self.active).await
    }

    pub async fn is_active(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Handle to force-release the camera from outside the session
    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            active: self.active.clone(),
        }
    }
}

/// Releases whatever decoder is active, regardless of session state
#[derive(Clone)]
pub struct TeardownHandle {
    active: Slot,
}

impl TeardownHandle {
    pub async fn teardown(&self) {
        if release_slot(&self.active).await {
            tracing::info!("Scanner stopped by teardown");
        }
    }
}

async fn release_slot(active: &Slot) -> bool {
    let Some(mut decoder) = active.lock().await.take() else {
        return false;
    };
    stop_decoder(decoder.as_mut()).await;
    true
}

/// Stop failures are logged; the instance is dropped either way
async fn stop_decoder(decoder: &mut dyn ActiveDecoder) {
    if let Err(e) = decoder.stop().await {
        tracing::error!("Error stopping decoder: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::config::ScannerConfig;

    #[derive(Default)]
    struct CountingCamera {
        opened: AtomicUsize,
        stopped: Arc<AtomicUsize>,
    }

    struct CountingDecoder {
        stopped: Arc<AtomicUsize>,
        _events: mpsc::Sender<DecodeEvent>,
    }

    #[async_trait]
    impl ActiveDecoder for CountingDecoder {
        async fn stop(&mut self) -> Result<(), DeviceError> {
            self.stopped.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl Camera for CountingCamera {
        async fn open(&self, _config: &DecoderConfig) -> Result<Subscription, DeviceError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = mpsc::channel(1);
            Ok(Subscription {
                decoder: Box::new(CountingDecoder {
                    stopped: self.stopped.clone(),
                    _events: tx,
                }),
                events: rx,
            })
        }
    }

    fn config() -> DecoderConfig {
        DecoderConfig::from(&ScannerConfig::default())
    }

    #[tokio::test]
    async fn test_acquire_stops_previous_instance() {
        let camera = Arc::new(CountingCamera::default());
        let registry = DecoderRegistry::new(camera.clone());

        let _first = registry.acquire(&config()).await.unwrap();
        let _second = registry.acquire(&config()).await.unwrap();

        assert_eq!(camera.opened.load(Ordering::SeqCst), 2);
        assert_eq!(camera.stopped.load(Ordering::SeqCst), 1);
        assert!(registry.is_active().await);
    }

    #[tokio::test]
    async fn test_release() {
        let camera = Arc::new(CountingCamera::default());
        let registry = DecoderRegistry::new(camera.clone());

        assert!(!registry.release().await);
        let _events = registry.acquire(&config()).await.unwrap();
        assert!(registry.release().await);
        assert!(!registry.is_active().await);
        assert_eq!(camera.stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_teardown_handle_releases_camera() {
        let camera = Arc::new(CountingCamera::default());
        let registry = DecoderRegistry::new(camera.clone());
        let teardown = registry.teardown_handle();

        let mut events = registry.acquire(&config()).await.unwrap();
        teardown.teardown().await;

        assert!(!registry.is_active().await);
        assert_eq!(camera.stopped.load(Ordering::SeqCst), 1);
        // The decoder's sender was dropped with it
        assert_eq!(events.recv().await, None);
    }
}
