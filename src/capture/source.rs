use async_trait::async_trait;
use log::{info, warn};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Mutex;

use crate::error::CaptureError;

use super::Frame;

/// Platform media device: permission prompt, stream handle and frame access.
#[async_trait]
pub trait MediaDevice: Send + Sync {
    /// Requests the camera stream. Turns the hardware indicator on when it succeeds.
    async fn open(&self) -> Result<(), CaptureError>;

    /// Most recent decoded frame of the open stream.
    fn latest_frame(&self) -> Option<Frame>;

    /// Stops the stream and turns the hardware indicator off.
    fn close(&self);
}

/// Owns the camera for the panel.
///
/// Acquiring twice fails with [`CaptureError::AlreadyAcquired`]; releasing is
/// idempotent. Dropping an acquired source releases the device.
pub struct CaptureSource {
    device: Arc<dyn MediaDevice>,
    acquired: AtomicBool,
    acquire_lock: Mutex<()>,
}

impl CaptureSource {
    pub fn new(device: Arc<dyn MediaDevice>) -> Self {
        Self {
            device,
            acquired: AtomicBool::new(false),
            acquire_lock: Mutex::new(()),
        }
    }

    pub async fn acquire(&self) -> Result<(), CaptureError> {
        // Held across the permission prompt so two callers cannot both open the device.
        let _guard = self.acquire_lock.lock().await;
        if self.acquired.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyAcquired);
        }

        match self.device.open().await {
            Ok(()) => {
                self.acquired.store(true, Ordering::SeqCst);
                info!("camera acquired");
                Ok(())
            }
            Err(CaptureError::DeviceUnavailable(reason)) => {
                warn!("camera unavailable: {reason}");
                Err(CaptureError::DeviceUnavailable(reason))
            }
            Err(other) => {
                warn!("camera open failed: {other}");
                Err(CaptureError::DeviceUnavailable(other.to_string()))
            }
        }
    }

    pub fn current_frame(&self) -> Result<Frame, CaptureError> {
        if !self.acquired.load(Ordering::SeqCst) {
            return Err(CaptureError::NoFrameYet);
        }
        self.device.latest_frame().ok_or(CaptureError::NoFrameYet)
    }

    pub fn release(&self) {
        if self.acquired.swap(false, Ordering::SeqCst) {
            self.device.close();
            info!("camera released");
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired.load(Ordering::SeqCst)
    }

    /// The camera light is on exactly while the device is held.
    pub fn indicator_lit(&self) -> bool {
        self.is_acquired()
    }
}

impl Drop for CaptureSource {
    fn drop(&mut self) {
        self.release();
    }
}
