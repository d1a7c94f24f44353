use async_trait::async_trait;
use image::RgbImage;
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
};

use crate::error::CaptureError;

use super::{Frame, MediaDevice};

/// Serves a single decoded image file as a live stream.
///
/// Used on hosts without a camera and for demos. Every `latest_frame` call
/// stamps the image as a new frame.
pub struct StillImageDevice {
    path: PathBuf,
    image: Mutex<Option<Arc<RgbImage>>>,
    sequence: AtomicU64,
}

impl StillImageDevice {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            image: Mutex::new(None),
            sequence: AtomicU64::new(0),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Arc<RgbImage>>> {
        match self.image.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl MediaDevice for StillImageDevice {
    async fn open(&self) -> Result<(), CaptureError> {
        let path = self.path.clone();
        let decoded = tokio::task::spawn_blocking(move || image::open(&path))
            .await
            .map_err(|err| CaptureError::DeviceUnavailable(format!("decoder worker failed: {err}")))?
            .map_err(|err| {
                CaptureError::DeviceUnavailable(format!("{}: {err}", self.path.display()))
            })?;

        *self.slot() = Some(Arc::new(decoded.to_rgb8()));
        Ok(())
    }

    fn latest_frame(&self) -> Option<Frame> {
        let image = self.slot().clone()?;
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Some(Frame::from_shared(sequence, image))
    }

    fn close(&self) {
        self.slot().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[tokio::test]
    async fn serves_decoded_file_with_increasing_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.png");
        RgbImage::from_pixel(8, 6, Rgb([200, 180, 160])).save(&path).unwrap();

        let device = StillImageDevice::new(&path);
        assert!(device.latest_frame().is_none());

        device.open().await.unwrap();
        let first = device.latest_frame().unwrap();
        let second = device.latest_frame().unwrap();
        assert_eq!((first.width(), first.height()), (8, 6));
        assert!(second.sequence > first.sequence);

        device.close();
        assert!(device.latest_frame().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_device_unavailable() {
        let device = StillImageDevice::new("/definitely/not/here.png");
        let err = device.open().await.unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }
}
