mod source;
mod still_image;

pub use source::{CaptureSource, MediaDevice};
pub use still_image::StillImageDevice;

use chrono::{DateTime, Utc};
use image::RgbImage;
use std::sync::Arc;

/// A decoded camera frame. The pixel buffer is shared, cloning is cheap.
#[derive(Debug, Clone)]
pub struct Frame {
    pub sequence: u64,
    pub captured_at: DateTime<Utc>,
    pub image: Arc<RgbImage>,
}

impl Frame {
    pub fn new(sequence: u64, image: RgbImage) -> Self {
        Self::from_shared(sequence, Arc::new(image))
    }

    pub fn from_shared(sequence: u64, image: Arc<RgbImage>) -> Self {
        Self {
            sequence,
            captured_at: Utc::now(),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
