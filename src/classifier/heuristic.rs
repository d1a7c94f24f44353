use anyhow::{bail, Context};
use async_trait::async_trait;
use image::RgbImage;
use serde::Deserialize;
use std::{
    path::Path,
    sync::{Arc, RwLock},
};

use crate::capture::Frame;
use crate::error::ClassifierError;
use crate::mood::ExpressionScores;

use super::ExpressionBackend;

pub const MANIFEST_FILE: &str = "expression_model.json";

#[derive(Debug, Clone, Deserialize)]
pub struct LabelWeight {
    pub name: String,
    #[serde(default)]
    pub bias: f32,
}

/// Weights manifest read from `<model location>/expression_model.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelManifest {
    pub labels: Vec<LabelWeight>,
    /// Frames with a mean luma below this are treated as containing no face.
    #[serde(default = "default_min_face_luma")]
    pub min_face_luma: f32,
}

fn default_min_face_luma() -> f32 {
    24.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FrameFeatures {
    /// Mean luma, 0..=255.
    luma: f32,
    /// Luma standard deviation, normalised to 0..=1.
    contrast: f32,
    /// Red/blue balance, 0 (blue) ..= 1 (red).
    warmth: f32,
}

/// Lightweight stand-in for a neural expression model.
///
/// Scores labels from global luminance, contrast and colour balance of the
/// frame, blended with the per-label bias of the manifest.
pub struct HeuristicBackend {
    manifest: RwLock<Option<Arc<ModelManifest>>>,
}

impl HeuristicBackend {
    pub fn new() -> Self {
        Self {
            manifest: RwLock::new(None),
        }
    }

    fn manifest(&self) -> Option<Arc<ModelManifest>> {
        match self.manifest.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_manifest(&self, manifest: ModelManifest) {
        let mut guard = match self.manifest.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(Arc::new(manifest));
    }
}

impl Default for HeuristicBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExpressionBackend for HeuristicBackend {
    async fn load(&self, location: &Path) -> anyhow::Result<()> {
        let path = location.join(MANIFEST_FILE);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let manifest: ModelManifest = serde_json::from_str(&contents)
            .with_context(|| format!("invalid model manifest {}", path.display()))?;
        if manifest.labels.is_empty() {
            bail!("model manifest {} declares no labels", path.display());
        }

        self.set_manifest(manifest);
        Ok(())
    }

    async fn detect(&self, frame: &Frame) -> Result<Option<ExpressionScores>, ClassifierError> {
        let manifest = self
            .manifest()
            .ok_or_else(|| ClassifierError::ClassificationError("weights not loaded".into()))?;
        if frame.width() == 0 || frame.height() == 0 {
            return Err(ClassifierError::ClassificationError("empty frame".into()));
        }

        let image = Arc::clone(&frame.image);
        let features = tokio::task::spawn_blocking(move || extract_features(&image))
            .await
            .map_err(|err| ClassifierError::ClassificationError(format!("feature worker failed: {err}")))?;

        if features.luma < manifest.min_face_luma {
            return Ok(None);
        }

        Ok(Some(score_labels(&manifest, features)))
    }
}

fn extract_features(image: &RgbImage) -> FrameFeatures {
    let count = (image.width() as f64) * (image.height() as f64);
    let mut luma_sum = 0.0f64;
    let mut luma_sq_sum = 0.0f64;
    let mut red_sum = 0.0f64;
    let mut blue_sum = 0.0f64;

    for pixel in image.pixels() {
        let [r, g, b] = pixel.0;
        let luma = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
        luma_sum += luma;
        luma_sq_sum += luma * luma;
        red_sum += r as f64;
        blue_sum += b as f64;
    }

    let mean = luma_sum / count;
    let variance = (luma_sq_sum / count - mean * mean).max(0.0);
    let balance = (red_sum - blue_sum) / count / 255.0;

    FrameFeatures {
        luma: mean as f32,
        contrast: (variance.sqrt() / 128.0).min(1.0) as f32,
        warmth: ((balance + 1.0) / 2.0) as f32,
    }
}

fn score_labels(manifest: &ModelManifest, features: FrameFeatures) -> ExpressionScores {
    let brightness = features.luma / 255.0;
    let FrameFeatures {
        contrast, warmth, ..
    } = features;

    manifest
        .labels
        .iter()
        .map(|label| {
            let raw = match label.name.as_str() {
                "neutral" => 1.0 - contrast,
                "happy" => brightness * warmth,
                "sad" => (1.0 - brightness) * (1.0 - warmth),
                "angry" => warmth * contrast,
                "fearful" => (1.0 - brightness) * contrast,
                "disgusted" => (1.0 - warmth) * contrast * 0.5,
                "surprised" => contrast,
                _ => 0.0,
            };
            (label.name.as_str(), (raw + label.bias) / 2.0)
        })
        .collect()
}
