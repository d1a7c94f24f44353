use async_trait::async_trait;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{path::Path, path::PathBuf, sync::Arc};
use tokio::sync::{watch, Mutex};

use crate::capture::Frame;
use crate::error::ClassifierError;
use crate::mood::{ClassificationResult, ExpressionScores};

/// Face detector plus expression network.
#[async_trait]
pub trait ExpressionBackend: Send + Sync {
    /// Loads weights from `location`. Called once per successful load.
    async fn load(&self, location: &Path) -> anyhow::Result<()>;

    /// Scores the expressions of the single most prominent face, `None` if no face was found.
    async fn detect(&self, frame: &Frame) -> Result<Option<ExpressionScores>, ClassifierError>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ModelStatus {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Failed,
}

pub struct ExpressionClassifier {
    backend: Arc<dyn ExpressionBackend>,
    location: PathBuf,
    status: watch::Sender<ModelStatus>,
    load_lock: Mutex<()>,
}

impl ExpressionClassifier {
    pub fn new(backend: Arc<dyn ExpressionBackend>, location: impl Into<PathBuf>) -> Self {
        let (status, _rx) = watch::channel(ModelStatus::NotLoaded);
        Self {
            backend,
            location: location.into(),
            status,
            load_lock: Mutex::new(()),
        }
    }

    pub fn model_status(&self) -> ModelStatus {
        *self.status.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.model_status() == ModelStatus::Ready
    }

    /// Loads the weights once. A failed load can be retried; a ready model is left as is.
    pub async fn load_model(&self) -> Result<(), ClassifierError> {
        let _guard = self.load_lock.lock().await;
        if self.is_ready() {
            return Ok(());
        }

        self.status.send_replace(ModelStatus::Loading);
        info!("loading expression model from {}", self.location.display());

        match self.backend.load(&self.location).await {
            Ok(()) => {
                self.status.send_replace(ModelStatus::Ready);
                info!("expression model ready");
                Ok(())
            }
            Err(err) => {
                self.status.send_replace(ModelStatus::Failed);
                warn!("expression model failed to load: {err:#}");
                Err(ClassifierError::ModelLoadFailed(format!("{err:#}")))
            }
        }
    }

    pub async fn classify(&self, frame: &Frame) -> Result<ClassificationResult, ClassifierError> {
        if !self.is_ready() {
            return Err(ClassifierError::ModelNotReady);
        }

        match self.backend.detect(frame).await {
            Ok(Some(scores)) if !scores.is_empty() => {
                Ok(ClassificationResult::new(scores, frame.sequence))
            }
            Ok(_) => Err(ClassifierError::NoFaceDetected),
            Err(ClassifierError::NoFaceDetected) => Err(ClassifierError::NoFaceDetected),
            Err(ClassifierError::ClassificationError(reason)) => {
                Err(ClassifierError::ClassificationError(reason))
            }
            Err(other) => Err(ClassifierError::ClassificationError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct ScriptedBackend {
        fail_load: AtomicBool,
        face: bool,
    }

    #[async_trait]
    impl ExpressionBackend for ScriptedBackend {
        async fn load(&self, _location: &Path) -> anyhow::Result<()> {
            if self.fail_load.load(Ordering::SeqCst) {
                anyhow::bail!("weights missing");
            }
            Ok(())
        }

        async fn detect(&self, _frame: &Frame) -> Result<Option<ExpressionScores>, ClassifierError> {
            if !self.face {
                return Ok(None);
            }
            Ok(Some([("neutral", 0.3_f32), ("happy", 0.6_f32)].into_iter().collect()))
        }
    }

    fn classifier(fail_load: bool, face: bool) -> ExpressionClassifier {
        let backend = Arc::new(ScriptedBackend {
            fail_load: AtomicBool::new(fail_load),
            face,
        });
        ExpressionClassifier::new(backend, "models")
    }

    fn frame() -> Frame {
        Frame::new(3, RgbImage::new(2, 2))
    }

    #[tokio::test]
    async fn classify_before_load_is_not_ready() {
        let classifier = classifier(false, true);
        assert_eq!(
            classifier.classify(&frame()).await.unwrap_err(),
            ClassifierError::ModelNotReady
        );
    }

    #[tokio::test]
    async fn classify_after_load_tags_frame_sequence() {
        let classifier = classifier(false, true);
        classifier.load_model().await.unwrap();
        let result = classifier.classify(&frame()).await.unwrap();
        assert_eq!(result.frame_sequence, 3);
        assert_eq!(result.dominant_label(), Some("happy"));
    }

    #[tokio::test]
    async fn missing_face_is_reported() {
        let classifier = classifier(false, false);
        classifier.load_model().await.unwrap();
        assert_eq!(
            classifier.classify(&frame()).await.unwrap_err(),
            ClassifierError::NoFaceDetected
        );
    }

    #[tokio::test]
    async fn failed_load_can_be_retried() {
        let backend = Arc::new(ScriptedBackend {
            fail_load: AtomicBool::new(true),
            face: true,
        });
        let classifier = ExpressionClassifier::new(backend.clone(), "models");

        let err = classifier.load_model().await.unwrap_err();
        assert!(matches!(err, ClassifierError::ModelLoadFailed(_)));
        assert_eq!(classifier.model_status(), ModelStatus::Failed);
        assert_eq!(
            classifier.classify(&frame()).await.unwrap_err(),
            ClassifierError::ModelNotReady
        );

        backend.fail_load.store(false, Ordering::SeqCst);
        classifier.load_model().await.unwrap();
        assert_eq!(classifier.model_status(), ModelStatus::Ready);
    }

    #[test]
    fn status_defaults_to_not_loaded() {
        assert_eq!(ModelStatus::default(), ModelStatus::NotLoaded);
        assert_eq!(serde_json::to_string(&ModelStatus::default()).unwrap(), "\"notLoaded\"");
    }
}
