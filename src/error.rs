use thiserror::Error;

/// Failures of the camera capture source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("camera already acquired")]
    AlreadyAcquired,

    #[error("no frame captured yet")]
    NoFrameYet,
}

impl CaptureError {
    /// Benign conditions are absorbed by the sampling loop and never shown to the user.
    pub fn is_benign(&self) -> bool {
        matches!(self, CaptureError::NoFrameYet)
    }
}

/// Failures of the expression classifier adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("expression model failed to load: {0}")]
    ModelLoadFailed(String),

    #[error("expression model not ready")]
    ModelNotReady,

    #[error("no face detected")]
    NoFaceDetected,

    #[error("classification failed: {0}")]
    ClassificationError(String),
}

impl ClassifierError {
    pub fn is_benign(&self) -> bool {
        matches!(self, ClassifierError::NoFaceDetected)
    }
}

/// Failures of the scene lifecycle manager.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("unknown scene '{0}'")]
    UnknownScene(String),

    #[error("failed to load asset for scene '{scene}': {reason}")]
    AssetLoadFailed { scene: String, reason: String },

    #[error("request for scene '{0}' was superseded by a newer request")]
    Superseded(String),

    #[error("no active scene")]
    NoActiveScene,
}

impl SceneError {
    pub fn is_benign(&self) -> bool {
        matches!(self, SceneError::Superseded(_))
    }
}

/// Errors surfaced by the panel entry points.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum XrError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error("sampling already running")]
    SamplingActive,

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

impl XrError {
    pub fn is_benign(&self) -> bool {
        match self {
            XrError::Capture(err) => err.is_benign(),
            XrError::Classifier(err) => err.is_benign(),
            XrError::Scene(err) => err.is_benign(),
            XrError::SamplingActive | XrError::InvalidSettings(_) => false,
        }
    }
}
