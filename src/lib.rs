pub mod capture;
pub mod classifier;
pub mod error;
pub mod lifecycle;
pub mod mood;
pub mod notices;
pub mod panel;
pub mod sampling;
pub mod scenes;
pub mod settings;
mod utils;

pub use error::{CaptureError, ClassifierError, SceneError, XrError};
pub use mood::{ClassificationResult, ExpressionScores, MoodTracker};
pub use panel::{PanelDeps, PanelSnapshot, XrPanel};
pub use scenes::{
    Recommendation, RecommendationEngine, RecommendationPolicy, RecommendationTrigger, Scene,
    SceneCatalog, SceneId,
};
pub use settings::{SettingsStore, XrSettings};

/// Installs the process-wide logger at `info`. Per-module directives in `RUST_LOG` still apply.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
