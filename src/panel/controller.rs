use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use uuid::Uuid;

use crate::capture::{CaptureSource, MediaDevice};
use crate::classifier::{ExpressionBackend, ExpressionClassifier, HeuristicBackend, ModelStatus};
use crate::error::{CaptureError, SceneError, XrError};
use crate::lifecycle::{
    AssetLoader, CameraPose, FileAssetLoader, RenderSurface, SceneController, SceneSnapshot,
};
use crate::mood::{ClassificationResult, MoodTracker};
use crate::notices::{Notice, NoticeBoard, NoticeKind};
use crate::sampling::{SamplingConfig, SamplingController, SamplingStatsSnapshot};
use crate::scenes::{
    Recommendation, RecommendationEngine, RecommendationTrigger, SceneCatalog, SceneId,
};
use crate::settings::XrSettings;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

/// Platform collaborators the panel drives.
pub struct PanelDeps {
    pub device: Arc<dyn MediaDevice>,
    pub backend: Arc<dyn ExpressionBackend>,
    pub loader: Arc<dyn AssetLoader>,
    pub surface: Arc<dyn RenderSurface>,
}

impl PanelDeps {
    /// Built-in backend and file loader; the device and surface come from the host.
    pub fn bundled(
        settings: &XrSettings,
        device: Arc<dyn MediaDevice>,
        surface: Arc<dyn RenderSurface>,
    ) -> Self {
        Self {
            device,
            backend: Arc::new(HeuristicBackend::new()),
            loader: Arc::new(FileAssetLoader::new(settings.asset_root.clone())),
            surface,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub capturing: bool,
    pub model: ModelStatus,
    pub mood: Option<ClassificationResult>,
    pub dominant_mood: Option<String>,
    pub scene: SceneSnapshot,
    pub notices: Vec<Notice>,
    pub sampling: SamplingStatsSnapshot,
}

/// The mood-adaptive XR panel: camera sampling, mood state, recommendations
/// and the scene on the rendering surface.
pub struct XrPanel {
    capture: Arc<CaptureSource>,
    classifier: Arc<ExpressionClassifier>,
    tracker: MoodTracker,
    sampling: Mutex<SamplingController>,
    scenes: SceneController,
    recommender: RecommendationEngine,
    notices: NoticeBoard,
}

impl XrPanel {
    pub fn new(settings: &XrSettings, deps: PanelDeps) -> Self {
        Self::with_catalog(settings, deps, SceneCatalog::builtin())
    }

    pub fn with_catalog(settings: &XrSettings, deps: PanelDeps, catalog: SceneCatalog) -> Self {
        let sampling_config = SamplingConfig {
            period: settings.sampling_period(),
            classify_timeout: settings.classify_timeout(),
        };

        Self {
            capture: Arc::new(CaptureSource::new(deps.device)),
            classifier: Arc::new(ExpressionClassifier::new(
                deps.backend,
                settings.model_location.clone(),
            )),
            tracker: MoodTracker::new(),
            sampling: Mutex::new(SamplingController::new(sampling_config)),
            scenes: SceneController::new(
                Arc::new(catalog),
                deps.loader,
                deps.surface,
                settings.asset_load_timeout(),
            ),
            recommender: RecommendationEngine::new(settings.recommendation_policy),
            notices: NoticeBoard::new(),
        }
    }

    pub fn with_recommendation_engine(mut self, engine: RecommendationEngine) -> Self {
        self.recommender = engine;
        self
    }

    /// Loads the expression model. Failure raises a notice; calling again retries.
    pub async fn load_model(&self) -> Result<(), XrError> {
        match self.classifier.load_model().await {
            Ok(()) => {
                self.notices.clear_kind(NoticeKind::Model);
                Ok(())
            }
            Err(err) => {
                self.notices.raise(NoticeKind::Model, err.to_string());
                Err(err.into())
            }
        }
    }

    /// Acquires the camera and starts mood sampling.
    ///
    /// A model that never loaded, or failed to, is (re)loaded first. The camera
    /// is released again if sampling cannot start.
    pub async fn start_capture(&self) -> Result<(), XrError> {
        if matches!(
            self.classifier.model_status(),
            ModelStatus::NotLoaded | ModelStatus::Failed
        ) {
            self.load_model().await?;
        }

        let mut sampling = self.sampling.lock().await;
        // Checked before the camera is touched so a bad config never lights the indicator.
        sampling.config().validate()?;

        if let Err(err) = self.capture.acquire().await {
            if let CaptureError::DeviceUnavailable(_) = &err {
                self.notices.raise(NoticeKind::Device, err.to_string());
            }
            return Err(err.into());
        }

        if let Err(err) = sampling.start(
            Arc::clone(&self.capture),
            Arc::clone(&self.classifier),
            self.tracker.clone(),
        ) {
            self.capture.release();
            return Err(err);
        }

        self.notices.clear_kind(NoticeKind::Device);
        log_info!("mood capture started");
        Ok(())
    }

    /// Stops sampling and releases the camera. The last mood stays readable.
    pub async fn stop_capture(&self) {
        let mut sampling = self.sampling.lock().await;
        self.stop_sampling_and_release(&mut sampling).await;
    }

    pub async fn enter_scene(&self, id: &SceneId) -> Result<SceneSnapshot, XrError> {
        match self.scenes.enter_scene(id).await {
            Ok(snapshot) => {
                self.notices.clear_kind(NoticeKind::Asset);
                Ok(snapshot)
            }
            Err(err @ SceneError::AssetLoadFailed { .. }) => {
                self.notices.raise(NoticeKind::Asset, err.to_string());
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Enters the scene a recommendation points at, if any.
    pub async fn enter_recommended(
        &self,
        recommendation: &Recommendation,
    ) -> Result<Option<SceneSnapshot>, XrError> {
        match &recommendation.scene {
            Some(id) => self.enter_scene(id).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn exit_scene(&self) {
        self.scenes.exit_scene().await;
    }

    pub async fn orbit(
        &self,
        yaw_delta_deg: f32,
        pitch_delta_deg: f32,
    ) -> Result<CameraPose, XrError> {
        Ok(self.scenes.orbit(yaw_delta_deg, pitch_delta_deg).await?)
    }

    pub async fn zoom(&self, factor: f32) -> Result<CameraPose, XrError> {
        Ok(self.scenes.zoom(factor).await?)
    }

    pub fn recommend(&self, trigger: RecommendationTrigger) -> Recommendation {
        let mood = self.tracker.dominant_label();
        self.recommender.recommend(trigger, mood.as_deref())
    }

    /// Leaving the panel: sampling, camera and scene are all shut down.
    pub async fn teardown(&self) {
        {
            let mut sampling = self.sampling.lock().await;
            self.stop_sampling_and_release(&mut sampling).await;
        }
        self.scenes.exit_scene().await;
        self.tracker.clear();
        log_info!("xr panel torn down");
    }

    pub fn mood(&self) -> Option<ClassificationResult> {
        self.tracker.latest()
    }

    pub fn dominant_mood(&self) -> Option<String> {
        self.tracker.dominant_label()
    }

    pub fn subscribe_mood(&self) -> watch::Receiver<Option<ClassificationResult>> {
        self.tracker.subscribe()
    }

    pub fn scene_state(&self) -> SceneSnapshot {
        self.scenes.snapshot()
    }

    pub fn subscribe_scene(&self) -> watch::Receiver<SceneSnapshot> {
        self.scenes.subscribe()
    }

    pub fn catalog(&self) -> &SceneCatalog {
        self.scenes.catalog()
    }

    pub fn model_status(&self) -> ModelStatus {
        self.classifier.model_status()
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_acquired()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.list()
    }

    pub fn dismiss_notice(&self, id: Uuid) -> bool {
        self.notices.dismiss(id)
    }

    pub async fn sampling_stats(&self) -> SamplingStatsSnapshot {
        self.sampling.lock().await.stats().snapshot()
    }

    pub async fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            capturing: self.is_capturing(),
            model: self.model_status(),
            mood: self.mood(),
            dominant_mood: self.dominant_mood(),
            scene: self.scene_state(),
            notices: self.notices(),
            sampling: self.sampling_stats().await,
        }
    }

    async fn stop_sampling_and_release(&self, sampling: &mut SamplingController) {
        if let Err(err) = sampling.stop().await {
            log_error!("failed to stop mood sampling: {err:#}");
        }
        self.capture.release();
    }
}
