use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::{watch, Mutex};

use crate::error::SceneError;
use crate::scenes::{Scene, SceneCatalog, SceneId};

use super::{
    AssetHandle, AssetLoader, CameraPose, OrbitCamera, RenderSurface, SceneSnapshot,
    SceneStatus, SurfaceBinding,
};

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// The one scene presented on the surface.
struct ActiveScene {
    scene: Scene,
    asset: AssetHandle,
    binding: SurfaceBinding,
    camera: OrbitCamera,
}

/// Owns the rendering surface and at most one loaded scene.
///
/// Transitions run one at a time under `active`. Every request takes a ticket
/// from `generation`; a request whose ticket is no longer the newest when it
/// gets its turn, or when its asset finishes loading, gives way to the newer one.
pub struct SceneController {
    catalog: Arc<SceneCatalog>,
    loader: Arc<dyn AssetLoader>,
    surface: Arc<dyn RenderSurface>,
    load_timeout: Duration,
    active: Mutex<Option<ActiveScene>>,
    generation: AtomicU64,
    state: watch::Sender<SceneSnapshot>,
}

impl SceneController {
    pub fn new(
        catalog: Arc<SceneCatalog>,
        loader: Arc<dyn AssetLoader>,
        surface: Arc<dyn RenderSurface>,
        load_timeout: Duration,
    ) -> Self {
        let (state, _rx) = watch::channel(SceneSnapshot::idle());
        Self {
            catalog,
            loader,
            surface,
            load_timeout,
            active: Mutex::new(None),
            generation: AtomicU64::new(0),
            state,
        }
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SceneSnapshot> {
        self.state.subscribe()
    }

    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Tears down the current scene, if any, then loads and presents `id`.
    ///
    /// Resolves once this request has settled: `Ok` with the active snapshot,
    /// [`SceneError::Superseded`] if a newer enter/exit overtook it, or
    /// [`SceneError::AssetLoadFailed`] with the controller back in `Idle`.
    pub async fn enter_scene(&self, id: &SceneId) -> Result<SceneSnapshot, SceneError> {
        let scene = self
            .catalog
            .get(id)
            .cloned()
            .ok_or_else(|| SceneError::UnknownScene(id.to_string()))?;
        let ticket = self.next_ticket();

        let mut active = self.active.lock().await;
        if !self.is_current(ticket) {
            return Err(SceneError::Superseded(id.to_string()));
        }

        if let Some(previous) = active.take() {
            self.dispose(previous);
        }

        self.state.send_replace(SceneSnapshot::loading(scene.id.clone()));
        log_info!("loading scene {} from {}", scene.id, scene.asset);

        let loaded = tokio::time::timeout(self.load_timeout, self.loader.load(&scene)).await;
        if !self.is_current(ticket) {
            log_info!("scene {} superseded while loading", scene.id);
            if let Ok(Ok(asset)) = loaded {
                self.loader.release(asset);
            }
            self.state.send_replace(SceneSnapshot::idle());
            return Err(SceneError::Superseded(id.to_string()));
        }

        let asset = match loaded {
            Ok(Ok(asset)) => asset,
            Ok(Err(err)) => return Err(self.fail_load(&scene, format!("{err:#}"))),
            Err(_) => {
                return Err(self.fail_load(
                    &scene,
                    format!("timed out after {}ms", self.load_timeout.as_millis()),
                ))
            }
        };

        let binding = match self.surface.attach(&scene, &asset) {
            Ok(binding) => binding,
            Err(err) => {
                self.loader.release(asset);
                return Err(self.fail_load(&scene, format!("surface attach failed: {err:#}")));
            }
        };

        let camera = OrbitCamera::default();
        self.surface.set_camera(&binding, camera.pose());

        let snapshot = SceneSnapshot::active(scene.id.clone(), camera.pose());
        log_info!("scene {} active ({} bytes)", scene.id, asset.byte_len());
        *active = Some(ActiveScene {
            scene,
            asset,
            binding,
            camera,
        });
        self.state.send_replace(snapshot.clone());
        Ok(snapshot)
    }

    /// Disposes the active scene. Also cancels any enter request still waiting or loading.
    pub async fn exit_scene(&self) {
        self.next_ticket();
        let mut active = self.active.lock().await;
        if let Some(current) = active.take() {
            self.dispose(current);
        }
    }

    pub async fn orbit(&self, yaw_delta_deg: f32, pitch_delta_deg: f32) -> Result<CameraPose, SceneError> {
        self.with_camera(|camera| camera.orbit(yaw_delta_deg, pitch_delta_deg))
            .await
    }

    pub async fn zoom(&self, factor: f32) -> Result<CameraPose, SceneError> {
        self.with_camera(|camera| camera.zoom(factor)).await
    }

    async fn with_camera<F>(&self, update: F) -> Result<CameraPose, SceneError>
    where
        F: FnOnce(&mut OrbitCamera) -> CameraPose,
    {
        // Enter holds the lock for the whole load; don't queue behind it.
        if self.state.borrow().status != SceneStatus::Active {
            return Err(SceneError::NoActiveScene);
        }
        let mut guard = self.active.lock().await;
        let active = guard.as_mut().ok_or(SceneError::NoActiveScene)?;
        if !active.scene.interactive {
            return Ok(active.camera.pose());
        }

        let pose = update(&mut active.camera);
        self.surface.set_camera(&active.binding, pose);
        self.state
            .send_replace(SceneSnapshot::active(active.scene.id.clone(), pose));
        Ok(pose)
    }

    fn next_ticket(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket
    }

    /// `Active → Disposing → Idle`: detach from the surface, then free the asset.
    fn dispose(&self, current: ActiveScene) {
        let ActiveScene {
            scene,
            asset,
            binding,
            ..
        } = current;

        self.state.send_replace(SceneSnapshot::disposing(scene.id.clone()));
        self.surface.detach(binding);
        self.loader.release(asset);
        self.state.send_replace(SceneSnapshot::idle());
        log_info!("scene {} disposed", scene.id);
    }

    fn fail_load(&self, scene: &Scene, reason: String) -> SceneError {
        log_warn!("scene {} failed to load: {}", scene.id, reason);
        self.surface.show_empty();
        self.state.send_replace(SceneSnapshot::idle());
        SceneError::AssetLoadFailed {
            scene: scene.id.to_string(),
            reason,
        }
    }
}

impl Drop for SceneController {
    fn drop(&mut self) {
        let current = self.active.get_mut().take();
        if let Some(current) = current {
            self.dispose(current);
        }
    }
}
