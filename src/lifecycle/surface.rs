use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::scenes::{EnvironmentPreset, Scene, SceneId};

use super::AssetHandle;

const MAX_PITCH_DEG: f32 = 85.0;
const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraPose {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub distance: f32,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            pitch_deg: 0.0,
            distance: 5.0,
        }
    }
}

/// Orbit/zoom controls around the scene origin.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitCamera {
    pose: CameraPose,
}

impl OrbitCamera {
    pub fn pose(&self) -> CameraPose {
        self.pose
    }

    /// Yaw wraps into `[0, 360)`, pitch is clamped short of the poles.
    pub fn orbit(&mut self, yaw_delta_deg: f32, pitch_delta_deg: f32) -> CameraPose {
        if yaw_delta_deg.is_finite() {
            self.pose.yaw_deg = (self.pose.yaw_deg + yaw_delta_deg).rem_euclid(360.0);
        }
        if pitch_delta_deg.is_finite() {
            self.pose.pitch_deg =
                (self.pose.pitch_deg + pitch_delta_deg).clamp(-MAX_PITCH_DEG, MAX_PITCH_DEG);
        }
        self.pose
    }

    /// `factor > 1` moves closer. Non-positive or non-finite factors are ignored.
    pub fn zoom(&mut self, factor: f32) -> CameraPose {
        if factor.is_finite() && factor > 0.0 {
            self.pose.distance = (self.pose.distance / factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        }
        self.pose
    }
}

/// Proof that a scene is attached to the surface. Returned to [`RenderSurface::detach`].
#[derive(Debug)]
pub struct SurfaceBinding {
    pub id: Uuid,
    pub scene: SceneId,
}

/// The exclusive output target of the scene controller.
///
/// The surface runs its own presentation loop; these calls only change what it presents.
pub trait RenderSurface: Send + Sync {
    fn attach(&self, scene: &Scene, asset: &AssetHandle) -> Result<SurfaceBinding>;

    fn set_camera(&self, binding: &SurfaceBinding, pose: CameraPose);

    fn detach(&self, binding: SurfaceBinding);

    /// Presents the neutral empty state.
    fn show_empty(&self);
}

#[derive(Debug, Default)]
struct HeadlessState {
    attached: Option<(Uuid, SceneId, EnvironmentPreset)>,
    camera: Option<CameraPose>,
    history: Vec<SceneId>,
    empty_presentations: usize,
}

/// Surface without a GPU. Records what it was asked to present.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    state: Mutex<HeadlessState>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached_scene(&self) -> Option<SceneId> {
        self.lock().attached.as_ref().map(|(_, scene, _)| scene.clone())
    }

    pub fn environment(&self) -> Option<EnvironmentPreset> {
        self.lock().attached.as_ref().map(|(_, _, preset)| *preset)
    }

    pub fn camera(&self) -> Option<CameraPose> {
        self.lock().camera
    }

    /// Every scene ever attached, in order.
    pub fn attach_history(&self) -> Vec<SceneId> {
        self.lock().history.clone()
    }

    pub fn empty_presentations(&self) -> usize {
        self.lock().empty_presentations
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RenderSurface for HeadlessSurface {
    fn attach(&self, scene: &Scene, asset: &AssetHandle) -> Result<SurfaceBinding> {
        let mut state = self.lock();
        if let Some((_, current, _)) = &state.attached {
            bail!("surface already presenting scene {current}");
        }
        if asset.byte_len() == 0 {
            log::debug!("attaching empty asset {} for scene {}", asset.uri, scene.id);
        }

        let binding = SurfaceBinding {
            id: Uuid::new_v4(),
            scene: scene.id.clone(),
        };
        state.attached = Some((binding.id, scene.id.clone(), scene.environment));
        state.history.push(scene.id.clone());
        Ok(binding)
    }

    fn set_camera(&self, binding: &SurfaceBinding, pose: CameraPose) {
        let mut state = self.lock();
        if matches!(&state.attached, Some((id, _, _)) if *id == binding.id) {
            state.camera = Some(pose);
        }
    }

    fn detach(&self, binding: SurfaceBinding) {
        let mut state = self.lock();
        if matches!(&state.attached, Some((id, _, _)) if *id == binding.id) {
            state.attached = None;
            state.camera = None;
        }
    }

    fn show_empty(&self) {
        let mut state = self.lock();
        state.attached = None;
        state.camera = None;
        state.empty_presentations += 1;
    }
}
