use serde::{Deserialize, Serialize};

use crate::scenes::SceneId;

use super::CameraPose;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SceneStatus {
    #[default]
    Idle,
    Loading,
    Active,
    Disposing,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SceneSnapshot {
    pub status: SceneStatus,
    /// Scene being loaded, presented or disposed; `None` while idle.
    pub scene: Option<SceneId>,
    /// Only set while active.
    pub camera: Option<CameraPose>,
}

impl SceneSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn loading(scene: SceneId) -> Self {
        Self {
            status: SceneStatus::Loading,
            scene: Some(scene),
            camera: None,
        }
    }

    pub fn active(scene: SceneId, camera: CameraPose) -> Self {
        Self {
            status: SceneStatus::Active,
            scene: Some(scene),
            camera: Some(camera),
        }
    }

    pub fn disposing(scene: SceneId) -> Self {
        Self {
            status: SceneStatus::Disposing,
            scene: Some(scene),
            camera: None,
        }
    }

    pub fn is_active_on(&self, scene: &SceneId) -> bool {
        self.status == SceneStatus::Active && self.scene.as_ref() == Some(scene)
    }
}
