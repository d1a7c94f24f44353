use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SceneId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Lighting/background preset the rendering surface applies around the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentPreset {
    Sunset,
    Dawn,
    Night,
    Warehouse,
    Forest,
    Apartment,
    Studio,
    City,
    Park,
    Lobby,
}

impl EnvironmentPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentPreset::Sunset => "sunset",
            EnvironmentPreset::Dawn => "dawn",
            EnvironmentPreset::Night => "night",
            EnvironmentPreset::Warehouse => "warehouse",
            EnvironmentPreset::Forest => "forest",
            EnvironmentPreset::Apartment => "apartment",
            EnvironmentPreset::Studio => "studio",
            EnvironmentPreset::City => "city",
            EnvironmentPreset::Park => "park",
            EnvironmentPreset::Lobby => "lobby",
        }
    }
}

/// A preconfigured 3D environment. Scenes differ only in data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    pub environment: EnvironmentPreset,
    /// URI of the binary glTF asset.
    pub asset: String,
    pub interactive: bool,
    pub model_scale: f32,
}

impl Scene {
    pub fn new(id: &str, name: &str, environment: EnvironmentPreset, asset: &str) -> Self {
        Self {
            id: SceneId::new(id),
            name: name.to_string(),
            environment,
            asset: asset.to_string(),
            interactive: true,
            model_scale: 0.01,
        }
    }
}

/// Fixed, ordered registry of scenes. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct SceneCatalog {
    scenes: Vec<Scene>,
}

impl SceneCatalog {
    pub fn builtin() -> Self {
        Self {
            scenes: vec![
                Scene::new("beach", "Beach", EnvironmentPreset::Sunset, "/assets/3d/beach_chair.glb"),
                Scene::new("mountain", "Mountain", EnvironmentPreset::Dawn, "/assets/3d/mountain.glb"),
                Scene::new("forest", "Forest", EnvironmentPreset::Forest, "/assets/3d/tree.glb"),
            ],
        }
    }

    /// Builds a catalog from explicit scenes. Later duplicates of an id are dropped.
    pub fn from_scenes(scenes: impl IntoIterator<Item = Scene>) -> Self {
        let mut unique: Vec<Scene> = Vec::new();
        for scene in scenes {
            if unique.iter().any(|existing| existing.id == scene.id) {
                log::warn!("duplicate scene id '{}' ignored", scene.id);
                continue;
            }
            unique.push(scene);
        }
        Self { scenes: unique }
    }

    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|scene| &scene.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.iter()
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

impl Default for SceneCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_is_ordered() {
        let catalog = SceneCatalog::builtin();
        let names: Vec<&str> = catalog.iter().map(|scene| scene.name.as_str()).collect();
        assert_eq!(names, vec!["Beach", "Mountain", "Forest"]);
        assert!(catalog.iter().all(|scene| scene.interactive));
    }

    #[test]
    fn lookup_by_id() {
        let catalog = SceneCatalog::builtin();
        let mountain = catalog.get(&SceneId::from("mountain")).unwrap();
        assert_eq!(mountain.environment, EnvironmentPreset::Dawn);
        assert_eq!(mountain.asset, "/assets/3d/mountain.glb");
        assert!(catalog.get(&SceneId::from("desert")).is_none());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let catalog = SceneCatalog::from_scenes(vec![
            Scene::new("a", "First", EnvironmentPreset::City, "/a.glb"),
            Scene::new("a", "Second", EnvironmentPreset::Park, "/b.glb"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(&SceneId::from("a")).unwrap().name, "First");
    }

    #[test]
    fn preset_serializes_as_tag() {
        assert_eq!(
            serde_json::to_string(&EnvironmentPreset::Sunset).unwrap(),
            "\"sunset\""
        );
        assert_eq!(EnvironmentPreset::Sunset.as_str(), "sunset");
    }
}
