pub mod catalog;
pub mod recommend;

pub use catalog::{EnvironmentPreset, Scene, SceneCatalog, SceneId};
pub use recommend::{
    Recommendation, RecommendationEngine, RecommendationPolicy, RecommendationTrigger,
};
