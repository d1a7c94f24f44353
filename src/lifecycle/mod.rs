pub mod asset;
pub mod controller;
pub mod state;
pub mod surface;

pub use asset::{parse_glb_header, AssetHandle, AssetLoader, FileAssetLoader, GlbHeader};
pub use controller::SceneController;
pub use state::{SceneSnapshot, SceneStatus};
pub use surface::{CameraPose, HeadlessSurface, OrbitCamera, RenderSurface, SurfaceBinding};
