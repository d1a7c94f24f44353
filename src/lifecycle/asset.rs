use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use uuid::Uuid;

use crate::scenes::Scene;

const GLB_MAGIC: &[u8; 4] = b"glTF";
const GLB_VERSION: u32 = 2;
const GLB_HEADER_LEN: usize = 12;

/// A loaded scene asset. Deliberately not `Clone`: whoever holds it must hand it
/// back to [`AssetLoader::release`].
#[derive(Debug)]
pub struct AssetHandle {
    pub id: Uuid,
    pub uri: String,
    pub data: Arc<Vec<u8>>,
}

impl AssetHandle {
    pub fn new(uri: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            uri: uri.into(),
            data: Arc::new(data),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

#[async_trait]
pub trait AssetLoader: Send + Sync {
    /// Fetches and decodes the scene's asset.
    async fn load(&self, scene: &Scene) -> Result<AssetHandle>;

    /// Frees everything the handle holds.
    fn release(&self, handle: AssetHandle);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlbHeader {
    pub version: u32,
    pub length: u32,
}

/// Validates the 12-byte binary glTF header against the buffer it came from.
pub fn parse_glb_header(bytes: &[u8]) -> Result<GlbHeader> {
    if bytes.len() < GLB_HEADER_LEN {
        bail!("asset too short for a GLB header ({} bytes)", bytes.len());
    }
    if &bytes[0..4] != GLB_MAGIC {
        bail!("asset is not binary glTF (bad magic)");
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let length = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    if version != GLB_VERSION {
        bail!("unsupported GLB version {version}");
    }
    if length as usize != bytes.len() {
        bail!(
            "GLB header declares {length} bytes but asset has {}",
            bytes.len()
        );
    }

    Ok(GlbHeader { version, length })
}

/// Loads `.glb` assets from a static asset directory.
pub struct FileAssetLoader {
    root: PathBuf,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps an asset URI such as `/assets/3d/tree.glb` onto the asset root.
    pub fn resolve(&self, uri: &str) -> Result<PathBuf> {
        let relative = Path::new(uri.trim_start_matches('/'));
        if relative.as_os_str().is_empty() {
            bail!("empty asset uri");
        }
        if relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_)))
        {
            bail!("asset uri '{uri}' escapes the asset root");
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetLoader for FileAssetLoader {
    async fn load(&self, scene: &Scene) -> Result<AssetHandle> {
        let path = self.resolve(&scene.asset)?;
        let bytes = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read asset {}", path.display()))?;
        let header = parse_glb_header(&bytes)
            .with_context(|| format!("invalid asset {}", path.display()))?;

        log::debug!(
            "loaded {} (GLB v{}, {} bytes) for scene {}",
            path.display(),
            header.version,
            header.length,
            scene.id
        );
        Ok(AssetHandle::new(scene.asset.clone(), bytes))
    }

    fn release(&self, handle: AssetHandle) {
        log::debug!("released asset {} ({})", handle.uri, handle.id);
        drop(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::EnvironmentPreset;

    fn glb_bytes(payload: &[u8]) -> Vec<u8> {
        let total = (GLB_HEADER_LEN + payload.len()) as u32;
        let mut bytes = Vec::with_capacity(total as usize);
        bytes.extend_from_slice(GLB_MAGIC);
        bytes.extend_from_slice(&GLB_VERSION.to_le_bytes());
        bytes.extend_from_slice(&total.to_le_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    #[test]
    fn header_accepts_well_formed_glb() {
        let bytes = glb_bytes(&[0u8; 8]);
        let header = parse_glb_header(&bytes).unwrap();
        assert_eq!(header, GlbHeader { version: 2, length: 20 });
    }

    #[test]
    fn header_rejects_bad_magic_and_length() {
        let mut bytes = glb_bytes(&[0u8; 4]);
        bytes.push(0);
        assert!(parse_glb_header(&bytes).is_err());

        let mut bytes = glb_bytes(&[]);
        bytes[0] = b'x';
        assert!(parse_glb_header(&bytes).is_err());

        assert!(parse_glb_header(b"glTF").is_err());
    }

    #[test]
    fn resolve_rejects_escaping_uris() {
        let loader = FileAssetLoader::new("/srv/public");
        assert_eq!(
            loader.resolve("/assets/3d/tree.glb").unwrap(),
            PathBuf::from("/srv/public/assets/3d/tree.glb")
        );
        assert!(loader.resolve("/assets/../../etc/passwd").is_err());
        assert!(loader.resolve("/").is_err());
    }

    #[tokio::test]
    async fn loads_asset_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets/3d")).unwrap();
        std::fs::write(dir.path().join("assets/3d/tree.glb"), glb_bytes(b"mesh")).unwrap();

        let loader = FileAssetLoader::new(dir.path());
        let scene = Scene::new("forest", "Forest", EnvironmentPreset::Forest, "/assets/3d/tree.glb");
        let handle = loader.load(&scene).await.unwrap();
        assert_eq!(handle.byte_len(), 16);
        loader.release(handle);

        let missing = Scene::new("beach", "Beach", EnvironmentPreset::Sunset, "/assets/3d/none.glb");
        assert!(loader.load(&missing).await.is_err());
    }
}
