//! Fakes for the platform seams: camera, expression backend, asset loader.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use moodscape::capture::{Frame, MediaDevice};
use moodscape::classifier::ExpressionBackend;
use moodscape::lifecycle::{AssetHandle, AssetLoader, HeadlessSurface};
use moodscape::panel::{PanelDeps, XrPanel};
use moodscape::scenes::{Scene, SceneId};
use moodscape::{CaptureError, ClassifierError, ExpressionScores, XrSettings};

/// Smallest valid GLB container: header only.
pub fn glb_bytes() -> Vec<u8> {
    let mut bytes = Vec::with_capacity(12);
    bytes.extend_from_slice(b"glTF");
    bytes.extend_from_slice(&2u32.to_le_bytes());
    bytes.extend_from_slice(&12u32.to_le_bytes());
    bytes
}

// --- camera ---

#[derive(Default)]
pub struct FakeCamera {
    pub deny: AtomicBool,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    sequence: AtomicU64,
    open: AtomicBool,
}

impl FakeCamera {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn denying() -> Arc<Self> {
        let camera = Self::default();
        camera.deny.store(true, Ordering::SeqCst);
        Arc::new(camera)
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaDevice for FakeCamera {
    async fn open(&self) -> Result<(), CaptureError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.deny.load(Ordering::SeqCst) {
            return Err(CaptureError::DeviceUnavailable("permission denied".into()));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn latest_frame(&self) -> Option<Frame> {
        if !self.is_open() {
            return None;
        }
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Some(Frame::new(sequence, RgbImage::from_pixel(4, 4, Rgb([128, 128, 128]))))
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
    }
}

// --- expression backend ---

#[derive(Debug, Clone)]
pub enum Script {
    Face(Vec<(&'static str, f32)>),
    NoFace,
    Fail,
}

pub struct ScriptedBackend {
    pub latency: Duration,
    pub fail_load: AtomicBool,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new(script: Script, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            latency,
            fail_load: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            script: Mutex::new(script),
        })
    }

    pub fn happy(latency: Duration) -> Arc<Self> {
        Self::new(
            Script::Face(vec![("neutral", 0.2), ("happy", 0.7), ("sad", 0.1)]),
            latency,
        )
    }

    pub fn set_script(&self, script: Script) {
        *self.script.lock().unwrap() = script;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight counter even when the detect future is dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExpressionBackend for ScriptedBackend {
    async fn load(&self, _location: &Path) -> anyhow::Result<()> {
        if self.fail_load.load(Ordering::SeqCst) {
            anyhow::bail!("weights not found");
        }
        Ok(())
    }

    async fn detect(&self, _frame: &Frame) -> Result<Option<ExpressionScores>, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        tokio::time::sleep(self.latency).await;

        let script = self.script.lock().unwrap().clone();
        match script {
            Script::Face(scores) => Ok(Some(scores.into_iter().collect())),
            Script::NoFace => Ok(None),
            Script::Fail => Err(ClassifierError::ClassificationError("backend crashed".into())),
        }
    }
}

// --- assets ---

#[derive(Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
    pub releases: AtomicUsize,
    live: AtomicUsize,
    max_live: AtomicUsize,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<HashSet<String>>,
}

impl CountingLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn delay(&self, scene: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(scene.to_string(), delay);
    }

    pub fn fail(&self, scene: &str) {
        self.failing.lock().unwrap().insert(scene.to_string());
    }

    pub fn heal(&self, scene: &str) {
        self.failing.lock().unwrap().remove(scene);
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetLoader for CountingLoader {
    async fn load(&self, scene: &Scene) -> anyhow::Result<AssetHandle> {
        let delay = self.delays.lock().unwrap().get(scene.id.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(scene.id.as_str()) {
            anyhow::bail!("404 for {}", scene.asset);
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_live.fetch_max(now, Ordering::SeqCst);
        Ok(AssetHandle::new(scene.asset.clone(), glb_bytes()))
    }

    fn release(&self, _asset: AssetHandle) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

// --- panel ---

pub struct Rig {
    pub panel: XrPanel,
    pub camera: Arc<FakeCamera>,
    pub backend: Arc<ScriptedBackend>,
    pub loader: Arc<CountingLoader>,
    pub surface: Arc<HeadlessSurface>,
}

pub fn fast_settings() -> XrSettings {
    XrSettings {
        sampling_period_ms: 100,
        classify_timeout_ms: 1000,
        asset_load_timeout_ms: 2000,
        ..XrSettings::default()
    }
}

pub fn rig(camera: Arc<FakeCamera>, backend: Arc<ScriptedBackend>) -> Rig {
    rig_with(&fast_settings(), camera, backend)
}

pub fn rig_with(
    settings: &XrSettings,
    camera: Arc<FakeCamera>,
    backend: Arc<ScriptedBackend>,
) -> Rig {
    let loader = CountingLoader::new();
    let surface = Arc::new(HeadlessSurface::new());
    let panel = XrPanel::new(
        settings,
        PanelDeps {
            device: camera.clone(),
            backend: backend.clone(),
            loader: loader.clone(),
            surface: surface.clone(),
        },
    );
    Rig {
        panel,
        camera,
        backend,
        loader,
        surface,
    }
}

pub fn id(raw: &str) -> SceneId {
    SceneId::from(raw)
}
