use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use crate::scenes::RecommendationPolicy;

const SAMPLING_PERIOD_ENV: &str = "MOODSCAPE_SAMPLING_PERIOD_MS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct XrSettings {
    pub sampling_period_ms: u64,
    pub classify_timeout_ms: u64,
    pub asset_load_timeout_ms: u64,
    /// Directory holding the expression model weights.
    pub model_location: PathBuf,
    /// Directory that scene asset URIs are resolved against.
    pub asset_root: PathBuf,
    pub recommendation_policy: RecommendationPolicy,
}

impl Default for XrSettings {
    fn default() -> Self {
        Self {
            sampling_period_ms: 1000,
            classify_timeout_ms: 3000,
            asset_load_timeout_ms: 15_000,
            model_location: PathBuf::from("models"),
            asset_root: PathBuf::from("public"),
            recommendation_policy: RecommendationPolicy::Uniform,
        }
    }
}

impl XrSettings {
    pub fn sampling_period(&self) -> Duration {
        Duration::from_millis(self.sampling_period_ms)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }

    pub fn asset_load_timeout(&self) -> Duration {
        Duration::from_millis(self.asset_load_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sampling_period_ms == 0 {
            bail!("sampling_period_ms must be greater than zero");
        }
        if self.classify_timeout_ms == 0 {
            bail!("classify_timeout_ms must be greater than zero");
        }
        if self.asset_load_timeout_ms == 0 {
            bail!("asset_load_timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Applies `MOODSCAPE_SAMPLING_PERIOD_MS` if it is set to a positive integer.
    fn with_env_overrides(mut self) -> Self {
        if let Some(period) = std::env::var(SAMPLING_PERIOD_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .filter(|period| *period > 0)
        {
            log::info!("sampling period overridden to {period}ms via {SAMPLING_PERIOD_ENV}");
            self.sampling_period_ms = period;
        }
        self
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<XrSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring unparsable settings at {}: {err}",
                    path.display()
                );
                XrSettings::default()
            })
        } else {
            XrSettings::default()
        };

        let data = data.with_env_overrides();
        data.validate()
            .with_context(|| format!("Invalid settings in {}", path.display()))?;

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn current(&self) -> XrSettings {
        self.read().clone()
    }

    pub fn update(&self, settings: XrSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.write();
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    fn persist(&self, data: &XrSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, XrSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, XrSettings> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
