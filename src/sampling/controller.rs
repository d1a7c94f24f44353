use anyhow::{Context, Result};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureSource;
use crate::classifier::ExpressionClassifier;
use crate::error::XrError;
use crate::mood::MoodTracker;

use super::loop_worker::{sampling_loop, SamplingConfig, SamplingContext};
use super::SamplingStats;

/// Owns the sampling task. Its lifetime is bounded by `start`/`stop`, and
/// dropping the controller cancels a task that is still running.
pub struct SamplingController {
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
    stats: SamplingStats,
    config: SamplingConfig,
}

impl SamplingController {
    pub fn new(config: SamplingConfig) -> Self {
        Self {
            handle: None,
            cancel_token: None,
            stats: SamplingStats::new(),
            config,
        }
    }

    pub fn config(&self) -> SamplingConfig {
        self.config
    }

    pub fn stats(&self) -> SamplingStats {
        self.stats.clone()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn start(
        &mut self,
        capture: Arc<CaptureSource>,
        classifier: Arc<ExpressionClassifier>,
        tracker: MoodTracker,
    ) -> Result<(), XrError> {
        if self.is_running() {
            return Err(XrError::SamplingActive);
        }
        self.config.validate()?;
        // A loop that ended on its own still has a token and handle to clear.
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.handle = None;

        let cancel_token = CancellationToken::new();
        let ctx = SamplingContext {
            capture,
            classifier,
            tracker,
            stats: self.stats.clone(),
            config: self.config,
        };

        info!(
            "starting mood sampling every {}ms",
            self.config.period.as_millis()
        );
        let handle = tokio::spawn(sampling_loop(ctx, cancel_token.clone()));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels the timer and any in-flight classification, then waits for the task to exit.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("sampling loop task failed to join")
                .map(|_| ())
        } else {
            Ok(())
        }
    }
}

impl Drop for SamplingController {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }
}
