use std::sync::Arc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::capture::CaptureSource;
use crate::classifier::ExpressionClassifier;
use crate::error::{ClassifierError, XrError};
use crate::mood::MoodTracker;

use super::SamplingStats;

// Set to false to silence per-tick logging
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    pub period: Duration,
    pub classify_timeout: Duration,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(1000),
            classify_timeout: Duration::from_millis(3000),
        }
    }
}

impl SamplingConfig {
    /// Both durations must be non-zero; `tokio::time::interval` panics on a zero period.
    pub fn validate(&self) -> Result<(), XrError> {
        if self.period.is_zero() {
            return Err(XrError::InvalidSettings(
                "sampling period must be greater than zero".into(),
            ));
        }
        if self.classify_timeout.is_zero() {
            return Err(XrError::InvalidSettings(
                "classify timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TickOutcome {
    Published,
    NotAcquired,
    NoFrame,
    NoFace,
    Failed,
    TimedOut,
    /// Capture was released while the call was outstanding.
    Discarded,
    Cancelled,
}

pub(crate) struct SamplingContext {
    pub capture: Arc<CaptureSource>,
    pub classifier: Arc<ExpressionClassifier>,
    pub tracker: MoodTracker,
    pub stats: SamplingStats,
    pub config: SamplingConfig,
}

/// Capture → classify → publish on a fixed period until `cancel_token` fires.
///
/// Classification runs inline, so a slow call delays the next tick instead of
/// overlapping it; ticks that fell due meanwhile are skipped, not queued.
pub(crate) async fn sampling_loop(ctx: SamplingContext, cancel_token: CancellationToken) {
    let mut ticker = tokio::time::interval(ctx.config.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("sampling loop shutting down");
                break;
            }
            _ = ticker.tick() => {}
        }

        let outcome = sample_once(&ctx, &cancel_token).await;
        match outcome {
            TickOutcome::Published => ctx.stats.record_published(),
            TickOutcome::NotAcquired => {}
            TickOutcome::NoFrame => ctx.stats.record_no_frame(),
            TickOutcome::NoFace => ctx.stats.record_no_face(),
            TickOutcome::Failed => ctx.stats.record_failure(),
            TickOutcome::TimedOut => ctx.stats.record_timeout(),
            TickOutcome::Discarded => ctx.stats.record_discarded(),
            TickOutcome::Cancelled => {
                ctx.stats.record_discarded();
                log_info!("sampling loop cancelled mid-classification");
                break;
            }
        }
    }
}

async fn sample_once(ctx: &SamplingContext, cancel_token: &CancellationToken) -> TickOutcome {
    if !ctx.capture.is_acquired() {
        return TickOutcome::NotAcquired;
    }
    ctx.stats.record_tick();

    let frame = match ctx.capture.current_frame() {
        Ok(frame) => frame,
        Err(_) => return TickOutcome::NoFrame,
    };

    let started = Instant::now();
    let classified = tokio::select! {
        biased;
        _ = cancel_token.cancelled() => return TickOutcome::Cancelled,
        result = tokio::time::timeout(ctx.config.classify_timeout, ctx.classifier.classify(&frame)) => result,
    };
    ctx.stats
        .record_latency_ms(started.elapsed().as_millis() as u64);

    if cancel_token.is_cancelled() {
        return TickOutcome::Cancelled;
    }
    if !ctx.capture.is_acquired() {
        return TickOutcome::Discarded;
    }

    match classified {
        Ok(Ok(result)) => {
            log_debug!(
                "frame {} classified as {:?}",
                result.frame_sequence,
                result.dominant_label()
            );
            ctx.tracker.publish(result);
            TickOutcome::Published
        }
        Ok(Err(ClassifierError::NoFaceDetected)) => TickOutcome::NoFace,
        Ok(Err(err)) => {
            log_debug!("classification of frame {} dropped: {err}", frame.sequence);
            TickOutcome::Failed
        }
        Err(_) => {
            log_warn!(
                "classification of frame {} timed out (> {}ms)",
                frame.sequence,
                ctx.config.classify_timeout.as_millis()
            );
            TickOutcome::TimedOut
        }
    }
}
