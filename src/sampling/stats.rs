use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingStatsSnapshot {
    pub ticks: u64,
    pub no_frame: u64,
    pub no_face: u64,
    pub failures: u64,
    pub timeouts: u64,
    pub published: u64,
    /// Results thrown away because capture was released or the loop stopped mid-call.
    pub discarded: u64,
    pub last_classify_ms: u64,
}

#[derive(Default)]
struct Counters {
    ticks: AtomicU64,
    no_frame: AtomicU64,
    no_face: AtomicU64,
    failures: AtomicU64,
    timeouts: AtomicU64,
    published: AtomicU64,
    discarded: AtomicU64,
    last_classify_ms: AtomicU64,
}

/// Per-panel counters of the sampling loop. Shared between the loop and readers.
#[derive(Clone, Default)]
pub struct SamplingStats {
    inner: Arc<Counters>,
}

impl SamplingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_tick(&self) {
        self.inner.ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_no_frame(&self) {
        self.inner.no_frame.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_no_face(&self) {
        self.inner.no_face.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.inner.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.inner.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_published(&self) {
        self.inner.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self) {
        self.inner.discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_latency_ms(&self, millis: u64) {
        self.inner.last_classify_ms.store(millis, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SamplingStatsSnapshot {
        let c = &self.inner;
        SamplingStatsSnapshot {
            ticks: c.ticks.load(Ordering::Relaxed),
            no_frame: c.no_frame.load(Ordering::Relaxed),
            no_face: c.no_face.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            timeouts: c.timeouts.load(Ordering::Relaxed),
            published: c.published.load(Ordering::Relaxed),
            discarded: c.discarded.load(Ordering::Relaxed),
            last_classify_ms: c.last_classify_ms.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        let c = &self.inner;
        for counter in [
            &c.ticks,
            &c.no_frame,
            &c.no_face,
            &c.failures,
            &c.timeouts,
            &c.published,
            &c.discarded,
            &c.last_classify_ms,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
