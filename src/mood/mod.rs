mod types;

pub use types::{ClassificationResult, ExpressionScores};

use tokio::sync::watch;

/// Process-wide holder of the latest classification. No history is kept.
///
/// Backed by a `watch` channel so readers never wait on the sampling loop.
#[derive(Clone)]
pub struct MoodTracker {
    tx: watch::Sender<Option<ClassificationResult>>,
}

impl MoodTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replaces the held result. Results are superseded, never merged.
    pub fn publish(&self, result: ClassificationResult) {
        self.tx.send_replace(Some(result));
    }

    pub fn latest(&self) -> Option<ClassificationResult> {
        self.tx.borrow().clone()
    }

    pub fn dominant_label(&self) -> Option<String> {
        self.tx
            .borrow()
            .as_ref()
            .and_then(|result| result.dominant_label().map(str::to_owned))
    }

    pub fn is_empty(&self) -> bool {
        self.tx.borrow().is_none()
    }

    pub fn clear(&self) {
        self.tx.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ClassificationResult>> {
        self.tx.subscribe()
    }
}

impl Default for MoodTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f32)]) -> ExpressionScores {
        pairs.iter().map(|(label, score)| (*label, *score)).collect()
    }

    #[test]
    fn dominant_label_picks_highest_score() {
        let result = ClassificationResult::new(
            scores(&[("neutral", 0.2), ("happy", 0.7), ("sad", 0.1)]),
            1,
        );
        assert_eq!(result.dominant_label(), Some("happy"));
    }

    #[test]
    fn ties_go_to_first_inserted_label() {
        let result = ClassificationResult::new(
            scores(&[("surprised", 0.4), ("happy", 0.4), ("neutral", 0.1)]),
            1,
        );
        for _ in 0..10 {
            assert_eq!(result.dominant_label(), Some("surprised"));
        }
    }

    #[test]
    fn overwriting_keeps_insertion_position() {
        let mut s = scores(&[("angry", 0.3), ("happy", 0.1)]);
        s.insert("happy", 0.3);
        assert_eq!(s.len(), 2);
        assert_eq!(s.dominant(), Some("angry"));
    }

    #[test]
    fn scores_are_clamped() {
        let s = scores(&[("happy", 1.7), ("sad", -0.2), ("angry", f32::NAN)]);
        assert_eq!(s.get("happy"), Some(1.0));
        assert_eq!(s.get("sad"), Some(0.0));
        assert_eq!(s.get("angry"), Some(0.0));
    }

    #[test]
    fn tracker_keeps_only_latest() {
        let tracker = MoodTracker::new();
        assert!(tracker.is_empty());
        assert_eq!(tracker.dominant_label(), None);

        tracker.publish(ClassificationResult::new(scores(&[("sad", 0.9)]), 1));
        tracker.publish(ClassificationResult::new(scores(&[("happy", 0.6)]), 2));

        let latest = tracker.latest().unwrap();
        assert_eq!(latest.frame_sequence, 2);
        assert_eq!(latest.scores.get("sad"), None);
        assert_eq!(tracker.dominant_label().as_deref(), Some("happy"));

        tracker.clear();
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn subscribers_see_publishes() {
        let tracker = MoodTracker::new();
        let mut rx = tracker.subscribe();
        tracker.publish(ClassificationResult::new(scores(&[("fearful", 0.5)]), 4));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().frame_sequence, 4);
    }

    #[test]
    fn empty_scores_have_no_dominant_label() {
        assert_eq!(ExpressionScores::new().dominant(), None);
    }
}
