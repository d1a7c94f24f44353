use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Expression label → confidence, kept in the order the classifier reported them.
///
/// Confidences are clamped to `0.0..=1.0`; they need not sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpressionScores(Vec<(String, f32)>);

impl ExpressionScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a label. Overwriting keeps the label's original position.
    pub fn insert(&mut self, label: impl Into<String>, score: f32) {
        let label = label.into();
        let score = if score.is_nan() { 0.0 } else { score.clamp(0.0, 1.0) };
        match self.0.iter_mut().find(|(existing, _)| *existing == label) {
            Some(entry) => entry.1 = score,
            None => self.0.push((label, score)),
        }
    }

    pub fn get(&self, label: &str) -> Option<f32> {
        self.0
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(label, score)| (label.as_str(), *score))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Label with the highest score; ties go to the label inserted first.
    pub fn dominant(&self) -> Option<&str> {
        let mut best: Option<(&str, f32)> = None;
        for (label, score) in self.iter() {
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((label, score)),
            }
        }
        best.map(|(label, _)| label)
    }
}

impl<S: Into<String>> FromIterator<(S, f32)> for ExpressionScores {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        let mut scores = Self::new();
        for (label, score) in iter {
            scores.insert(label, score);
        }
        scores
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub scores: ExpressionScores,
    pub timestamp: DateTime<Utc>,
    /// Sequence number of the frame this result was computed from.
    pub frame_sequence: u64,
}

impl ClassificationResult {
    pub fn new(scores: ExpressionScores, frame_sequence: u64) -> Self {
        Self {
            scores,
            timestamp: Utc::now(),
            frame_sequence,
        }
    }

    pub fn dominant_label(&self) -> Option<&str> {
        self.scores.dominant()
    }
}
