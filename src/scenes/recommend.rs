use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::SceneId;

/// How a recommendation is drawn from the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPolicy {
    /// Uniform pick, ignoring the detected mood.
    #[default]
    Uniform,
    /// Uniform pick among entries tagged with the dominant mood, falling back to
    /// the whole corpus when no entry matches.
    MoodConditioned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecommendationTrigger {
    UserRequest,
    MoodChanged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub text: String,
    pub scene: Option<SceneId>,
}

struct CorpusEntry {
    text: &'static str,
    scene: &'static str,
    moods: &'static [&'static str],
}

const CORPUS: &[CorpusEntry] = &[
    CorpusEntry {
        text: "Based on your travel history and current mood, we recommend the Beach scene to help you relax before your upcoming flight.",
        scene: "beach",
        moods: &["sad", "angry"],
    },
    CorpusEntry {
        text: "Your recent search for ski resorts and excited mood suggests you might enjoy our Mountain XR experience.",
        scene: "mountain",
        moods: &["happy", "surprised"],
    },
    CorpusEntry {
        text: "To prepare for your upcoming trip to the Amazon and calm your nerves, try our immersive Forest experience.",
        scene: "forest",
        moods: &["fearful", "disgusted"],
    },
];

pub struct RecommendationEngine {
    policy: RecommendationPolicy,
    rng: Mutex<StdRng>,
}

impl RecommendationEngine {
    pub fn new(policy: RecommendationPolicy) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic engine for tests and replays.
    pub fn with_seed(policy: RecommendationPolicy, seed: u64) -> Self {
        Self {
            policy,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn policy(&self) -> RecommendationPolicy {
        self.policy
    }

    pub fn corpus_len(&self) -> usize {
        CORPUS.len()
    }

    /// Draws one recommendation. `mood` is only consulted by the mood-conditioned policy.
    pub fn recommend(&self, trigger: RecommendationTrigger, mood: Option<&str>) -> Recommendation {
        let candidates: Vec<&CorpusEntry> = match (self.policy, mood) {
            (RecommendationPolicy::MoodConditioned, Some(mood)) => {
                let matching: Vec<&CorpusEntry> = CORPUS
                    .iter()
                    .filter(|entry| entry.moods.contains(&mood))
                    .collect();
                if matching.is_empty() {
                    CORPUS.iter().collect()
                } else {
                    matching
                }
            }
            _ => CORPUS.iter().collect(),
        };

        let index = {
            let mut rng = match self.rng.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            rng.gen_range(0..candidates.len())
        };
        let entry = candidates[index];

        log::debug!(
            "recommendation for {:?} (policy {:?}, mood {:?}): {}",
            trigger,
            self.policy,
            mood,
            entry.scene
        );

        Recommendation {
            text: entry.text.to_string(),
            scene: Some(SceneId::new(entry.scene)),
        }
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(RecommendationPolicy::default())
    }
}
