mod adapter;
mod heuristic;

pub use adapter::{ExpressionBackend, ExpressionClassifier, ModelStatus};
pub use heuristic::{HeuristicBackend, LabelWeight, ModelManifest, MANIFEST_FILE};
