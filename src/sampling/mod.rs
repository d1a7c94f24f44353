mod controller;
mod loop_worker;
mod stats;

pub use controller::SamplingController;
pub use loop_worker::SamplingConfig;
pub use stats::{SamplingStats, SamplingStatsSnapshot};
