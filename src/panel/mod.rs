mod controller;

pub use controller::{PanelDeps, PanelSnapshot, XrPanel};
