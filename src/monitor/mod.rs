#[allow(clippy::module_inception)]
mod monitor;

pub use monitor::{CycleSummary, Monitor};
