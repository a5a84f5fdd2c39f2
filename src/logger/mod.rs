//! Process-wide `tracing` setup. The subscriber starts at a bootstrap level
//! and is reloaded once `Settings::log` is known.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
