//! Time utilities
//!
//! - [`Throttle`]: randomized pauses between rate-limited operations
//! - [`millis`]: durations as log-friendly millisecond counts

pub mod throttle;

use std::time::Duration;

pub use throttle::Throttle;

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
