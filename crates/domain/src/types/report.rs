//! Run summaries

use serde::{Deserialize, Serialize};

/// Outcome of one orchestrated sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub success_count: usize,
    pub failure_count: usize,
    /// Index entries without a readable detail file.
    pub skipped_count: usize,
    /// The run stopped early because cancellation was requested.
    pub cancelled: bool,
}

impl SyncReport {
    pub fn processed(&self) -> usize {
        self.success_count + self.failure_count
    }
}
