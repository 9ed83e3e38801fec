//! Intake of crawler output into the lead source directory
//!
//! The crawler writes each run into `<root>/YYYYMMDD_HHMMSS/` and reruns of
//! failed pages into `<root>/retry_YYYYMMDD_HHMMSS/`. Intake copies the JSON
//! files of the latest directory of each kind into the source directory;
//! files from the retry run replace same-named files from the regular run.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use leadsync_domain::{LeadSyncError, Result};
use tracing::{debug, info, warn};

use super::json::storage_error;

const RUN_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const RETRY_PREFIX: &str = "retry_";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeReport {
    pub run_dir: Option<PathBuf>,
    pub retry_dir: Option<PathBuf>,
    pub copied: usize,
}

pub struct CrawlerIntake {
    root: PathBuf,
    target: PathBuf,
}

impl CrawlerIntake {
    pub fn new(root: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), target: target.into() }
    }

    pub async fn collect(&self) -> Result<IntakeReport> {
        let (run_dir, retry_dir) = self.latest_dirs().await?;
        if run_dir.is_none() && retry_dir.is_none() {
            return Err(LeadSyncError::Storage(format!("no crawler output directories under {}", self.root.display())));
        }

        tokio::fs::create_dir_all(&self.target).await.map_err(|err| storage_error(&self.target, err))?;
        let mut copied = 0;
        for dir in run_dir.iter().chain(retry_dir.iter()) {
            let count = self.copy_json_files(dir).await?;
            info!(from = %dir.display(), files = count, "crawler output copied");
            copied += count;
        }

        Ok(IntakeReport { run_dir, retry_dir, copied })
    }

    /// Latest regular and latest retry directory, by the timestamp in their
    /// names. Names with an invalid timestamp are ignored.
    async fn latest_dirs(&self) -> Result<(Option<PathBuf>, Option<PathBuf>)> {
        let mut latest_run: Option<(NaiveDateTime, PathBuf)> = None;
        let mut latest_retry: Option<(NaiveDateTime, PathBuf)> = None;

        let mut entries = tokio::fs::read_dir(&self.root).await.map_err(|err| storage_error(&self.root, err))?;
        while let Some(entry) = entries.next_entry().await.map_err(|err| storage_error(&self.root, err))? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let (stamp, slot) = match name.strip_prefix(RETRY_PREFIX) {
                Some(stamp) => (stamp, &mut latest_retry),
                None => (name.as_str(), &mut latest_run),
            };
            if !is_run_stamp(stamp) {
                continue;
            }
            let Ok(at) = NaiveDateTime::parse_from_str(stamp, RUN_STAMP_FORMAT) else {
                warn!(dir = %name, "directory name is not a valid run timestamp");
                continue;
            };
            if slot.as_ref().map_or(true, |(best, _)| at > *best) {
                *slot = Some((at, entry.path()));
            }
        }

        Ok((latest_run.map(|(_, path)| path), latest_retry.map(|(_, path)| path)))
    }

    async fn copy_json_files(&self, dir: &Path) -> Result<usize> {
        let mut copied = 0;
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|err| storage_error(dir, err))?;
        while let Some(entry) = entries.next_entry().await.map_err(|err| storage_error(dir, err))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let destination = self.target.join(entry.file_name());
            tokio::fs::copy(&path, &destination).await.map_err(|err| storage_error(&path, err))?;
            debug!(file = %destination.display(), "copied");
            copied += 1;
        }
        Ok(copied)
    }
}

/// `YYYYMMDD_HHMMSS`, digits only.
fn is_run_stamp(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'_'
        && bytes.iter().enumerate().all(|(i, b)| i == 8 || b.is_ascii_digit())
}
