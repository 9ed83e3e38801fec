//! Local snapshot of remote records

use std::path::PathBuf;

use async_trait::async_trait;
use leadsync_core::SnapshotRepository;
use leadsync_domain::{RecordSnapshot, Result, TableRef};

use super::json::{read_json_opt, write_json};
use super::ledger::file_stem;

/// Stores `<sheet>_records.json` in one directory.
pub struct JsonSnapshotRepository {
    dir: PathBuf,
}

impl JsonSnapshotRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn snapshot_path(&self, table: &TableRef) -> PathBuf {
        self.dir.join(format!("{}_records.json", file_stem(&table.sheet)))
    }
}

#[async_trait]
impl SnapshotRepository for JsonSnapshotRepository {
    async fn load_snapshot(&self, table: &TableRef) -> Result<RecordSnapshot> {
        Ok(read_json_opt(&self.snapshot_path(table)).await?.unwrap_or_default())
    }

    async fn save_snapshot(&self, table: &TableRef, snapshot: &RecordSnapshot) -> Result<()> {
        write_json(&self.snapshot_path(table), snapshot).await
    }
}
