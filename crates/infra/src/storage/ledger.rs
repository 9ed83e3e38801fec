//! File-backed sync ledger and outcome documents

use std::path::PathBuf;

use async_trait::async_trait;
use leadsync_core::LedgerRepository;
use leadsync_domain::constants::{FAILED_RECORDS_FILE, SYNC_LEDGER_FILE};
use leadsync_domain::{FailedRecord, LedgerDocument, Result, SyncLedger, SyncedRecord, TableRef};
use tracing::{debug, info};

use super::json::{read_json_opt, write_json};

/// Keeps `sync_ledger.json`, `<sheet>.json` and `failed_records.json` in
/// one directory.
pub struct JsonLedgerRepository {
    dir: PathBuf,
}

impl JsonLedgerRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.dir.join(SYNC_LEDGER_FILE)
    }

    pub fn synced_path(&self, table: &TableRef) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(&table.sheet)))
    }

    pub fn failed_path(&self) -> PathBuf {
        self.dir.join(FAILED_RECORDS_FILE)
    }
}

#[async_trait]
impl LedgerRepository for JsonLedgerRepository {
    async fn load_ledger(&self) -> Result<SyncLedger> {
        let ledger = read_json_opt::<SyncLedger>(&self.ledger_path()).await?.unwrap_or_default();
        debug!(entries = ledger.len(), "sync ledger loaded");
        Ok(ledger)
    }

    async fn save_ledger(&self, ledger: &SyncLedger) -> Result<()> {
        write_json(&self.ledger_path(), ledger).await
    }

    async fn write_outcomes(
        &self,
        table: &TableRef,
        synced: &LedgerDocument<SyncedRecord>,
        failed: &LedgerDocument<FailedRecord>,
    ) -> Result<()> {
        write_json(&self.synced_path(table), synced).await?;
        write_json(&self.failed_path(), failed).await?;
        info!(synced = synced.total_records, failed = failed.total_records, "outcome ledgers written");
        Ok(())
    }
}

/// Sheet names become file names; path separators are replaced.
pub(crate) fn file_stem(sheet: &str) -> String {
    sheet.chars().map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c }).collect()
}
