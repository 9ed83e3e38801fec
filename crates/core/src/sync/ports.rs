//! Port interfaces for sync operations

use async_trait::async_trait;
use leadsync_domain::{
    FailedRecord, Fields, LedgerDocument, LocalSourceRecord, PageCursor, RecordPage, RecordSnapshot,
    RemoteRecord, RemoteRef, Result, SyncLedger, SyncedRecord, TableRef,
};

/// Remote tabular store holding the synced leads
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one page of records, starting at `cursor` when given
    async fn list_page(&self, table: &TableRef, cursor: Option<&PageCursor>) -> Result<RecordPage>;

    /// Existence probe: `Ok(None)` means the record is confirmed absent
    async fn get_record(&self, table: &TableRef, record_id: &str) -> Result<Option<RemoteRecord>>;

    /// Create a record and return its remote id
    async fn create_record(&self, table: &TableRef, fields: &Fields) -> Result<String>;

    /// Overwrite the fields of an existing record and return its id
    async fn update_record(&self, table: &TableRef, record_id: &str, fields: &Fields) -> Result<String>;
}

/// A lead that could not be joined with its detail file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLead {
    pub external_key: String,
    pub reason: String,
}

/// Everything a source produced for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadBatch {
    pub records: Vec<LocalSourceRecord>,
    pub skipped: Vec<SkippedLead>,
}

/// Local leads waiting to be synced
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Load every pending lead; unreadable storage is a fatal error
    async fn load(&self) -> Result<LeadBatch>;

    /// Annotate the lead's detail file with its remote identity
    async fn mark_synced(&self, reference: &RemoteRef) -> Result<()>;
}

/// Persistence for the sync ledger and the per-run outcome documents
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn load_ledger(&self) -> Result<SyncLedger>;

    async fn save_ledger(&self, ledger: &SyncLedger) -> Result<()>;

    /// Rewrite the success and failure documents for a finished run
    async fn write_outcomes(
        &self,
        table: &TableRef,
        synced: &LedgerDocument<SyncedRecord>,
        failed: &LedgerDocument<FailedRecord>,
    ) -> Result<()>;
}

/// Local copy of remote records with their annotation fields
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// An absent snapshot loads as empty
    async fn load_snapshot(&self, table: &TableRef) -> Result<RecordSnapshot>;

    async fn save_snapshot(&self, table: &TableRef, snapshot: &RecordSnapshot) -> Result<()>;
}
