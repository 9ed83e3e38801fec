//! Domain types and models
//!
//! Records on both sides of the sync, the ledger that links them, and the
//! typed field payload that travels between them.

pub mod credential;
pub mod fields;
pub mod lead;
pub mod ledger;
pub mod record;
pub mod report;

pub use credential::Credential;
pub use fields::{FieldValue, Fields};
pub use lead::{JoinedLead, LocalSourceRecord, RemoteRef};
pub use ledger::{
    FailedRecord, LedgerDocument, SyncLedger, SyncLedgerEntry, SyncStatus, SyncedRecord,
};
pub use record::{PageCursor, RecordPage, RecordSnapshot, RemoteRecord, SnapshotRecord, TableRef};
pub use report::SyncReport;
