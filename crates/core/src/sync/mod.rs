//! Lead synchronization: paging, reconciliation, upserts and the run loop

pub mod orchestrator;
pub mod pagination;
pub mod ports;
pub mod reconciler;
pub mod snapshot;
pub mod upserter;

#[cfg(test)]
pub(crate) mod test_support;

pub use orchestrator::SyncOrchestrator;
pub use pagination::{FetchOptions, FetchOutcome, PageWalker, PaginatedFetcher};
pub use ports::{LeadBatch, LeadSource, LedgerRepository, RecordStore, SkippedLead, SnapshotRepository};
pub use reconciler::{AnnotationPolicy, Reconciliation, RecordReconciler};
pub use snapshot::{SnapshotRefresh, SnapshotReport};
pub use upserter::{FieldGuard, IdempotentUpserter, UpsertAction, UpsertOutcome, UpsertSuccess};
