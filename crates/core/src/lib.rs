//! # LeadSync Core
//!
//! Sync business logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the remote store and local files
//! - Paginated fetching with page-level retries
//! - Reconciliation of fetched records against the local snapshot
//! - Idempotent create-or-update and the sequential sync run
//!
//! ## Architecture Principles
//! - Depends only on `leadsync-domain` and `leadsync-common`
//! - No HTTP or filesystem code
//! - All external dependencies via traits

pub mod sync;

pub use sync::ports::{LeadBatch, LeadSource, LedgerRepository, RecordStore, SkippedLead, SnapshotRepository};
pub use sync::{
    AnnotationPolicy, FetchOptions, FetchOutcome, FieldGuard, IdempotentUpserter, PaginatedFetcher, RecordReconciler,
    SnapshotRefresh, SnapshotReport, SyncOrchestrator,
};
