//! JSON file adapters for the sync ports

pub mod intake;
pub mod json;
pub mod ledger;
pub mod snapshot;
pub mod source;

pub use intake::{CrawlerIntake, IntakeReport};
pub use ledger::JsonLedgerRepository;
pub use snapshot::JsonSnapshotRepository;
pub use source::{detail_file, FileLeadSource, IndexEntry};
