//! # LeadSync Infrastructure
//!
//! Infrastructure implementations of the core sync ports.
//!
//! This crate contains:
//! - The resilient HTTP client and per-operation timeout table
//! - Access-token management and the remote table adapters
//! - JSON file repositories for leads, ledgers and snapshots
//! - Crawler-output intake, config loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `leadsync-core`
//! - Contains all "impure" code (network, filesystem, global subscriber)

pub mod config;
pub mod errors;
pub mod http;
pub mod notable;
pub mod observability;
pub mod storage;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpRequest, ResilientHttpClient, TimeoutTable};
pub use notable::{AccessTokenProvider, NotableClient, NotableSession, RecordRetries, SheetResolver, TokenManager};
pub use storage::{CrawlerIntake, FileLeadSource, JsonLedgerRepository, JsonSnapshotRepository};
