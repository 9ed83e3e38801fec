//! # LeadSync Domain
//!
//! Business domain types for the lead synchronization engine.
//!
//! This crate contains:
//! - Record, field and ledger types shared by every layer
//! - The error taxonomy and `Result` alias
//! - Configuration structures with defaults
//! - Domain constants
//!
//! ## Architecture
//! - No dependencies on other LeadSync crates
//! - No I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
