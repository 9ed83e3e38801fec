//! # LeadSync App
//!
//! Command-line entry point for the lead sync engine.
//!
//! This crate contains:
//! - Argument parsing
//! - Application context (dependency injection)
//! - The run sequence: crawler intake, snapshot refresh, sync
//!
//! ## Architecture
//! - Depends on `common`, `domain`, `core`, and `infra`
//! - Wires the remote adapters and JSON stores into the core services

pub mod cli;
pub mod context;
pub mod runner;

pub use cli::CliArgs;
pub use context::AppContext;
pub use runner::{run, RunSummary};
