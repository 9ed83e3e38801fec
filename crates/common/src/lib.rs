//! Modular common utilities shared across LeadSync crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: retry policies, backoff schedules, log redaction
//! - `runtime`: async helpers built on tokio (throttling)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod privacy;
#[cfg(feature = "foundation")]
pub mod resilience;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod time;

// Re-export commonly used types
// ------------------------
#[cfg(feature = "foundation")]
pub use privacy::redact_url;
#[cfg(feature = "foundation")]
pub use resilience::{Jitter, PageBackoff, RetryDecision, RetryPolicy};
#[cfg(feature = "runtime")]
pub use time::{millis, Throttle};
