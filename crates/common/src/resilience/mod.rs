//! Resilience primitives for calls against rate-limited remote APIs
//!
//! - [`RetryPolicy`]: bounded exponential backoff with jitter for single calls
//! - [`PageBackoff`]: the slower schedule used when a whole page is retried

pub mod page_backoff;
pub mod retry;

pub use page_backoff::PageBackoff;
pub use retry::{Jitter, RetryDecision, RetryPolicy};
