//! Outbound HTTP with timeouts and retries

pub mod client;
pub mod timeouts;

pub use client::{HttpRequest, ResilientHttpClient, ResilientHttpClientBuilder};
pub use timeouts::TimeoutTable;
