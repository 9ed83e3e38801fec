//! Adapters for the remote table ("notable") API
//!
//! - [`auth`]: access-token lifecycle
//! - [`session`]: token-carrying requests and URL templates
//! - [`views`]: sheet-name resolution with a cached definition file
//! - [`client`]: the record store used by the sync engine

pub mod auth;
pub mod client;
pub mod session;
pub mod views;

pub use auth::{retry_policy, AccessTokenProvider, TokenManager};
pub use client::{NotableClient, RecordRetries};
pub use session::NotableSession;
pub use views::{SheetDefinition, SheetResolver, SheetView};
