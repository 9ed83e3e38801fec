//! Error types used throughout the sync engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for lead synchronization
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "details")]
pub enum LeadSyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition failed after its own retry. Fatal to a run.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Timeout, connection failure or HTTP 5xx.
    #[error("Transient HTTP error: {0}")]
    Transient(String),

    /// A retryable call that kept failing until its retry budget ran out.
    #[error("Operation failed after {attempts} attempt(s): {message}")]
    OperationFailed { attempts: u32, message: String },

    /// Non-retryable HTTP status (4xx other than the probe's 404).
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed local data or a missing required field.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Source or ledger storage could not be accessed.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LeadSyncError {
    /// Whether an outer retry tier may try the same work again.
    ///
    /// Exhausted call-level retries still count as retryable for the
    /// page-level tier, which has its own, slower schedule.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::OperationFailed { .. })
    }

    /// Whether the error aborts a whole run instead of a single record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::Storage(_) | Self::Config(_) | Self::Cancelled)
    }

    /// Number of attempts made before giving up, when known.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::OperationFailed { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Short label for structured log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::Transient(_) => "transient",
            Self::OperationFailed { .. } => "operation_failed",
            Self::Http { .. } => "http",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::Decode(_) => "decode",
            Self::Cancelled => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, LeadSyncError>;
