//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use leadsync_domain::LeadSyncError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LeadSyncError);

impl From<InfraError> for LeadSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LeadSyncError> for InfraError {
    fn from(value: LeadSyncError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoLeadSyncError {
    fn into_leadsync(self) -> LeadSyncError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LeadSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLeadSyncError for HttpError {
    fn into_leadsync(self) -> LeadSyncError {
        if self.is_timeout() {
            return LeadSyncError::Transient("HTTP request timed out".into());
        }

        if self.is_connect() {
            return LeadSyncError::Transient("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            return status_error(status.as_u16(), status.canonical_reason().unwrap_or("unknown status"));
        }

        if self.is_decode() {
            return LeadSyncError::Decode(format!("response body could not be decoded: {self}"));
        }

        if self.is_builder() {
            return LeadSyncError::Config(format!("invalid request: {self}"));
        }

        LeadSyncError::Transient(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_leadsync())
    }
}

/// Classifies a non-success HTTP status.
///
/// 5xx is transient; 404 is kept distinct so existence probes can treat it
/// as a negative answer. 401/403 stay plain HTTP errors: they concern one
/// request, and only a failed token acquisition is reported as
/// [`LeadSyncError::Auth`]. 429 and the remaining 4xx are not retried.
pub fn status_error(code: u16, message: &str) -> LeadSyncError {
    let message = format!("HTTP {code} {message}");
    match code {
        404 => LeadSyncError::NotFound(message),
        500..=599 => LeadSyncError::Transient(message),
        _ => LeadSyncError::Http { status: code, message },
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → LeadSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLeadSyncError for IoError {
    fn into_leadsync(self) -> LeadSyncError {
        match self.kind() {
            ErrorKind::NotFound => LeadSyncError::Storage(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => LeadSyncError::Storage(format!("permission denied: {self}")),
            ErrorKind::InvalidData => LeadSyncError::Decode(self.to_string()),
            _ => LeadSyncError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_leadsync())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → LeadSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLeadSyncError for JsonError {
    fn into_leadsync(self) -> LeadSyncError {
        if self.is_io() {
            return LeadSyncError::Storage(self.to_string());
        }
        LeadSyncError::Decode(format!("invalid JSON at line {} column {}: {self}", self.line(), self.column()))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_leadsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
