//! JSON document helpers over `tokio::fs`

use std::path::Path;

use leadsync_domain::{LeadSyncError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::InfraError;

/// Reads and parses `path`; a missing file yields `Ok(None)`.
pub async fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(storage_error(path, err)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| LeadSyncError::Decode(format!("{}: {err}", path.display())))
}

/// Pretty-prints `value` into `path` through a temporary sibling file, so
/// readers never observe a half-written document.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|err| storage_error(parent, err))?;
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|err| LeadSyncError::from(InfraError::from(err)))?;
    let mut staging = path.as_os_str().to_owned();
    staging.push(".tmp");
    let staging = std::path::PathBuf::from(staging);
    tokio::fs::write(&staging, bytes).await.map_err(|err| storage_error(&staging, err))?;
    tokio::fs::rename(&staging, path).await.map_err(|err| storage_error(path, err))
}

pub(crate) fn storage_error(path: &Path, err: std::io::Error) -> LeadSyncError {
    match LeadSyncError::from(InfraError::from(err)) {
        LeadSyncError::Storage(message) => LeadSyncError::Storage(format!("{}: {message}", path.display())),
        other => other,
    }
}
