//! Idempotent create-or-update of a single record
//!
//! With a remote id on file the record is probed first and updated only when
//! the probe confirms it. Without one, or when the probe says it is gone,
//! the record is created. A probe that fails outright also falls back to a
//! create so the run keeps moving; sustained probe failures can therefore
//! duplicate a record.

use std::sync::Arc;

use leadsync_domain::constants::MAX_FIELD_LENGTH;
use leadsync_domain::{Fields, LeadSyncError, Result, TableRef};
use tracing::{info, instrument, warn};

use super::ports::RecordStore;

/// Shapes payloads to the remote per-field size limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldGuard {
    max_length: usize,
}

impl Default for FieldGuard {
    fn default() -> Self {
        Self { max_length: MAX_FIELD_LENGTH }
    }
}

impl FieldGuard {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Returns the payload to send and the names of truncated fields.
    pub fn shape(&self, fields: &Fields) -> (Fields, Vec<String>) {
        let mut shaped = fields.clone();
        let truncated = shaped.truncate_oversized(self.max_length);
        for name in &truncated {
            warn!(field = %name, max_length = self.max_length, "field exceeds length limit; truncated");
        }
        for name in shaped.oversized_numbers(self.max_length) {
            warn!(field = %name, max_length = self.max_length, "numeric field exceeds length limit; sent unchanged");
        }
        (shaped, truncated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertSuccess {
    pub remote_id: String,
    pub action: UpsertAction,
}

/// Terminal state of one upsert, with the payload that was sent
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub external_key: String,
    pub fields: Fields,
    pub truncated_fields: Vec<String>,
    pub result: Result<UpsertSuccess>,
}

impl UpsertOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn remote_id(&self) -> Option<&str> {
        self.result.as_ref().ok().map(|s| s.remote_id.as_str())
    }

    pub fn error(&self) -> Option<&LeadSyncError> {
        self.result.as_ref().err()
    }
}

pub struct IdempotentUpserter {
    store: Arc<dyn RecordStore>,
    guard: FieldGuard,
}

impl IdempotentUpserter {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store, guard: FieldGuard::default() }
    }

    pub fn with_field_guard(mut self, guard: FieldGuard) -> Self {
        self.guard = guard;
        self
    }

    #[instrument(skip(self, table, fields), fields(sheet = %table.sheet))]
    pub async fn upsert(
        &self,
        table: &TableRef,
        external_key: &str,
        fields: &Fields,
        known_remote_id: Option<&str>,
    ) -> UpsertOutcome {
        let (payload, truncated_fields) = self.guard.shape(fields);
        let result = match payload.validate() {
            Ok(()) => self.write(table, &payload, known_remote_id).await,
            Err(err) => Err(err),
        };

        match &result {
            Ok(success) => {
                info!(remote_id = %success.remote_id, action = ?success.action, "record synced");
            }
            Err(err) => {
                warn!(error = %err, category = err.category(), "record sync failed");
            }
        }

        UpsertOutcome { external_key: external_key.to_string(), fields: payload, truncated_fields, result }
    }

    async fn write(&self, table: &TableRef, payload: &Fields, known_remote_id: Option<&str>) -> Result<UpsertSuccess> {
        if let Some(remote_id) = known_remote_id {
            if self.confirm_exists(table, remote_id).await {
                let remote_id = self.store.update_record(table, remote_id, payload).await?;
                return Ok(UpsertSuccess { remote_id, action: UpsertAction::Updated });
            }
        }

        let remote_id = self.store.create_record(table, payload).await?;
        if remote_id.is_empty() {
            return Err(LeadSyncError::Decode("create response carried an empty record id".into()));
        }
        Ok(UpsertSuccess { remote_id, action: UpsertAction::Created })
    }

    async fn confirm_exists(&self, table: &TableRef, remote_id: &str) -> bool {
        match self.store.get_record(table, remote_id).await {
            Ok(Some(_)) => true,
            Ok(None) => {
                info!(remote_id, "known record no longer exists remotely; creating");
                false
            }
            Err(err) => {
                warn!(remote_id, error = %err, "could not verify record existence; creating");
                false
            }
        }
    }
}
