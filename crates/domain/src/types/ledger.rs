//! Sync ledger: which external keys went to which remote ids

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::Fields;
use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Pending,
    Success,
    Failure,
}

impl_domain_status_conversions!(SyncStatus {
    Pending => "pending",
    Success => "success",
    Failure => "failure",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLedgerEntry {
    pub external_key: String,
    pub remote_id: Option<String>,
    pub status: SyncStatus,
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Key-indexed ledger persisted after every record.
///
/// Once a key has a remote id, only a confirmed write may replace it;
/// failures keep the id so the next run probes it instead of creating a
/// duplicate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncLedger {
    entries: BTreeMap<String, SyncLedgerEntry>,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, external_key: &str) -> Option<&SyncLedgerEntry> {
        self.entries.get(external_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &SyncLedgerEntry> {
        self.entries.values()
    }

    pub fn known_remote_id(&self, external_key: &str) -> Option<&str> {
        self.entries.get(external_key).and_then(|e| e.remote_id.as_deref())
    }

    /// Marks a key as in flight without touching its remote id.
    pub fn mark_pending(&mut self, external_key: &str, now: DateTime<Utc>) {
        let entry = self.entry(external_key, now);
        entry.status = SyncStatus::Pending;
        entry.updated_at = now;
    }

    /// Records a write the remote side confirmed.
    pub fn record_success(&mut self, external_key: &str, remote_id: impl Into<String>, now: DateTime<Utc>) {
        let entry = self.entry(external_key, now);
        entry.remote_id = Some(remote_id.into());
        entry.status = SyncStatus::Success;
        entry.error = None;
        entry.updated_at = now;
    }

    pub fn record_failure(&mut self, external_key: &str, error: impl Into<String>, now: DateTime<Utc>) {
        let entry = self.entry(external_key, now);
        entry.status = SyncStatus::Failure;
        entry.error = Some(error.into());
        entry.updated_at = now;
    }

    fn entry(&mut self, external_key: &str, now: DateTime<Utc>) -> &mut SyncLedgerEntry {
        self.entries.entry(external_key.to_string()).or_insert_with(|| SyncLedgerEntry {
            external_key: external_key.to_string(),
            remote_id: None,
            status: SyncStatus::Pending,
            error: None,
            updated_at: now,
        })
    }
}

/// A successful row in the outcome ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedRecord {
    pub id: String,
    pub fields: Fields,
}

/// A failed row in the outcome ledger, kept for manual retry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedRecord {
    pub error: String,
    pub fields: Fields,
    #[serde(default)]
    pub external_key: String,
    pub timestamp: DateTime<Utc>,
}

/// `{totalRecords, records}` document rewritten after each run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerDocument<T> {
    #[serde(rename = "totalRecords")]
    pub total_records: usize,
    pub records: Vec<T>,
}

impl<T> LedgerDocument<T> {
    pub fn from_records(records: Vec<T>) -> Self {
        Self { total_records: records.len(), records }
    }
}

impl<T> Default for LedgerDocument<T> {
    fn default() -> Self {
        Self::from_records(Vec::new())
    }
}
