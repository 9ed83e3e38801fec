//! In-memory doubles for the sync ports, shared by the unit tests

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use leadsync_domain::{
    FailedRecord, Fields, LeadSyncError, LedgerDocument, PageCursor, RecordPage, RecordSnapshot,
    RemoteRecord, RemoteRef, Result, SyncLedger, SyncedRecord, TableRef,
};

use super::ports::{LeadBatch, LeadSource, LedgerRepository, RecordStore, SnapshotRepository};

pub(crate) fn page(ids: &[&str], cursor: Option<&str>, has_more: bool) -> RecordPage {
    RecordPage {
        records: ids.iter().map(|id| RemoteRecord::new(*id)).collect(),
        next_cursor: cursor.map(PageCursor::new),
        has_more,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StoreCall {
    List(Option<String>),
    Get(String),
    Create,
    Update(String),
}

/// Remote store backed by a map, with scripted failures.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pages: Mutex<VecDeque<Result<RecordPage>>>,
    records: Mutex<BTreeMap<String, Fields>>,
    calls: Mutex<Vec<StoreCall>>,
    probe_errors: Mutex<VecDeque<LeadSyncError>>,
    write_errors: Mutex<VecDeque<LeadSyncError>>,
    next_id: Mutex<u32>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_page(&self, page: Result<RecordPage>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub(crate) fn fail_next_probe(&self, err: LeadSyncError) {
        self.probe_errors.lock().unwrap().push_back(err);
    }

    pub(crate) fn fail_next_write(&self, err: LeadSyncError) {
        self.write_errors.lock().unwrap().push_back(err);
    }

    pub(crate) fn seed(&self, id: &str, fields: Fields) {
        self.records.lock().unwrap().insert(id.to_string(), fields);
    }

    pub(crate) fn delete(&self, id: &str) {
        self.records.lock().unwrap().remove(id);
    }

    pub(crate) fn fields_of(&self, id: &str) -> Option<Fields> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub(crate) fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub(crate) fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, StoreCall::List(_))).count()
    }

    pub(crate) fn create_calls(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, StoreCall::Create)).count()
    }

    pub(crate) fn update_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Update(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record_call(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_write_error(&self) -> Option<LeadSyncError> {
        self.write_errors.lock().unwrap().pop_front()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_page(&self, _table: &TableRef, cursor: Option<&PageCursor>) -> Result<RecordPage> {
        self.record_call(StoreCall::List(cursor.map(|c| c.as_str().to_string())));
        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| Ok(RecordPage::default()))
    }

    async fn get_record(&self, _table: &TableRef, record_id: &str) -> Result<Option<RemoteRecord>> {
        self.record_call(StoreCall::Get(record_id.to_string()));
        if let Some(err) = self.probe_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        Ok(self.records.lock().unwrap().get(record_id).map(|_| RemoteRecord::new(record_id)))
    }

    async fn create_record(&self, _table: &TableRef, fields: &Fields) -> Result<String> {
        self.record_call(StoreCall::Create);
        if let Some(err) = self.take_write_error() {
            return Err(err);
        }
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        let id = format!("r{next}");
        self.records.lock().unwrap().insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn update_record(&self, _table: &TableRef, record_id: &str, fields: &Fields) -> Result<String> {
        self.record_call(StoreCall::Update(record_id.to_string()));
        if let Some(err) = self.take_write_error() {
            return Err(err);
        }
        let mut records = self.records.lock().unwrap();
        match records.get_mut(record_id) {
            Some(existing) => {
                *existing = fields.clone();
                Ok(record_id.to_string())
            }
            None => Err(LeadSyncError::NotFound(record_id.to_string())),
        }
    }
}

/// Lead source serving a fixed batch and remembering annotations.
#[derive(Default)]
pub(crate) struct MemorySource {
    batch: Mutex<LeadBatch>,
    load_error: Mutex<Option<LeadSyncError>>,
    pub(crate) marked: Mutex<Vec<RemoteRef>>,
}

impl MemorySource {
    pub(crate) fn new(batch: LeadBatch) -> Self {
        Self { batch: Mutex::new(batch), ..Self::default() }
    }

    pub(crate) fn replace(&self, batch: LeadBatch) {
        *self.batch.lock().unwrap() = batch;
    }

    pub(crate) fn fail_load(&self, err: LeadSyncError) {
        *self.load_error.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl LeadSource for MemorySource {
    async fn load(&self) -> Result<LeadBatch> {
        if let Some(err) = self.load_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(self.batch.lock().unwrap().clone())
    }

    async fn mark_synced(&self, reference: &RemoteRef) -> Result<()> {
        self.marked.lock().unwrap().push(reference.clone());
        Ok(())
    }
}

/// Ledger repository keeping the last written state in memory.
#[derive(Default)]
pub(crate) struct MemoryLedger {
    pub(crate) ledger: Mutex<SyncLedger>,
    pub(crate) saves: Mutex<usize>,
    pub(crate) synced: Mutex<LedgerDocument<SyncedRecord>>,
    pub(crate) failed: Mutex<LedgerDocument<FailedRecord>>,
}

#[async_trait]
impl LedgerRepository for MemoryLedger {
    async fn load_ledger(&self) -> Result<SyncLedger> {
        Ok(self.ledger.lock().unwrap().clone())
    }

    async fn save_ledger(&self, ledger: &SyncLedger) -> Result<()> {
        *self.ledger.lock().unwrap() = ledger.clone();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }

    async fn write_outcomes(
        &self,
        _table: &TableRef,
        synced: &LedgerDocument<SyncedRecord>,
        failed: &LedgerDocument<FailedRecord>,
    ) -> Result<()> {
        *self.synced.lock().unwrap() = synced.clone();
        *self.failed.lock().unwrap() = failed.clone();
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MemorySnapshots {
    pub(crate) snapshot: Mutex<RecordSnapshot>,
}

#[async_trait]
impl SnapshotRepository for MemorySnapshots {
    async fn load_snapshot(&self, _table: &TableRef) -> Result<RecordSnapshot> {
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn save_snapshot(&self, _table: &TableRef, snapshot: &RecordSnapshot) -> Result<()> {
        *self.snapshot.lock().unwrap() = snapshot.clone();
        Ok(())
    }
}
