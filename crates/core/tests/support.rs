#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use leadsync_core::{LeadBatch, LeadSource, LedgerRepository, RecordStore};
use leadsync_domain::{
    FailedRecord, Fields, LeadSyncError, LedgerDocument, LocalSourceRecord, PageCursor, RecordPage, RemoteRecord,
    RemoteRef, Result, SyncLedger, SyncedRecord, TableRef,
};

pub fn table() -> TableRef {
    TableRef::new("base", "Leads")
}

pub fn lead(key: &str, name: &str) -> LocalSourceRecord {
    LocalSourceRecord::new(key, Fields::new().with("name", name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List(Option<String>),
    Get(String),
    Create,
    Update(String),
}

/// Remote table held in a map. List responses are scripted per call.
#[derive(Default)]
pub struct FakeTable {
    pub rows: Mutex<BTreeMap<String, Fields>>,
    pub calls: Mutex<Vec<Call>>,
    pages: Mutex<VecDeque<Result<RecordPage>>>,
}

impl FakeTable {
    pub fn script_page(&self, page: Result<RecordPage>) {
        self.pages.lock().unwrap().push_back(page);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn creates(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Create).count()
    }
}

pub fn page_of(ids: &[&str], next: Option<&str>) -> RecordPage {
    RecordPage {
        records: ids.iter().map(|id| RemoteRecord::new(*id)).collect(),
        next_cursor: next.map(PageCursor::new),
        has_more: next.is_some(),
    }
}

#[async_trait]
impl RecordStore for FakeTable {
    async fn list_page(&self, _table: &TableRef, cursor: Option<&PageCursor>) -> Result<RecordPage> {
        self.calls.lock().unwrap().push(Call::List(cursor.map(|c| c.as_str().to_string())));
        self.pages.lock().unwrap().pop_front().unwrap_or_else(|| Ok(RecordPage::default()))
    }

    async fn get_record(&self, _table: &TableRef, record_id: &str) -> Result<Option<RemoteRecord>> {
        self.calls.lock().unwrap().push(Call::Get(record_id.to_string()));
        Ok(self.rows.lock().unwrap().get(record_id).map(|_| RemoteRecord::new(record_id)))
    }

    async fn create_record(&self, _table: &TableRef, fields: &Fields) -> Result<String> {
        self.calls.lock().unwrap().push(Call::Create);
        let mut rows = self.rows.lock().unwrap();
        let id = format!("r{}", rows.len() + 1);
        rows.insert(id.clone(), fields.clone());
        Ok(id)
    }

    async fn update_record(&self, _table: &TableRef, record_id: &str, fields: &Fields) -> Result<String> {
        self.calls.lock().unwrap().push(Call::Update(record_id.to_string()));
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(record_id).ok_or_else(|| LeadSyncError::NotFound(record_id.to_string()))?;
        *row = fields.clone();
        Ok(record_id.to_string())
    }
}

#[derive(Default)]
pub struct FixedSource {
    pub batch: Mutex<LeadBatch>,
    pub marked: Mutex<Vec<RemoteRef>>,
}

impl FixedSource {
    pub fn with(records: Vec<LocalSourceRecord>) -> Self {
        Self { batch: Mutex::new(LeadBatch { records, skipped: Vec::new() }), ..Self::default() }
    }

    pub fn set(&self, records: Vec<LocalSourceRecord>) {
        self.batch.lock().unwrap().records = records;
    }
}

#[async_trait]
impl LeadSource for FixedSource {
    async fn load(&self) -> Result<LeadBatch> {
        Ok(self.batch.lock().unwrap().clone())
    }

    async fn mark_synced(&self, reference: &RemoteRef) -> Result<()> {
        self.marked.lock().unwrap().push(reference.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct KeptLedger {
    pub ledger: Mutex<SyncLedger>,
    pub synced: Mutex<LedgerDocument<SyncedRecord>>,
    pub failed: Mutex<LedgerDocument<FailedRecord>>,
}

#[async_trait]
impl LedgerRepository for KeptLedger {
    async fn load_ledger(&self) -> Result<SyncLedger> {
        Ok(self.ledger.lock().unwrap().clone())
    }

    async fn save_ledger(&self, ledger: &SyncLedger) -> Result<()> {
        *self.ledger.lock().unwrap() = ledger.clone();
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
