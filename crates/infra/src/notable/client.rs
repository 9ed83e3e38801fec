//! Record-store adapter for the remote table API

use std::sync::Arc;

use async_trait::async_trait;
use leadsync_common::RetryPolicy;
use leadsync_core::RecordStore;
use leadsync_domain::config::{OperationClass, RemoteConfig};
use leadsync_domain::{Fields, LeadSyncError, PageCursor, RecordPage, RemoteRecord, Result, TableRef};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use url::Url;

use super::session::NotableSession;
use super::views::SheetResolver;
use crate::http::HttpRequest;

/// Retry policies for the record endpoints.
#[derive(Debug, Clone)]
pub struct RecordRetries {
    pub list: RetryPolicy,
    pub probe: RetryPolicy,
    pub write: RetryPolicy,
}

pub struct NotableClient {
    session: NotableSession,
    sheets: Arc<SheetResolver>,
    records_url: String,
    record_url: String,
    page_size: u32,
    retries: RecordRetries,
}

impl NotableClient {
    pub fn new(session: NotableSession, sheets: Arc<SheetResolver>, remote: &RemoteConfig, retries: RecordRetries) -> Self {
        Self {
            session,
            sheets,
            records_url: remote.records_url.clone(),
            record_url: remote.record_url.clone(),
            page_size: remote.page_size,
            retries,
        }
    }

    async fn records_endpoint(&self, table: &TableRef) -> Result<Url> {
        let sheet_id = self.sheets.resolve(table).await?;
        self.session.url(&self.records_url, &[("table_id", table.base_id.as_str()), ("sheet_id", sheet_id.as_str())])
    }

    async fn record_endpoint(&self, table: &TableRef, record_id: &str) -> Result<Url> {
        let sheet_id = self.sheets.resolve(table).await?;
        self.session.url(
            &self.record_url,
            &[("table_id", table.base_id.as_str()), ("sheet_id", sheet_id.as_str()), ("record_id", record_id)],
        )
    }
}

#[async_trait]
impl RecordStore for NotableClient {
    #[instrument(skip(self, table), fields(sheet = %table.sheet))]
    async fn list_page(&self, table: &TableRef, cursor: Option<&PageCursor>) -> Result<RecordPage> {
        let mut url = self.records_endpoint(table).await?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("maxResults", &self.page_size.to_string());
            if let Some(cursor) = cursor {
                query.append_pair("nextToken", cursor.as_str());
            }
        }

        let request = HttpRequest::get(url.as_str(), OperationClass::GetRecords).retry(self.retries.list.clone());
        let value = self.session.call(request).await?;
        let page: RecordPage = serde_json::from_value(value)
            .map_err(|err| LeadSyncError::Decode(format!("unexpected list-records response: {err}")))?;
        debug!(records = page.records.len(), has_more = page.has_more, "records page received");
        Ok(page)
    }

    #[instrument(skip(self, table), fields(sheet = %table.sheet))]
    async fn get_record(&self, table: &TableRef, record_id: &str) -> Result<Option<RemoteRecord>> {
        let url = self.record_endpoint(table, record_id).await?;
        let request = HttpRequest::get(url.as_str(), OperationClass::CheckRecord).retry(self.retries.probe.clone());

        let value = match self.session.call(request).await {
            Ok(value) => value,
            Err(LeadSyncError::NotFound(_)) => {
                debug!("record not found");
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        let record: RemoteRecord = serde_json::from_value(value)
            .map_err(|err| LeadSyncError::Decode(format!("unexpected get-record response: {err}")))?;
        if record.id != record_id {
            warn!(returned_id = %record.id, "get-record answered with a different id; treating as absent");
            return Ok(None);
        }
        Ok(Some(record))
    }

    #[instrument(skip(self, table, fields), fields(sheet = %table.sheet))]
    async fn create_record(&self, table: &TableRef, fields: &Fields) -> Result<String> {
        let url = self.records_endpoint(table).await?;
        let request = HttpRequest::post(url.as_str(), OperationClass::UpdateRecord)
            .json(json!({ "records": [{ "fields": fields.to_json() }] }))
            .retry(self.retries.write.clone());

        let value = self.session.call(request).await?;
        first_record_id(&value)
            .map(str::to_string)
            .ok_or_else(|| LeadSyncError::Decode("create response carries no record id".into()))
    }

    #[instrument(skip(self, table, fields), fields(sheet = %table.sheet))]
    async fn update_record(&self, table: &TableRef, record_id: &str, fields: &Fields) -> Result<String> {
        let url = self.records_endpoint(table).await?;
        let request = HttpRequest::put(url.as_str(), OperationClass::UpdateRecord)
            .json(json!({ "records": [{ "id": record_id, "fields": fields.to_json() }] }))
            .retry(self.retries.write.clone());

        let value = self.session.call(request).await?;
        Ok(first_record_id(&value).unwrap_or(record_id).to_string())
    }
}

fn first_record_id(value: &Value) -> Option<&str> {
    value.get("value")?.get(0)?.get("id")?.as_str().filter(|id| !id.is_empty())
}
