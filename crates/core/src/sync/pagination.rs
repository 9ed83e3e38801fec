//! Cursor-based paging over the remote list endpoint
//!
//! Each page gets its own retry budget on top of the per-call retries done
//! by the transport. A page that keeps failing ends the walk; records from
//! earlier pages are kept.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream, TryStreamExt};
use leadsync_common::{millis, PageBackoff};
use leadsync_domain::config::{secs, PaginationConfig};
use leadsync_domain::{LeadSyncError, PageCursor, RecordPage, RemoteRecord, Result, TableRef};
use tracing::{debug, info, warn};

use super::ports::RecordStore;

/// Page-level retry and courtesy settings
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Attempts per page, including the first
    pub max_page_attempts: u32,
    /// Pause before each page after the first
    pub page_delay: Duration,
    pub backoff: PageBackoff,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self { max_page_attempts: 5, page_delay: Duration::from_secs(30), backoff: PageBackoff::default() }
    }
}

impl FetchOptions {
    pub fn from_config(config: &PaginationConfig) -> Self {
        Self {
            max_page_attempts: config.max_page_attempts.max(1),
            page_delay: secs(config.page_delay_secs),
            backoff: PageBackoff::new(secs(config.page_backoff_unit_secs), secs(config.max_page_backoff_secs)),
        }
    }
}

/// Result of walking every page
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub records: Vec<RemoteRecord>,
    pub pages: u32,
    /// Pages abandoned after exhausting their retries
    pub failed_pages: u32,
    pub last_error: Option<LeadSyncError>,
    /// The remote reported more pages without a way to reach them
    pub stopped_on_anomaly: bool,
}

impl FetchOutcome {
    pub fn is_partial(&self) -> bool {
        self.failed_pages > 0 || self.stopped_on_anomaly
    }
}

pub struct PaginatedFetcher {
    store: Arc<dyn RecordStore>,
    table: TableRef,
    options: FetchOptions,
}

impl PaginatedFetcher {
    pub fn new(store: Arc<dyn RecordStore>, table: TableRef) -> Self {
        Self { store, table, options: FetchOptions::default() }
    }

    pub fn with_options(mut self, options: FetchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    /// Walk from the first page.
    pub fn pages(&self) -> PageWalker<'_> {
        PageWalker { fetcher: self, cursor: None, page_index: 1, fetched: 0, exhausted: false, anomaly: false }
    }

    /// Resume a walk at a cursor saved from an earlier one.
    pub fn pages_from(&self, cursor: PageCursor) -> PageWalker<'_> {
        PageWalker { cursor: Some(cursor), ..self.pages() }
    }

    /// Lazy record stream; pages are only requested as records are consumed.
    pub fn records(&self) -> impl Stream<Item = Result<RemoteRecord>> + '_ {
        stream::try_unfold(self.pages(), |mut walker| async move {
            let next = walker.next_page().await?;
            Ok::<_, LeadSyncError>(
                next.map(|records| (stream::iter(records.into_iter().map(Ok::<_, LeadSyncError>)), walker)),
            )
        })
        .try_flatten()
    }

    /// Collect every page, keeping what was fetched if a later page fails.
    ///
    /// Fails only when the very first page cannot be fetched, or on an
    /// error that retrying would not fix.
    pub async fn fetch_all(&self) -> Result<FetchOutcome> {
        let mut walker = self.pages();
        let mut outcome = FetchOutcome::default();

        loop {
            match walker.next_page().await {
                Ok(Some(records)) => {
                    outcome.pages += 1;
                    outcome.records.extend(records);
                }
                Ok(None) => break,
                Err(err) if err.is_retryable() && outcome.pages > 0 => {
                    warn!(
                        sheet = %self.table.sheet,
                        pages = outcome.pages,
                        records = outcome.records.len(),
                        error = %err,
                        "page retries exhausted; keeping records fetched so far"
                    );
                    outcome.failed_pages += 1;
                    outcome.last_error = Some(err);
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        outcome.stopped_on_anomaly = walker.stopped_on_anomaly();
        info!(
            sheet = %self.table.sheet,
            pages = outcome.pages,
            records = outcome.records.len(),
            partial = outcome.is_partial(),
            "fetch complete"
        );
        Ok(outcome)
    }

    async fn fetch_page(&self, cursor: Option<&PageCursor>, page_index: u32) -> Result<RecordPage> {
        let max_attempts = self.options.max_page_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.store.list_page(&self.table, cursor).await {
                Ok(page) => return Ok(page),
                Err(err) if !err.is_retryable() => {
                    warn!(page = page_index, error = %err, "page failed with a non-retryable error");
                    return Err(err);
                }
                Err(err) if attempt >= max_attempts => {
                    return Err(LeadSyncError::OperationFailed {
                        attempts: attempt,
                        message: format!("page {page_index}: {err}"),
                    });
                }
                Err(err) => {
                    let delay = self.options.backoff.delay_for(attempt);
                    warn!(
                        page = page_index,
                        attempt,
                        max_attempts,
                        delay_ms = millis(delay),
                        error = %err,
                        "page fetch failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

/// Stateful position in a paged walk
///
/// The walk can be suspended after any page and resumed later from
/// [`cursor`](Self::cursor).
pub struct PageWalker<'a> {
    fetcher: &'a PaginatedFetcher,
    cursor: Option<PageCursor>,
    page_index: u32,
    fetched: u32,
    exhausted: bool,
    anomaly: bool,
}

impl PageWalker<'_> {
    /// Cursor of the next page to request
    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn stopped_on_anomaly(&self) -> bool {
        self.anomaly
    }

    /// Fetch the next page. `Ok(None)` once the remote reports no more pages.
    ///
    /// A failed page leaves the walker in place, so calling again retries it.
    pub async fn next_page(&mut self) -> Result<Option<Vec<RemoteRecord>>> {
        if self.exhausted {
            return Ok(None);
        }
        if self.fetched > 0 && !self.fetcher.options.page_delay.is_zero() {
            debug!(delay_ms = millis(self.fetcher.options.page_delay), "waiting before next page");
            tokio::time::sleep(self.fetcher.options.page_delay).await;
        }

        let page = self.fetcher.fetch_page(self.cursor.as_ref(), self.page_index).await?;
        self.fetched += 1;
        debug!(page = self.page_index, records = page.records.len(), has_more = page.has_more, "page fetched");

        if page.is_anomalous() {
            if page.records.is_empty() {
                warn!(page = self.page_index, "hasMore without records or cursor; stopping");
            } else {
                warn!(page = self.page_index, "hasMore without a cursor; stopping after this page");
            }
            self.anomaly = true;
            self.exhausted = true;
        } else if page.has_more {
            self.cursor = page.next_cursor;
        } else {
            self.exhausted = true;
        }
        self.page_index += 1;
        Ok(Some(page.records))
    }
}
