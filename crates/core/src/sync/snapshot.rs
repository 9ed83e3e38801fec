//! Pull remote records into the local snapshot

use std::collections::BTreeSet;
use std::sync::Arc;

use leadsync_domain::{RecordSnapshot, Result};
use tracing::info;

use super::pagination::PaginatedFetcher;
use super::ports::SnapshotRepository;
use super::reconciler::RecordReconciler;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotReport {
    pub fetched: usize,
    pub fresh: usize,
    pub preserved: usize,
    /// Local records kept as they were because their page was not reached.
    pub carried: usize,
    pub failed_pages: u32,
    pub partial: bool,
}

/// Fetch → reconcile → save
pub struct SnapshotRefresh {
    fetcher: PaginatedFetcher,
    reconciler: RecordReconciler,
    snapshots: Arc<dyn SnapshotRepository>,
}

impl SnapshotRefresh {
    pub fn new(fetcher: PaginatedFetcher, reconciler: RecordReconciler, snapshots: Arc<dyn SnapshotRepository>) -> Self {
        Self { fetcher, reconciler, snapshots }
    }

    /// A partial fetch still rewrites the snapshot. Local records missing
    /// from it are kept unchanged, annotations included.
    pub async fn run(&self) -> Result<SnapshotReport> {
        let table = self.fetcher.table();
        let outcome = self.fetcher.fetch_all().await?;
        let local = self.snapshots.load_snapshot(table).await?;

        let partial = outcome.is_partial();
        let failed_pages = outcome.failed_pages;
        let fetched = outcome.records.len();
        let (mut snapshot, stats) = self.reconciler.apply(outcome.records, &local);

        let mut carried = 0;
        if partial {
            let seen: BTreeSet<String> = snapshot.records.iter().map(|r| r.record.id.clone()).collect();
            let unreached: Vec<_> = local.records.into_iter().filter(|r| !seen.contains(&r.record.id)).collect();
            carried = unreached.len();
            let mut records = snapshot.records;
            records.extend(unreached);
            snapshot = RecordSnapshot::from_records(records);
        }
        self.snapshots.save_snapshot(table, &snapshot).await?;

        info!(
            sheet = %table.sheet,
            fetched,
            fresh = stats.fresh,
            preserved = stats.preserved,
            carried,
            partial,
            "snapshot refreshed"
        );
        Ok(SnapshotReport { fetched, fresh: stats.fresh, preserved: stats.preserved, carried, failed_pages, partial })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::DateTime;
    use leadsync_common::PageBackoff;
    use leadsync_domain::constants::NEEDS_REVIEW_FIELD;
    use leadsync_domain::{FieldValue, Fields, LeadSyncError, RecordSnapshot, RemoteRecord, SnapshotRecord, TableRef};

    use super::*;
    use crate::sync::pagination::FetchOptions;
    use crate::sync::test_support::{page, MemorySnapshots, MemoryStore};

    fn refresh(store: Arc<MemoryStore>, snapshots: Arc<MemorySnapshots>) -> SnapshotRefresh {
        let options = FetchOptions {
            max_page_attempts: 2,
            page_delay: Duration::ZERO,
            backoff: PageBackoff::new(Duration::from_millis(1), Duration::from_millis(2)),
        };
        let fetcher = PaginatedFetcher::new(store, TableRef::new("base", "Leads")).with_options(options);
        SnapshotRefresh::new(fetcher, RecordReconciler::default(), snapshots)
    }

    #[tokio::test]
    async fn keeps_annotations_of_unchanged_records() {
        let modified = DateTime::from_timestamp(1_000, 0).unwrap();
        let store = Arc::new(MemoryStore::new());
        let mut first = page(&["r1", "r2"], None, false);
        first.records[0] = RemoteRecord::new("r1").modified_at(modified);
        store.push_page(Ok(first));

        let snapshots = Arc::new(MemorySnapshots::default());
        *snapshots.snapshot.lock().unwrap() = RecordSnapshot::from_records(vec![SnapshotRecord {
            record: RemoteRecord::new("r1").modified_at(modified),
            annotations: Fields::new().with(NEEDS_REVIEW_FIELD, false),
        }]);

        let report = refresh(store, snapshots.clone()).run().await.unwrap();

        assert_eq!(report, SnapshotReport {
                fetched: 2,
                fresh: 1,
                preserved: 1,
                carried: 0,
                failed_pages: 0,
                partial: false
            });
        let saved = snapshots.snapshot.lock().unwrap().clone();
        assert_eq!(saved.records[0].annotations.get(NEEDS_REVIEW_FIELD), Some(&FieldValue::Checkbox(false)));
        assert_eq!(saved.records[1].annotations.get(NEEDS_REVIEW_FIELD), Some(&FieldValue::Checkbox(true)));
    }

    #[tokio::test]
    async fn partial_fetch_is_saved_and_flagged() {
        let store = Arc::new(MemoryStore::new());
        store.push_page(Ok(page(&["r1"], Some("c1"), true)));
        store.push_page(Err(LeadSyncError::Transient("HTTP 500".into())));
        store.push_page(Err(LeadSyncError::Transient("HTTP 500".into())));
        let snapshots = Arc::new(MemorySnapshots::default());

        let report = refresh(store, snapshots.clone()).run().await.unwrap();

        assert!(report.partial);
        assert_eq!(report.failed_pages, 1);
        assert_eq!(snapshots.snapshot.lock().unwrap().total_records, 1);
    }

    #[tokio::test]
    async fn partial_fetch_keeps_unreached_local_records() {
        let store = Arc::new(MemoryStore::new());
        store.push_page(Ok(page(&["r1"], Some("c1"), true)));
        store.push_page(Err(LeadSyncError::Transient("HTTP 500".into())));
        store.push_page(Err(LeadSyncError::Transient("HTTP 500".into())));

        let snapshots = Arc::new(MemorySnapshots::default());
        *snapshots.snapshot.lock().unwrap() = RecordSnapshot::from_records(vec![
            SnapshotRecord { record: RemoteRecord::new("r1"), annotations: Fields::new() },
            SnapshotRecord {
                record: RemoteRecord::new("r2"),
                annotations: Fields::new().with("draft_reply", "Thanks, we will call you"),
            },
        ]);

        let report = refresh(store, snapshots.clone()).run().await.unwrap();

        assert!(report.partial);
        assert_eq!(report.carried, 1);
        let saved = snapshots.snapshot.lock().unwrap().clone();
        let ids: Vec<_> = saved.records.iter().map(|r| r.record.id.as_str()).collect();
        assert_eq!(ids, ["r1", "r2"]);
        assert_eq!(saved.total_records, 2);
        let draft = saved.records[1].annotations.get("draft_reply").and_then(|v| v.as_str());
        assert_eq!(draft, Some("Thanks, we will call you"));
    }
}
