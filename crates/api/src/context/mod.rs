//! Application context - dependency injection container

use std::sync::Arc;

use leadsync_common::Throttle;
use leadsync_core::sync::{FetchOptions, FieldGuard};
use leadsync_core::{
    IdempotentUpserter, PaginatedFetcher, RecordReconciler, RecordStore, SnapshotRefresh, SyncOrchestrator,
};
use leadsync_domain::config::{secs, AppConfig, RetryProfileConfig};
use leadsync_domain::constants::DEFINITION_FILE;
use leadsync_domain::{Result, TableRef};
use leadsync_infra::notable::{retry_policy, RecordRetries};
use leadsync_infra::{
    CrawlerIntake, FileLeadSource, JsonLedgerRepository, JsonSnapshotRepository, NotableClient, NotableSession,
    ResilientHttpClient, SheetResolver, TokenManager,
};

/// Existence probes run before every update, so they give up sooner than
/// writes do.
const PROBE_MAX_RETRIES: u32 = 2;

/// Everything one sync run needs, built once from the configuration.
pub struct AppContext {
    pub config: AppConfig,
    pub table: TableRef,
    store: Arc<dyn RecordStore>,
}

impl AppContext {
    pub fn new(config: AppConfig) -> Result<Self> {
        let http = ResilientHttpClient::builder().timeouts(config.timeouts.clone()).build()?;
        let tokens = Arc::new(TokenManager::new(http.clone(), &config.remote, &config.token, &config.retry.token));
        let session = NotableSession::new(http, tokens, &config.remote);

        let sheets = Arc::new(SheetResolver::new(
            session.clone(),
            config.remote.views_url.clone(),
            config.sync.ledger_dir.join(DEFINITION_FILE),
            retry_policy(&config.retry.default),
        ));
        let store = NotableClient::new(session, sheets, &config.remote, record_retries(&config));

        tracing::info!(
            base_id = %config.remote.base_id,
            sheet = %config.remote.sheet_name,
            source_dir = %config.sync.source_dir.display(),
            "application context ready"
        );
        let table = TableRef::new(config.remote.base_id.as_str(), config.remote.sheet_name.as_str());
        Ok(Self { config, table, store: Arc::new(store) })
    }

    /// Copies the newest crawler output into the source directory, when a
    /// crawler output directory is configured.
    pub fn intake(&self) -> Option<CrawlerIntake> {
        let root = self.config.sync.crawler_output_dir.as_ref()?;
        Some(CrawlerIntake::new(root, &self.config.sync.source_dir))
    }

    pub fn fetcher(&self) -> PaginatedFetcher {
        PaginatedFetcher::new(self.store.clone(), self.table.clone())
            .with_options(FetchOptions::from_config(&self.config.pagination))
    }

    pub fn snapshot_refresh(&self) -> SnapshotRefresh {
        let snapshots = Arc::new(JsonSnapshotRepository::new(&self.config.sync.ledger_dir));
        SnapshotRefresh::new(self.fetcher(), RecordReconciler::default(), snapshots)
    }

    pub fn orchestrator(&self) -> Result<SyncOrchestrator> {
        let sync = &self.config.sync;
        let source = FileLeadSource::new(&sync.source_dir, sync.field_names.clone())?;
        let ledger = JsonLedgerRepository::new(&sync.ledger_dir);
        let upserter =
            IdempotentUpserter::new(self.store.clone()).with_field_guard(FieldGuard::new(sync.max_field_length));
        let cooldown = Throttle::new(secs(sync.cooldown_min_secs), secs(sync.cooldown_max_secs));

        Ok(SyncOrchestrator::new(self.table.clone(), Arc::new(source), Arc::new(ledger), upserter)
            .with_cooldown(cooldown))
    }
}

/// Listing, probing and writing share the record profile; listing takes its
/// retry count from the pagination settings.
fn record_retries(config: &AppConfig) -> RecordRetries {
    let profile = &config.retry.record_operation;
    let with_retries = |max_retries: u32| RetryProfileConfig { max_retries, ..profile.clone() };

    RecordRetries {
        list: retry_policy(&with_retries(config.pagination.list_max_retries)),
        probe: retry_policy(&with_retries(profile.max_retries.min(PROBE_MAX_RETRIES))),
        write: retry_policy(profile),
    }
}
