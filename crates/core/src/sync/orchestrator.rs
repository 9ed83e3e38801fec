//! One sequential sync run: load → upsert each → persist ledgers
//!
//! Records are processed one at a time with a cooldown after every remote
//! write. Per-record failures land in the failure ledger; only storage,
//! configuration and authentication problems end the run early.

use std::sync::Arc;

use chrono::Utc;
use leadsync_common::Throttle;
use leadsync_domain::{
    FailedRecord, LeadSyncError, LedgerDocument, LocalSourceRecord, RemoteRef, Result, SyncLedger, SyncReport,
    SyncedRecord, TableRef,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::ports::{LeadSource, LedgerRepository};
use super::upserter::IdempotentUpserter;

pub struct SyncOrchestrator {
    table: TableRef,
    source: Arc<dyn LeadSource>,
    ledger: Arc<dyn LedgerRepository>,
    upserter: IdempotentUpserter,
    cooldown: Throttle,
}

/// Accumulated state of a run in progress
struct RunState {
    ledger: SyncLedger,
    report: SyncReport,
    synced: Vec<SyncedRecord>,
    failed: Vec<FailedRecord>,
}

impl SyncOrchestrator {
    pub fn new(
        table: TableRef,
        source: Arc<dyn LeadSource>,
        ledger: Arc<dyn LedgerRepository>,
        upserter: IdempotentUpserter,
    ) -> Self {
        Self { table, source, ledger, upserter, cooldown: Throttle::none() }
    }

    /// Pause drawn after every record that reached the remote store.
    pub fn with_cooldown(mut self, cooldown: Throttle) -> Self {
        self.cooldown = cooldown;
        self
    }

    #[instrument(skip_all, fields(sheet = %self.table.sheet))]
    pub async fn run_once(&self, cancel: &CancellationToken) -> Result<SyncReport> {
        let batch = self.source.load().await?;
        let ledger = self.ledger.load_ledger().await?;

        for skipped in &batch.skipped {
            warn!(external_key = %skipped.external_key, reason = %skipped.reason, "lead skipped");
        }
        info!(records = batch.records.len(), skipped = batch.skipped.len(), "sync run started");

        let mut state = RunState {
            ledger,
            report: SyncReport { skipped_count: batch.skipped.len(), ..SyncReport::default() },
            synced: Vec::new(),
            failed: Vec::new(),
        };

        let total = batch.records.len();
        let mut fatal = None;
        for (index, record) in batch.records.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(processed = state.report.processed(), "cancellation requested; stopping");
                state.report.cancelled = true;
                break;
            }

            let reached_remote = match self.process(&mut state, record).await {
                Ok(reached_remote) => reached_remote,
                Err(err) => {
                    fatal = Some(err);
                    break;
                }
            };

            let is_last = index + 1 == total;
            if reached_remote && !is_last && !self.cooldown.wait_or_cancel(cancel).await {
                info!("cancellation requested during cooldown; stopping");
                state.report.cancelled = true;
                break;
            }
        }

        self.ledger
            .write_outcomes(
                &self.table,
                &LedgerDocument::from_records(state.synced),
                &LedgerDocument::from_records(state.failed),
            )
            .await?;

        if let Some(err) = fatal {
            error!(error = %err, "sync run aborted");
            return Err(err);
        }

        info!(
            success = state.report.success_count,
            failure = state.report.failure_count,
            skipped = state.report.skipped_count,
            cancelled = state.report.cancelled,
            "sync run finished"
        );
        Ok(state.report)
    }

    /// Handles one record. Returns whether the remote store was contacted;
    /// an `Err` aborts the run.
    async fn process(&self, state: &mut RunState, record: LocalSourceRecord) -> Result<bool> {
        let key = record.external_key.clone();

        if let Err(err) = record.validate() {
            warn!(external_key = %key, error = %err, "invalid lead");
            self.record_failure(state, &key, record, &err);
            self.ledger.save_ledger(&state.ledger).await?;
            return Ok(false);
        }

        let known_remote_id = state
            .ledger
            .known_remote_id(&key)
            .or_else(|| record.referenced_remote_id())
            .map(str::to_owned);
        debug!(external_key = %key, known_remote_id = ?known_remote_id, "upserting lead");

        state.ledger.mark_pending(&key, Utc::now());
        self.ledger.save_ledger(&state.ledger).await?;

        let outcome = self.upserter.upsert(&self.table, &key, &record.fields, known_remote_id.as_deref()).await;
        match outcome.result {
            Ok(success) => {
                state.ledger.record_success(&key, success.remote_id.clone(), Utc::now());
                state.report.success_count += 1;
                let reference = RemoteRef { id: success.remote_id.clone(), external_key: key.clone() };
                if let Err(err) = self.source.mark_synced(&reference).await {
                    warn!(external_key = %key, error = %err, "could not annotate detail file");
                }
                state.synced.push(SyncedRecord { id: success.remote_id, fields: outcome.fields });
                self.ledger.save_ledger(&state.ledger).await?;
                Ok(true)
            }
            Err(err) => {
                let abort = matches!(err, LeadSyncError::Auth(_));
                let failed = LocalSourceRecord { fields: outcome.fields, ..record };
                self.record_failure(state, &key, failed, &err);
                self.ledger.save_ledger(&state.ledger).await?;
                if abort {
                    return Err(err);
                }
                Ok(true)
            }
        }
    }

    fn record_failure(&self, state: &mut RunState, key: &str, record: LocalSourceRecord, err: &LeadSyncError) {
        let now = Utc::now();
        state.ledger.record_failure(key, err.to_string(), now);
        state.report.failure_count += 1;
        state.failed.push(FailedRecord {
            error: err.to_string(),
            fields: record.fields,
            external_key: key.to_string(),
            timestamp: now,
        });
    }
}
