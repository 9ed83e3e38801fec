//! One end-to-end pass: intake, snapshot refresh, sync

use leadsync_core::SnapshotReport;
use leadsync_domain::{LeadSyncError, Result, SyncReport};
use leadsync_infra::storage::IntakeReport;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::context::AppContext;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub intake: Option<IntakeReport>,
    pub snapshot: Option<SnapshotReport>,
    pub sync: SyncReport,
}

/// Runs every enabled stage in order. Intake and snapshot failures are
/// logged and the sync still runs on whatever is already on disk; an
/// authentication failure in the snapshot stage ends the run.
pub async fn run(ctx: &AppContext, cancel: &CancellationToken) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    if let Some(intake) = ctx.intake() {
        match intake.collect().await {
            Ok(report) => {
                info!(copied = report.copied, "crawler output collected");
                summary.intake = Some(report);
            }
            Err(err) => warn!(error = %err, "crawler intake failed; syncing existing source files"),
        }
    }

    if ctx.config.sync.refresh_snapshot && !cancel.is_cancelled() {
        match ctx.snapshot_refresh().run().await {
            Ok(report) => {
                if report.partial {
                    warn!(failed_pages = report.failed_pages, "snapshot refreshed from a partial fetch");
                }
                summary.snapshot = Some(report);
            }
            Err(err @ LeadSyncError::Auth(_)) => return Err(err),
            Err(err) => warn!(error = %err, "snapshot refresh failed"),
        }
    }

    summary.sync = ctx.orchestrator()?.run_once(cancel).await?;
    Ok(summary)
}
