//! LeadSync - pushes crawled form leads into a remote table
//!
//! Main entry point for the command-line application.

use anyhow::Context;
use leadsync_infra::config;
use leadsync_infra::observability::init_logging;
use leadsync_lib::{cli, run, AppContext, CliArgs};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse(std::env::args())?;
    if args.help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    // Environment overrides may live in a .env file next to the binary
    let dotenv = dotenvy::dotenv();

    let mut config = config::load(args.config.as_deref()).context("failed to load configuration")?;
    if let Some(refresh) = args.refresh_snapshot {
        config.sync.refresh_snapshot = refresh;
    }

    let _log_guard = init_logging(&config.logging).context("failed to initialise logging")?;
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) => tracing::debug!(error = %err, "no .env loaded"),
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received; stopping after the current record");
            on_signal.cancel();
        }
    });

    let ctx = AppContext::new(config).context("failed to build application context")?;
    let summary = run(&ctx, &cancel).await.context("sync run failed")?;

    let report = summary.sync;
    tracing::info!(
        success = report.success_count,
        failure = report.failure_count,
        skipped = report.skipped_count,
        cancelled = report.cancelled,
        "sync finished"
    );
    println!(
        "synced {} record(s), {} failed, {} skipped{}",
        report.success_count,
        report.failure_count,
        report.skipped_count,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    Ok(())
}
