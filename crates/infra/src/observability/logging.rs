//! `tracing` subscriber installation
//!
//! Console output is human-readable or JSON. With a log directory set, a
//! second layer writes JSON lines into a daily-rolling file through a
//! non-blocking writer whose guard the caller keeps alive.

use leadsync_domain::config::LoggingConfig;
use leadsync_domain::{LeadSyncError, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "leadsync.log";

/// `RUST_LOG` wins over the configured level when set.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|err| LeadSyncError::Config(format!("invalid log level {:?}: {err}", config.level)))
}

/// Installs the global subscriber. Returns the file writer's guard when
/// file logging is enabled; dropping it flushes and stops the writer.
///
/// # Errors
/// Returns `LeadSyncError::Config` for an invalid filter, `Storage` when the
/// log directory cannot be created, and `Internal` if a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = build_filter(config)?;

    let console = if config.json {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(false).boxed()
    };

    let (file, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| LeadSyncError::Storage(format!("{}: {err}", dir.display())))?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer).boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init()
        .map_err(|err| LeadSyncError::Internal(format!("logging already initialized: {err}")))?;

    Ok(guard)
}
