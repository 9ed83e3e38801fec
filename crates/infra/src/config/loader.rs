//! Configuration loader
//!
//! Reads an [`AppConfig`] from a TOML or JSON file and layers environment
//! overrides on top.
//!
//! ## Environment Variables
//! - `LEADSYNC_APP_KEY`: application key for the token endpoint
//! - `LEADSYNC_APP_SECRET`: application secret for the token endpoint
//! - `LEADSYNC_OPERATOR_ID`: operator (union) id sent with table calls
//! - `LEADSYNC_BASE_ID`: id of the remote table base
//! - `LEADSYNC_LOG_LEVEL`: default log filter
//!
//! ## File Locations
//! Without an explicit path the loader probes `leadsync.toml` and
//! `leadsync.json` in the working directory, then next to the executable.

use std::path::{Path, PathBuf};

use leadsync_domain::{AppConfig, LeadSyncError, Result};

const CONFIG_FILE_NAMES: [&str; 2] = ["leadsync.toml", "leadsync.json"];

/// Load, override from the environment, and validate.
///
/// With `path == None` and no file found by [`probe_config_paths`], starts
/// from defaults, so a config made only of environment variables is valid.
///
/// # Errors
/// Returns `LeadSyncError::Config` if the file cannot be read or parsed, or
/// if the merged configuration fails validation.
pub fn load(path: Option<&Path>) -> Result<AppConfig> {
    let mut config = match path.map(Path::to_path_buf).or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::info!("No config file found; using defaults and environment");
            AppConfig::default()
        }
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `LeadSyncError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(LeadSyncError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| LeadSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> Result<AppConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents).map_err(|e| LeadSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => {
            serde_json::from_str(contents).map_err(|e| LeadSyncError::Config(format!("Invalid JSON format: {e}")))
        }
        _ => Err(LeadSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Applies `LEADSYNC_*` overrides read through `lookup`. Empty values are
/// ignored.
pub fn apply_env_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    let targets: [(&str, &mut String); 5] = [
        ("LEADSYNC_APP_KEY", &mut config.remote.app_key),
        ("LEADSYNC_APP_SECRET", &mut config.remote.app_secret),
        ("LEADSYNC_OPERATOR_ID", &mut config.remote.operator_id),
        ("LEADSYNC_BASE_ID", &mut config.remote.base_id),
        ("LEADSYNC_LOG_LEVEL", &mut config.logging.level),
    ];
    for (key, target) in targets {
        if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
            tracing::debug!(key, "Configuration overridden from environment");
            *target = value;
        }
    }
}

/// Probe for configuration files
///
/// Searches the current working directory, then the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}
