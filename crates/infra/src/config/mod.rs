//! Configuration loading
//!
//! The configuration types live in `leadsync_domain::config`; this module
//! reads them from files and the environment.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
