//! Configuration structures
//!
//! Every section carries serde defaults so a config file only needs the
//! credentials and table identifiers. Loading and environment overrides
//! live in the infra crate.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::errors::{LeadSyncError, Result};

/// Converts a seconds value from config into a `Duration`, treating
/// negative or non-finite values as zero.
pub fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub remote: RemoteConfig,
    pub timeouts: TimeoutConfig,
    pub retry: RetryProfilesConfig,
    pub pagination: PaginationConfig,
    pub token: TokenConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("remote.app_key", &self.remote.app_key),
            ("remote.app_secret", &self.remote.app_secret),
            ("remote.base_id", &self.remote.base_id),
            ("remote.sheet_name", &self.remote.sheet_name),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(LeadSyncError::Config(format!("{name} must be set")));
            }
        }
        if self.sync.cooldown_min_secs > self.sync.cooldown_max_secs {
            return Err(LeadSyncError::Config(format!(
                "sync.cooldown_min_secs ({}) exceeds sync.cooldown_max_secs ({})",
                self.sync.cooldown_min_secs, self.sync.cooldown_max_secs
            )));
        }
        if self.sync.max_field_length == 0 {
            return Err(LeadSyncError::Config("sync.max_field_length must be positive".into()));
        }
        if self.pagination.max_page_attempts == 0 {
            return Err(LeadSyncError::Config("pagination.max_page_attempts must be at least 1".into()));
        }
        for (name, profile) in
            [("default", &self.retry.default), ("token", &self.retry.token), ("record_operation", &self.retry.record_operation)]
        {
            if profile.backoff_factor < 1.0 || profile.max_backoff_secs < profile.initial_backoff_secs {
                return Err(LeadSyncError::Config(format!("retry.{name} has an invalid backoff range")));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub app_key: String,
    pub app_secret: String,
    pub operator_id: String,
    pub base_id: String,
    pub sheet_name: String,
    pub auth_header: String,
    pub token_url: String,
    /// Placeholders: `{table_id}`, `{operator_id}`.
    pub views_url: String,
    /// Placeholders: `{table_id}`, `{sheet_id}`, `{operator_id}`.
    pub records_url: String,
    /// Placeholders: `{table_id}`, `{sheet_id}`, `{record_id}`, `{operator_id}`.
    pub record_url: String,
    pub page_size: u32,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            app_key: String::new(),
            app_secret: String::new(),
            operator_id: String::new(),
            base_id: String::new(),
            sheet_name: String::new(),
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            token_url: "https://api.dingtalk.com/v1.0/oauth2/accessToken".to_string(),
            views_url: "https://api.dingtalk.com/v1.0/notable/bases/{table_id}/sheets?operatorId={operator_id}"
                .to_string(),
            records_url:
                "https://api.dingtalk.com/v1.0/notable/bases/{table_id}/sheets/{sheet_id}/records?operatorId={operator_id}"
                    .to_string(),
            record_url: "https://api.dingtalk.com/v1.0/notable/bases/{table_id}/sheets/{sheet_id}/records/{record_id}?operatorId={operator_id}"
                .to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Operation classes with their own timeout ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Token,
    GetViews,
    GetRecords,
    CheckRecord,
    UpdateRecord,
    Default,
}

impl OperationClass {
    pub const ALL: [Self; 6] =
        [Self::Token, Self::GetViews, Self::GetRecords, Self::CheckRecord, Self::UpdateRecord, Self::Default];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::GetViews => "get_views",
            Self::GetRecords => "get_records",
            Self::CheckRecord => "check_record",
            Self::UpdateRecord => "update_record",
            Self::Default => "default",
        }
    }

    /// Message attached to timeouts of this class.
    pub fn timeout_message(self) -> &'static str {
        match self {
            Self::Token => "access token request timed out; check network connectivity",
            Self::GetViews => "listing table views timed out; check network connectivity",
            Self::GetRecords => "listing records timed out; the table may be large or the network slow",
            Self::CheckRecord => "record existence check timed out; check network connectivity",
            Self::UpdateRecord => "record write timed out; the payload may be large or the network slow",
            Self::Default => "request timed out; check network connectivity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub default_secs: f64,
    pub token_secs: f64,
    pub check_record_secs: f64,
    pub get_views_secs: f64,
    pub get_records_secs: f64,
    pub update_record_secs: f64,
    pub connect_secs: f64,
    /// Grow timeouts after timeouts and shrink them after successes.
    pub auto_adjust: bool,
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            default_secs: 15.0,
            token_secs: 20.0,
            check_record_secs: 12.0,
            get_views_secs: 15.0,
            get_records_secs: 15.0,
            update_record_secs: 40.0,
            connect_secs: 10.0,
            auto_adjust: false,
            min_secs: 5.0,
            max_secs: 120.0,
        }
    }
}

impl TimeoutConfig {
    pub fn for_operation(&self, class: OperationClass) -> Duration {
        secs(match class {
            OperationClass::Token => self.token_secs,
            OperationClass::GetViews => self.get_views_secs,
            OperationClass::GetRecords => self.get_records_secs,
            OperationClass::CheckRecord => self.check_record_secs,
            OperationClass::UpdateRecord => self.update_record_secs,
            OperationClass::Default => self.default_secs,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryProfileConfig {
    pub max_retries: u32,
    pub initial_backoff_secs: f64,
    pub max_backoff_secs: f64,
    pub backoff_factor: f64,
}

impl RetryProfileConfig {
    pub const fn new(max_retries: u32, initial_backoff_secs: f64, max_backoff_secs: f64, backoff_factor: f64) -> Self {
        Self { max_retries, initial_backoff_secs, max_backoff_secs, backoff_factor }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryProfilesConfig {
    pub default: RetryProfileConfig,
    pub token: RetryProfileConfig,
    pub record_operation: RetryProfileConfig,
}

impl Default for RetryProfilesConfig {
    fn default() -> Self {
        Self {
            default: RetryProfileConfig::new(3, 1.0, 30.0, 2.0),
            token: RetryProfileConfig::new(3, 2.0, 20.0, 2.0),
            record_operation: RetryProfileConfig::new(4, 2.0, 40.0, 2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Attempts per page, including the first.
    pub max_page_attempts: u32,
    /// Courtesy delay between successful pages.
    pub page_delay_secs: f64,
    /// One unit of the escalating page backoff schedule.
    pub page_backoff_unit_secs: f64,
    pub max_page_backoff_secs: f64,
    /// Call-level retries for each list request.
    pub list_max_retries: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            max_page_attempts: MAX_PAGE_ATTEMPTS,
            page_delay_secs: PAGE_DELAY_SECS as f64,
            page_backoff_unit_secs: 1.0,
            max_page_backoff_secs: MAX_PAGE_BACKOFF_SECS as f64,
            list_max_retries: LIST_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub refresh_buffer_secs: u64,
    pub retry_delay_secs: f64,
    /// Best-effort copy of the current token, for debugging.
    pub cache_path: Option<PathBuf>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            refresh_buffer_secs: TOKEN_REFRESH_BUFFER_SECS,
            retry_delay_secs: TOKEN_RETRY_DELAY_SECS as f64,
            cache_path: None,
        }
    }
}

/// Target column names for joined leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub lead_id: String,
    pub customer: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub postcode: String,
    pub message: String,
    pub message_date: String,
    pub read_status: String,
    pub source_link: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            lead_id: "Lead ID".into(),
            customer: "Customer".into(),
            email: "Email".into(),
            phone: "Phone".into(),
            country: "Country".into(),
            postcode: "Postcode".into(),
            message: "Message".into(),
            message_date: "Message Date".into(),
            read_status: "Read Status".into(),
            source_link: "Source Link".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Directory holding the index and detail files of pending leads.
    pub source_dir: PathBuf,
    /// Directory for ledgers, snapshots and the sheet definition cache.
    pub ledger_dir: PathBuf,
    /// Root of timestamped crawler output folders, when intake is wanted.
    pub crawler_output_dir: Option<PathBuf>,
    pub cooldown_min_secs: f64,
    pub cooldown_max_secs: f64,
    pub max_field_length: usize,
    /// Pull remote records into the local snapshot after pushing leads.
    pub refresh_snapshot: bool,
    pub field_names: FieldNames,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("sales_leads"),
            ledger_dir: PathBuf::from("notable"),
            crawler_output_dir: None,
            cooldown_min_secs: COOLDOWN_MIN_SECS as f64,
            cooldown_max_secs: COOLDOWN_MAX_SECS as f64,
            max_field_length: MAX_FIELD_LENGTH,
            refresh_snapshot: false,
            field_names: FieldNames::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
    /// Daily-rolling log files are written here when set.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into(), json: false, directory: None }
    }
}
