//! Application constants
//!
//! Centralized location for domain-level defaults shared by the config
//! structs and the services that consume them.

// Credential lifecycle
pub const TOKEN_REFRESH_BUFFER_SECS: u64 = 300;
pub const TOKEN_RETRY_DELAY_SECS: u64 = 2;
pub const DEFAULT_AUTH_HEADER: &str = "x-acs-dingtalk-access-token";

// Payload shaping
pub const MAX_FIELD_LENGTH: usize = 9500;
pub const TEXT_TRUNCATION_MARKER: &str = "...(truncated)";
pub const MARKDOWN_TRUNCATION_MARKER: &str =
    "\n\n...(content truncated: exceeds the field length limit)";

// Pagination
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_ATTEMPTS: u32 = 5;
pub const PAGE_DELAY_SECS: u64 = 30;
pub const MAX_PAGE_BACKOFF_SECS: u64 = 180;
pub const LIST_MAX_RETRIES: u32 = 5;

// Orchestrator cooldown between records
pub const COOLDOWN_MIN_SECS: u64 = 10;
pub const COOLDOWN_MAX_SECS: u64 = 15;

// Local files
pub const SYNC_LEDGER_FILE: &str = "sync_ledger.json";
pub const FAILED_RECORDS_FILE: &str = "failed_records.json";
pub const DEFINITION_FILE: &str = "notable_definition.json";
pub const SOURCE_INDEX_PREFIX: &str = "Elementor_DB_";
pub const DETAIL_FILE_PREFIX: &str = "submission_";

// Annotation fields owned by local post-processing
pub const NEEDS_REVIEW_FIELD: &str = "needs_review";
pub const REPLY_UPLOADED_FIELD: &str = "reply_uploaded";
