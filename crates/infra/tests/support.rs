#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use leadsync_domain::config::{
    AppConfig, PaginationConfig, RetryProfileConfig, RetryProfilesConfig, TimeoutConfig, TokenConfig,
};
use leadsync_domain::constants::DEFINITION_FILE;
use leadsync_domain::TableRef;
use leadsync_infra::notable::{retry_policy, NotableClient, NotableSession, RecordRetries, SheetResolver, TokenManager};
use leadsync_infra::ResilientHttpClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const BASE_ID: &str = "base1";
pub const SHEET_NAME: &str = "Leads";
pub const SHEET_ID: &str = "sheet-1";
pub const TOKEN: &str = "tok-1";

pub fn records_path() -> String {
    format!("/v1.0/notable/bases/{BASE_ID}/sheets/{SHEET_ID}/records")
}

pub fn record_path(record_id: &str) -> String {
    format!("{}/{record_id}", records_path())
}

/// Configuration pointing every endpoint at `server`, with millisecond
/// timings and all local files under `root`.
pub fn test_config(server: &MockServer, root: &Path) -> AppConfig {
    let uri = server.uri();
    let mut config = AppConfig::default();

    config.remote.app_key = "key".into();
    config.remote.app_secret = "secret".into();
    config.remote.operator_id = "op-1".into();
    config.remote.base_id = BASE_ID.into();
    config.remote.sheet_name = SHEET_NAME.into();
    config.remote.token_url = format!("{uri}/v1.0/oauth2/accessToken");
    config.remote.views_url = format!("{uri}/v1.0/notable/bases/{{table_id}}/sheets?operatorId={{operator_id}}");
    config.remote.records_url =
        format!("{uri}/v1.0/notable/bases/{{table_id}}/sheets/{{sheet_id}}/records?operatorId={{operator_id}}");
    config.remote.record_url = format!(
        "{uri}/v1.0/notable/bases/{{table_id}}/sheets/{{sheet_id}}/records/{{record_id}}?operatorId={{operator_id}}"
    );
    config.remote.page_size = 2;

    config.timeouts = TimeoutConfig {
        default_secs: 2.0,
        token_secs: 2.0,
        check_record_secs: 2.0,
        get_views_secs: 2.0,
        get_records_secs: 2.0,
        update_record_secs: 2.0,
        connect_secs: 1.0,
        auto_adjust: false,
        min_secs: 0.5,
        max_secs: 5.0,
    };
    let fast = RetryProfileConfig::new(2, 0.005, 0.02, 2.0);
    config.retry = RetryProfilesConfig { default: fast.clone(), token: fast.clone(), record_operation: fast };
    config.pagination = PaginationConfig {
        max_page_attempts: 3,
        page_delay_secs: 0.0,
        page_backoff_unit_secs: 0.005,
        max_page_backoff_secs: 0.02,
        list_max_retries: 1,
    };
    config.token = TokenConfig { refresh_buffer_secs: 300, retry_delay_secs: 0.005, cache_path: None };

    config.sync.source_dir = root.join("leads");
    config.sync.ledger_dir = root.join("ledger");
    config.sync.cooldown_min_secs = 0.0;
    config.sync.cooldown_max_secs = 0.0;
    config
}

pub fn table(config: &AppConfig) -> TableRef {
    TableRef::new(&config.remote.base_id, &config.remote.sheet_name)
}

/// Remote client wired the way the binary wires it.
pub fn notable_client(config: &AppConfig) -> NotableClient {
    let http = ResilientHttpClient::builder()
        .timeouts(config.timeouts.clone())
        .no_proxy()
        .build()
        .expect("http client builds");
    let tokens = Arc::new(TokenManager::new(http.clone(), &config.remote, &config.token, &config.retry.token));
    let session = NotableSession::new(http, tokens, &config.remote);

    let sheets = Arc::new(SheetResolver::new(
        session.clone(),
        config.remote.views_url.clone(),
        config.sync.ledger_dir.join(DEFINITION_FILE),
        retry_policy(&config.retry.default),
    ));
    let record = retry_policy(&config.retry.record_operation);
    let retries = RecordRetries { list: record.clone(), probe: record.clone(), write: record };
    NotableClient::new(session, sheets, &config.remote, retries)
}

pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1.0/oauth2/accessToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accessToken": TOKEN, "expireIn": 7200})))
        .mount(server)
        .await;
}

pub async fn mount_views(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v1.0/notable/bases/{BASE_ID}/sheets")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"value": [{"id": "sheet-0", "name": "Archive"}, {"id": SHEET_ID, "name": SHEET_NAME}]})),
        )
        .mount(server)
        .await;
}

pub fn record(id: &str, lead_id: &str) -> Value {
    json!({"id": id, "fields": {"Lead ID": lead_id}, "lastModifiedTime": 1_700_000_000_000_i64})
}

/// Writes an index export listing `post_ids` into `dir`.
pub fn write_index(dir: &Path, name: &str, post_ids: &[&str]) {
    std::fs::create_dir_all(dir).expect("source dir");
    let rows: Vec<Value> = post_ids
        .iter()
        .map(|id| {
            json!({
                "View": {"href": format!("https://site.test/wp-admin/admin.php?page=e-form-submissions&post={id}")},
                "Read/Unread": "Unread",
                "Submitted On": "Contact page",
            })
        })
        .collect();
    std::fs::write(dir.join(format!("Elementor_DB_{name}.json")), serde_json::to_vec(&rows).expect("rows"))
        .expect("index written");
}

/// Writes the detail file for one lead into `dir`.
pub fn write_detail(dir: &Path, post_id: &str, first_name: &str, email: &str) {
    std::fs::create_dir_all(dir).expect("source dir");
    let detail = json!({
        "form_submission": {
            "First Name": first_name,
            "Last Name": "Tester",
            "Email Address": email,
            "WhatsApp/Phone NO.": "+1 555 0100",
            "Country": "NL",
            "Postcode": "1011",
            "Message": format!("Hello from {first_name}"),
            "Date of Submission": "2026-05-01 10:00",
        },
        "extra_information": {
            "Submitted On": {"links": [{"href": "https://site.test/contact"}]}
        }
    });
    std::fs::write(dir.join(format!("submission_{post_id}.json")), serde_json::to_vec_pretty(&detail).expect("detail"))
        .expect("detail written");
}

pub fn read_json(path: &Path) -> Value {
    let bytes = std::fs::read(path).unwrap_or_else(|err| panic!("{} unreadable: {err}", path.display()));
    serde_json::from_slice(&bytes).expect("valid json")
}

pub async fn requests_to(server: &MockServer, verb: &str, target: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.method.as_str() == verb && request.url.path() == target)
        .collect()
}
