use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use leadsync_common::{millis, redact_url, RetryDecision, RetryPolicy};
use leadsync_domain::config::{OperationClass, TimeoutConfig};
use leadsync_domain::{LeadSyncError, Result};
use reqwest::{Client as ReqwestClient, Method};
use serde_json::Value;
use tracing::{debug, warn};

use super::timeouts::TimeoutTable;
use crate::errors::conversions::status_error;
use crate::errors::InfraError;

/// Longest slice of an error body carried into the error message.
const ERROR_BODY_EXCERPT: usize = 300;

/// One logical call: where to send it, which timeout class it belongs to and
/// how often it may be repeated.
#[derive(Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
    pub operation: OperationClass,
    pub retry: RetryPolicy,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>, operation: OperationClass) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            operation,
            retry: RetryPolicy::default(),
        }
    }

    pub fn get(url: impl Into<String>, operation: OperationClass) -> Self {
        Self::new(Method::GET, url, operation)
    }

    pub fn post(url: impl Into<String>, operation: OperationClass) -> Self {
        Self::new(Method::POST, url, operation)
    }

    pub fn put(url: impl Into<String>, operation: OperationClass) -> Self {
        Self::new(Method::PUT, url, operation)
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

// Header values carry the access token.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &redact_url(&self.url))
            .field("headers", &self.headers.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>())
            .field("operation", &self.operation)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

struct AttemptFailure {
    error: LeadSyncError,
    timed_out: bool,
}

impl From<LeadSyncError> for AttemptFailure {
    fn from(error: LeadSyncError) -> Self {
        Self { error, timed_out: false }
    }
}

/// JSON-over-HTTP client with per-operation timeouts and classified retries.
///
/// Connection failures, timeouts and 5xx responses are retried according to
/// the request's [`RetryPolicy`]. Once the policy gives up, the last error is
/// surfaced as [`LeadSyncError::OperationFailed`] with the attempt count.
/// Every other status fails on the first attempt.
#[derive(Clone)]
pub struct ResilientHttpClient {
    client: ReqwestClient,
    timeouts: Arc<TimeoutTable>,
}

impl ResilientHttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> ResilientHttpClientBuilder {
        ResilientHttpClientBuilder::default()
    }

    pub fn timeouts(&self) -> &TimeoutTable {
        &self.timeouts
    }

    /// Executes `request`, retrying per its policy. An empty success body
    /// yields `Value::Null`.
    pub async fn call(&self, request: &HttpRequest) -> Result<Value> {
        let url = redact_url(&request.url);
        let method = &request.method;
        let operation = request.operation.as_str();
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            let timeout = self.timeouts.resolve(request.operation);
            let started = Instant::now();
            let result = self.send_once(request, timeout).await;
            let elapsed_ms = millis(started.elapsed());

            let failure = match result {
                Ok(value) => {
                    self.timeouts.record_outcome(request.operation, true);
                    debug!(attempt, %method, %url, operation, elapsed_ms, outcome = "ok", "HTTP call succeeded");
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if failure.timed_out {
                self.timeouts.record_outcome(request.operation, false);
            }
            let transient = matches!(failure.error, LeadSyncError::Transient(_));

            match request.retry.decide(attempt, transient) {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        attempt,
                        max_attempts = request.retry.max_attempts(),
                        %method,
                        %url,
                        operation,
                        elapsed_ms,
                        error = %failure.error,
                        delay_ms = millis(delay),
                        "HTTP call failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Stop if transient => {
                    warn!(attempt, %method, %url, operation, elapsed_ms, error = %failure.error, "HTTP retries exhausted");
                    return Err(LeadSyncError::OperationFailed {
                        attempts: attempt,
                        message: failure.error.to_string(),
                    });
                }
                RetryDecision::Stop => {
                    debug!(attempt, %method, %url, operation, elapsed_ms, error = %failure.error, "HTTP call failed");
                    return Err(failure.error);
                }
            }
        }
    }

    async fn send_once(&self, request: &HttpRequest, timeout: Duration) -> std::result::Result<Value, AttemptFailure> {
        let mut builder = self.client.request(request.method.clone(), &request.url).timeout(timeout);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| classify(err, request.operation, timeout))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|err| classify(err, request.operation, timeout))?;

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown status");
            let text = String::from_utf8_lossy(&bytes);
            let excerpt: String = text.trim().chars().take(ERROR_BODY_EXCERPT).collect();
            let message = if excerpt.is_empty() { reason.to_string() } else { format!("{reason}: {excerpt}") };
            return Err(status_error(status.as_u16(), &message).into());
        }

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|err| AttemptFailure::from(LeadSyncError::from(InfraError::from(err))))
    }
}

fn classify(err: reqwest::Error, operation: OperationClass, timeout: Duration) -> AttemptFailure {
    if err.is_timeout() {
        return AttemptFailure {
            error: LeadSyncError::Transient(format!(
                "{} (after {:.1}s)",
                operation.timeout_message(),
                timeout.as_secs_f64()
            )),
            timed_out: true,
        };
    }
    AttemptFailure::from(LeadSyncError::from(InfraError::from(err)))
}

/// Builder for [`ResilientHttpClient`].
#[derive(Debug)]
pub struct ResilientHttpClientBuilder {
    timeouts: TimeoutConfig,
    user_agent: Option<String>,
    no_proxy: bool,
}

impl Default for ResilientHttpClientBuilder {
    fn default() -> Self {
        Self {
            timeouts: TimeoutConfig::default(),
            user_agent: Some(concat!("leadsync/", env!("CARGO_PKG_VERSION")).to_string()),
            no_proxy: false,
        }
    }
}

impl ResilientHttpClientBuilder {
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Ignore proxy settings from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.no_proxy = true;
        self
    }

    pub fn build(self) -> Result<ResilientHttpClient> {
        let table = TimeoutTable::new(&self.timeouts);
        let mut builder = ReqwestClient::builder().connect_timeout(table.connect());

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        if self.no_proxy {
            builder = builder.no_proxy();
        }

        let client = builder.build().map_err(|err| LeadSyncError::from(InfraError::from(err)))?;
        Ok(ResilientHttpClient { client, timeouts: Arc::new(table) })
    }
}
