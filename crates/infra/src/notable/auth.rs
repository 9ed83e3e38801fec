//! Access-token lifecycle for the remote table API
//!
//! [`TokenManager`] caches one bearer credential and refreshes it once it
//! enters the refresh window before expiry. Refreshes are serialized so
//! concurrent callers share a single in-flight token request.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use leadsync_common::{millis, RetryPolicy};
use leadsync_domain::config::{secs, OperationClass, RemoteConfig, RetryProfileConfig, TokenConfig};
use leadsync_domain::{Credential, LeadSyncError, Result};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::http::{HttpRequest, ResilientHttpClient};

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// A bearer token valid for at least the refresh buffer.
    async fn access_token(&self) -> Result<String>;

    /// Forget the cached token after the remote side rejected it.
    async fn invalidate(&self);
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "accessToken")]
    access_token: Option<String>,
    #[serde(rename = "expireIn")]
    expire_in: Option<i64>,
}

pub struct TokenManager {
    http: ResilientHttpClient,
    token_url: String,
    app_key: String,
    app_secret: String,
    retry: RetryPolicy,
    refresh_buffer: Duration,
    retry_delay: Duration,
    cache_path: Option<PathBuf>,
    credential: RwLock<Option<Credential>>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(
        http: ResilientHttpClient,
        remote: &RemoteConfig,
        token: &TokenConfig,
        retry: &RetryProfileConfig,
    ) -> Self {
        Self {
            http,
            token_url: remote.token_url.clone(),
            app_key: remote.app_key.clone(),
            app_secret: remote.app_secret.clone(),
            retry: retry_policy(retry),
            refresh_buffer: Duration::from_secs(token.refresh_buffer_secs),
            retry_delay: secs(token.retry_delay_secs),
            cache_path: token.cache_path.clone(),
            credential: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the cached credential unless it is inside the refresh window
    /// or `force_refresh` is set, in which case a new one is requested.
    pub async fn get_token(&self, force_refresh: bool) -> Result<Credential> {
        let seen = self.credential.read().await.clone();
        if !force_refresh {
            if let Some(credential) = seen.as_ref().filter(|c| self.is_fresh(c)) {
                debug!("using cached access token");
                return Ok(credential.clone());
            }
        }

        let _refresh = self.refresh_lock.lock().await;

        // Another caller may have refreshed while this one waited.
        if let Some(current) = self.credential.read().await.as_ref() {
            let replaced = seen.as_ref().map_or(true, |s| s.bearer_token != current.bearer_token);
            if self.is_fresh(current) && (!force_refresh || replaced) {
                return Ok(current.clone());
            }
        }

        let credential = self.request_token().await?;
        *self.credential.write().await = Some(credential.clone());
        info!(expires_at = %credential.expires_at, "access token refreshed");
        self.persist(&credential).await;
        Ok(credential)
    }

    /// Like [`get_token`](Self::get_token), but a failed refresh is retried
    /// once with a forced refresh after a short delay. A second failure is
    /// reported as [`LeadSyncError::Auth`].
    pub async fn ensure_token(&self) -> Result<Credential> {
        match self.get_token(false).await {
            Ok(credential) => Ok(credential),
            Err(first) => {
                warn!(error = %first, delay_ms = millis(self.retry_delay), "token refresh failed; retrying");
                tokio::time::sleep(self.retry_delay).await;
                self.get_token(true).await.map_err(|err| match err {
                    LeadSyncError::Auth(message) => LeadSyncError::Auth(message),
                    other => LeadSyncError::Auth(format!("access token unavailable: {other}")),
                })
            }
        }
    }

    fn is_fresh(&self, credential: &Credential) -> bool {
        !credential.needs_refresh(Utc::now(), self.refresh_buffer)
    }

    async fn request_token(&self) -> Result<Credential> {
        if self.app_key.is_empty() || self.app_secret.is_empty() {
            return Err(LeadSyncError::Config("app_key and app_secret are required to request a token".into()));
        }

        let request = HttpRequest::post(&self.token_url, OperationClass::Token)
            .json(json!({ "appKey": self.app_key, "appSecret": self.app_secret }))
            .retry(self.retry.clone());
        let value = self.http.call(&request).await?;

        let response: TokenResponse = serde_json::from_value(value)
            .map_err(|err| LeadSyncError::Auth(format!("unexpected token response: {err}")))?;
        match (response.access_token, response.expire_in) {
            (Some(token), Some(ttl)) if !token.is_empty() => Credential::from_ttl(token, ttl, Utc::now())
                .ok_or_else(|| LeadSyncError::Auth(format!("token response has an invalid expireIn: {ttl}"))),
            _ => Err(LeadSyncError::Auth("token response lacks accessToken or expireIn".into())),
        }
    }

    /// Writes the token into the cache file, keeping any other keys in it.
    /// Failures are logged and otherwise ignored.
    async fn persist(&self, credential: &Credential) {
        let Some(path) = &self.cache_path else {
            return;
        };

        let mut document = match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice::<Map<String, Value>>(&bytes).unwrap_or_default(),
            Err(_) => Map::new(),
        };
        document.insert("access_token".into(), Value::String(credential.bearer_token.clone()));
        document.insert("access_token_expires".into(), Value::from(credential.expires_at_epoch()));

        let result = match serde_json::to_vec_pretty(&document) {
            Ok(bytes) => tokio::fs::write(path, bytes).await.map_err(|err| err.to_string()),
            Err(err) => Err(err.to_string()),
        };
        match result {
            Ok(()) => debug!(path = %path.display(), "access token persisted"),
            Err(error) => warn!(path = %path.display(), %error, "could not persist access token"),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for TokenManager {
    async fn access_token(&self) -> Result<String> {
        self.ensure_token().await.map(|credential| credential.bearer_token)
    }

    async fn invalidate(&self) {
        *self.credential.write().await = None;
    }
}

/// Builds the call-level policy for a configured retry profile.
pub fn retry_policy(profile: &RetryProfileConfig) -> RetryPolicy {
    RetryPolicy::new(
        profile.max_retries,
        secs(profile.initial_backoff_secs),
        secs(profile.max_backoff_secs),
        profile.backoff_factor,
    )
}
