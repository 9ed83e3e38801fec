//! Authenticated access shared by the table adapters

use std::sync::Arc;

use leadsync_domain::config::RemoteConfig;
use leadsync_domain::{LeadSyncError, Result};
use serde_json::Value;
use tracing::warn;
use url::Url;

use super::auth::AccessTokenProvider;
use crate::http::{HttpRequest, ResilientHttpClient};

/// HTTP client plus credentials and URL templates for one remote base.
#[derive(Clone)]
pub struct NotableSession {
    http: ResilientHttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    auth_header: String,
    operator_id: String,
}

impl NotableSession {
    pub fn new(http: ResilientHttpClient, auth: Arc<dyn AccessTokenProvider>, remote: &RemoteConfig) -> Self {
        Self { http, auth, auth_header: remote.auth_header.clone(), operator_id: remote.operator_id.clone() }
    }

    /// Fills `{name}` placeholders in `template`; `{operator_id}` is always
    /// available.
    pub fn url(&self, template: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut filled = template.replace("{operator_id}", &self.operator_id);
        for (name, value) in params {
            filled = filled.replace(&format!("{{{name}}}"), value);
        }
        if filled.contains('{') {
            return Err(LeadSyncError::Config(format!("URL template has unfilled placeholders: {template}")));
        }
        Url::parse(&filled).map_err(|err| LeadSyncError::Config(format!("invalid URL template {template}: {err}")))
    }

    /// Sends `request` with the access token attached. When the data call
    /// answers 401 the token is dropped and the request sent once more with
    /// a fresh one. A failed token acquisition is returned as is.
    pub async fn call(&self, request: HttpRequest) -> Result<Value> {
        let token = self.auth.access_token().await?;
        match self.send(&request, token).await {
            Err(LeadSyncError::Http { status: 401, message }) => {
                warn!(error = %message, "access token rejected; refreshing");
                self.auth.invalidate().await;
                let token = self.auth.access_token().await?;
                self.send(&request, token).await
            }
            other => other,
        }
    }

    async fn send(&self, request: &HttpRequest, token: String) -> Result<Value> {
        let request = request.clone().header(&self.auth_header, token);
        self.http.call(&request).await
    }
}
