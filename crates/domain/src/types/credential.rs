//! Bearer credential issued by the token endpoint

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived bearer token with its absolute expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub bearer_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(bearer_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self { bearer_token: bearer_token.into(), expires_at }
    }

    /// Builds a credential from the `expireIn` seconds reported by the
    /// token endpoint. `None` when the expiry is not a representable time.
    pub fn from_ttl(bearer_token: impl Into<String>, ttl_secs: i64, now: DateTime<Utc>) -> Option<Self> {
        let ttl = TimeDelta::try_seconds(ttl_secs.max(0))?;
        let expires_at = now.checked_add_signed(ttl)?;
        Some(Self::new(bearer_token, expires_at))
    }

    /// True once `now` has entered the refresh window before expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>, buffer: Duration) -> bool {
        let buffer = TimeDelta::from_std(buffer).unwrap_or(TimeDelta::MAX);
        self.expires_at.checked_sub_signed(buffer).map_or(true, |window_start| now >= window_start)
    }

    pub fn expires_at_epoch(&self) -> i64 {
        self.expires_at.timestamp()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("bearer_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
