//! Redaction of secrets in values that end up in logs

use url::Url;

/// Query keys whose values are replaced before a URL is logged.
const SENSITIVE_KEY_FRAGMENTS: &[&str] =
    &["token", "secret", "key", "password", "signature", "operatorid", "unionid"];

/// Pagination cursors are opaque but not secret.
const ALLOWED_KEYS: &[&str] = &["nexttoken"];

pub const REDACTED: &str = "***";

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    !ALLOWED_KEYS.contains(&key.as_str()) && SENSITIVE_KEY_FRAGMENTS.iter().any(|f| key.contains(f))
}

/// Returns `raw` with sensitive query values and any userinfo masked.
///
/// Unparseable input is cut at the query string.
pub fn redact_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.split('?').next().unwrap_or_default().to_string();
    };
    if !url.username().is_empty() || url.password().is_some() {
        let _ = url.set_username("");
        let _ = url.set_password(None);
    }
    if url.query().is_none() {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if is_sensitive(&k) { REDACTED.to_string() } else { v.into_owned() };
            (k.into_owned(), value)
        })
        .collect();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
