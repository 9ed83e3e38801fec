//! Remote table records and paging types

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fields::Fields;

/// Identifies one sheet inside a remote table base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub base_id: String,
    /// Human-readable sheet name; resolved to an id by the adapter.
    pub sheet: String,
}

impl TableRef {
    pub fn new(base_id: impl Into<String>, sheet: impl Into<String>) -> Self {
        Self { base_id: base_id.into(), sheet: sheet.into() }
    }
}

/// A record as returned by the remote list and get endpoints.
///
/// Field values stay untyped: the remote side owns them and may return
/// kinds this crate never writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    #[serde(default)]
    pub fields: BTreeMap<String, Value>,
    #[serde(rename = "lastModifiedTime", default, with = "epoch_millis_opt", skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl RemoteRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), fields: BTreeMap::new(), last_modified: None }
    }

    #[must_use]
    pub fn modified_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }
}

/// Opaque continuation token handed out by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(String);

impl PageCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of the list-records endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPage {
    #[serde(default)]
    pub records: Vec<RemoteRecord>,
    #[serde(rename = "nextToken", default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<PageCursor>,
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}

impl RecordPage {
    /// `hasMore` without records or a cursor: following it would only
    /// fetch the same page again.
    pub fn is_anomalous(&self) -> bool {
        self.has_more && self.next_cursor.is_none()
    }
}

/// A fetched record plus the annotation fields computed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    #[serde(flatten)]
    pub record: RemoteRecord,
    #[serde(default, skip_serializing_if = "Fields::is_empty")]
    pub annotations: Fields,
}

/// Local copy of a sheet, as written after a snapshot refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSnapshot {
    #[serde(rename = "totalRecords")]
    pub total_records: usize,
    pub records: Vec<SnapshotRecord>,
}

impl RecordSnapshot {
    pub fn from_records(records: Vec<SnapshotRecord>) -> Self {
        Self { total_records: records.len(), records }
    }

    pub fn index_by_id(&self) -> BTreeMap<&str, &SnapshotRecord> {
        self.records.iter().map(|r| (r.record.id.as_str(), r)).collect()
    }
}

/// `lastModifiedTime` arrives as epoch millis; older exports carry RFC 3339
/// strings or millis encoded as strings.
mod epoch_millis_opt {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(at) => serializer.serialize_i64(at.timestamp_millis()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            Some(Value::String(s)) => s
                .parse::<i64>()
                .ok()
                .and_then(DateTime::from_timestamp_millis)
                .or_else(|| DateTime::parse_from_rfc3339(&s).ok().map(|d| d.with_timezone(&Utc))),
            _ => None,
        })
    }
}
