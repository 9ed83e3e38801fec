//! Typed field payloads for remote table records
//!
//! Remote tables accept a handful of cell kinds. [`FieldValue`] names them
//! explicitly and [`Fields`] keeps them in a stable, name-ordered map so
//! payloads serialize deterministically.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::constants::{MARKDOWN_TRUNCATION_MARKER, TEXT_TRUNCATION_MARKER};
use crate::errors::{LeadSyncError, Result};

/// Epoch-millisecond integers in this range are read back as timestamps.
const MILLIS_TIMESTAMP_RANGE: std::ops::Range<i64> = 1_000_000_000_000..10_000_000_000_000;

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FieldValue {
    Text(String),
    /// Rich text cell, sent as `{"markdown": "..."}`.
    Markdown(String),
    /// Date cell, sent as epoch milliseconds.
    Timestamp(DateTime<Utc>),
    Number(f64),
    Checkbox(bool),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn markdown(value: impl Into<String>) -> Self {
        Self::Markdown(value.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Markdown(_) => "markdown",
            Self::Timestamp(_) => "timestamp",
            Self::Number(_) => "number",
            Self::Checkbox(_) => "checkbox",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Markdown(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Checkbox(b) => Some(*b),
            _ => None,
        }
    }

    /// Length in characters of the rendered cell content.
    pub fn char_len(&self) -> usize {
        match self {
            Self::Text(s) | Self::Markdown(s) => s.chars().count(),
            Self::Number(n) => n.to_string().len(),
            Self::Timestamp(_) | Self::Checkbox(_) => 0,
        }
    }

    /// Returns a shortened copy when the value exceeds `max_chars`.
    ///
    /// Only text kinds are shortened; the kept prefix is exactly `max_chars`
    /// characters followed by a kind-specific marker.
    pub fn truncated(&self, max_chars: usize) -> Option<Self> {
        let (content, marker) = match self {
            Self::Text(s) => (s, TEXT_TRUNCATION_MARKER),
            Self::Markdown(s) => (s, MARKDOWN_TRUNCATION_MARKER),
            _ => return None,
        };
        if content.chars().count() <= max_chars {
            return None;
        }
        let mut kept: String = content.chars().take(max_chars).collect();
        kept.push_str(marker);
        Some(match self {
            Self::Markdown(_) => Self::Markdown(kept),
            _ => Self::Text(kept),
        })
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => Value::String(s),
            FieldValue::Markdown(s) => json!({ "markdown": s }),
            FieldValue::Timestamp(t) => Value::from(t.timestamp_millis()),
            FieldValue::Number(n) => serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number),
            FieldValue::Checkbox(b) => Value::Bool(b),
        }
    }
}

impl TryFrom<Value> for FieldValue {
    type Error = String;

    fn try_from(value: Value) -> std::result::Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(Self::Text(s)),
            Value::Bool(b) => Ok(Self::Checkbox(b)),
            Value::Number(n) => {
                if let Some(millis) = n.as_i64().filter(|m| MILLIS_TIMESTAMP_RANGE.contains(m)) {
                    if let Some(ts) = DateTime::from_timestamp_millis(millis) {
                        return Ok(Self::Timestamp(ts));
                    }
                }
                n.as_f64().map(Self::Number).ok_or_else(|| format!("unsupported number: {n}"))
            }
            Value::Object(ref map) => match map.get("markdown") {
                Some(Value::String(md)) => Ok(Self::Markdown(md.clone())),
                _ => Err(format!("unsupported field object: {value}")),
            },
            other => Err(format!("unsupported field value: {other}")),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Checkbox(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

/// Name-ordered mapping of field name to value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.0.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Copies every entry of `other` over this map.
    pub fn extend_from(&mut self, other: &Fields) {
        for (name, value) in other.iter() {
            self.0.insert(name.clone(), value.clone());
        }
    }

    /// Rejects payloads the remote table cannot store.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.0 {
            if name.trim().is_empty() {
                return Err(LeadSyncError::Validation("field name must not be empty".into()));
            }
            if let FieldValue::Number(n) = value {
                if !n.is_finite() {
                    return Err(LeadSyncError::Validation(format!(
                        "field '{name}' holds a non-finite number"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Truncates every oversized text value in place and returns the names
    /// of the fields that were shortened.
    pub fn truncate_oversized(&mut self, max_chars: usize) -> Vec<String> {
        let mut truncated = Vec::new();
        for (name, value) in &mut self.0 {
            if let Some(shorter) = value.truncated(max_chars) {
                *value = shorter;
                truncated.push(name.clone());
            }
        }
        truncated
    }

    /// Numeric values whose rendering exceeds `max_chars`; these are sent
    /// unchanged and only reported.
    pub fn oversized_numbers(&self, max_chars: usize) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, v)| matches!(v, FieldValue::Number(_)) && v.char_len() > max_chars)
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter().map(|(k, v)| (k.clone(), Value::from(v.clone()))).collect())
    }
}

impl FromIterator<(String, FieldValue)> for Fields {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a FieldValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, FieldValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_over_limit_is_truncated_with_marker() {
        let value = FieldValue::text("x".repeat(12));
        let shortened = value.truncated(10).unwrap();
        assert_eq!(shortened, FieldValue::Text(format!("{}{}", "x".repeat(10), TEXT_TRUNCATION_MARKER)));
    }

    #[test]
    fn markdown_uses_its_own_marker() {
        let value = FieldValue::markdown("é".repeat(11));
        match value.truncated(10).unwrap() {
            FieldValue::Markdown(s) => {
                assert!(s.starts_with(&"é".repeat(10)));
                assert!(s.ends_with(MARKDOWN_TRUNCATION_MARKER));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn values_within_limit_are_untouched() {
        let mut fields = Fields::new().with("Message", "short").with("Score", 3.5);
        let before = fields.clone();
        assert!(fields.truncate_oversized(10).is_empty());
        assert_eq!(fields, before);

        let exact = FieldValue::text("a".repeat(10));
        assert!(exact.truncated(10).is_none());
    }

    #[test]
    fn truncate_oversized_reports_field_names() {
        let mut fields = Fields::new().with("Message", "y".repeat(20)).with("Email", "a@b.c");
        assert_eq!(fields.truncate_oversized(5), vec!["Message".to_string()]);
        assert_eq!(fields.get("Email").and_then(FieldValue::as_str), Some("a@b.c"));
    }

    #[test]
    fn wire_format_per_kind() {
        let ts = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let fields = Fields::new()
            .with("Notes", FieldValue::markdown("**hi**"))
            .with("When", ts)
            .with("Done", true)
            .with("Name", "Ada");
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["Notes"], json!({ "markdown": "**hi**" }));
        assert_eq!(json["When"], json!(1_700_000_000_000_i64));
        assert_eq!(json["Done"], json!(true));
        assert_eq!(json["Name"], json!("Ada"));

        let back: Fields = serde_json::from_value(json).unwrap();
        assert_eq!(back, fields);
    }

    #[test]
    fn rejects_unsupported_values() {
        assert!(serde_json::from_value::<FieldValue>(json!([1, 2])).is_err());
        assert!(serde_json::from_value::<FieldValue>(json!({ "link": "x" })).is_err());
    }

    #[test]
    fn validate_flags_bad_names_and_numbers() {
        assert!(Fields::new().with(" ", "x").validate().is_err());
        assert!(Fields::new().with("n", f64::NAN).validate().is_err());
        assert!(Fields::new().with("n", 1.0).validate().is_ok());
    }
}
