//! Leads captured by the web form and prepared for upload

use serde::{Deserialize, Serialize};

use super::fields::Fields;
use crate::config::FieldNames;
use crate::errors::{LeadSyncError, Result};

/// Back-reference written into a detail file once its lead is synced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRef {
    pub id: String,
    pub external_key: String,
}

/// An index entry joined with its detail file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedLead {
    pub post_id: String,
    pub read_status: String,
    pub submitted_on: String,
    pub view_href: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub country: String,
    pub postcode: String,
    pub message: String,
    pub date_of_submission: String,
    pub page_href: Option<String>,
    pub remote_ref: Option<RemoteRef>,
}

impl JoinedLead {
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim()).trim().to_string()
    }

    /// Maps the lead onto the target table's columns.
    pub fn to_fields(&self, names: &FieldNames) -> Fields {
        Fields::new()
            .with(&names.lead_id, self.post_id.as_str())
            .with(&names.customer, self.customer_name())
            .with(&names.email, self.email.as_str())
            .with(&names.phone, self.phone.as_str())
            .with(&names.country, self.country.as_str())
            .with(&names.postcode, self.postcode.as_str())
            .with(&names.message, self.message.as_str())
            .with(&names.message_date, self.date_of_submission.as_str())
            .with(&names.read_status, self.read_status.as_str())
            .with(&names.source_link, self.view_href.as_str())
    }

    pub fn into_source_record(self, names: &FieldNames) -> LocalSourceRecord {
        let fields = self.to_fields(names);
        LocalSourceRecord { external_key: self.post_id, fields, remote_ref: self.remote_ref }
    }
}

/// A lead ready for the upserter, keyed by its stable external key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSourceRecord {
    pub external_key: String,
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_ref: Option<RemoteRef>,
}

impl LocalSourceRecord {
    pub fn new(external_key: impl Into<String>, fields: Fields) -> Self {
        Self { external_key: external_key.into(), fields, remote_ref: None }
    }

    pub fn validate(&self) -> Result<()> {
        if self.external_key.trim().is_empty() {
            return Err(LeadSyncError::Validation("record has no external key".into()));
        }
        if self.fields.is_empty() {
            return Err(LeadSyncError::Validation(format!("record {} has no fields", self.external_key)));
        }
        self.fields.validate()
    }

    /// Remote id recorded in the detail file, if it belongs to this key.
    pub fn referenced_remote_id(&self) -> Option<&str> {
        self.remote_ref
            .as_ref()
            .filter(|r| r.external_key == self.external_key && !r.id.is_empty())
            .map(|r| r.id.as_str())
    }
}
