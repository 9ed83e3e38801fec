//! Lead source over the crawler's JSON exports
//!
//! The source directory holds index exports (`Elementor_DB_*.json`, arrays
//! of listing rows) and one detail file per lead (`submission_<id>.json`).
//! Index rows are joined with their detail file by post id.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use leadsync_core::{LeadBatch, LeadSource, SkippedLead};
use leadsync_domain::config::FieldNames;
use leadsync_domain::constants::{DETAIL_FILE_PREFIX, SOURCE_INDEX_PREFIX};
use leadsync_domain::{JoinedLead, LeadSyncError, RemoteRef, Result};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::json::{read_json_opt, storage_error, write_json};

/// One row of an index export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub post_id: String,
    pub read_status: String,
    pub submitted_on: String,
    pub view_href: String,
}

#[derive(Debug, Default, Deserialize)]
struct DetailFile {
    #[serde(default)]
    form_submission: FormSubmission,
    #[serde(default)]
    extra_information: ExtraInformation,
    #[serde(default)]
    remote_ref: Option<RemoteRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FormSubmission {
    #[serde(rename = "First Name")]
    first_name: String,
    #[serde(rename = "Last Name")]
    last_name: String,
    #[serde(rename = "Email Address")]
    email: String,
    #[serde(rename = "WhatsApp/Phone NO.")]
    phone: String,
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Postcode")]
    postcode: String,
    #[serde(rename = "Message")]
    message: String,
    #[serde(rename = "Date of Submission")]
    date_of_submission: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtraInformation {
    #[serde(rename = "Submitted On")]
    submitted_on: SubmittedOn,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmittedOn {
    links: Vec<Link>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Link {
    href: String,
}

pub struct FileLeadSource {
    dir: PathBuf,
    field_names: FieldNames,
    post_id: Regex,
}

impl FileLeadSource {
    pub fn new(dir: impl Into<PathBuf>, field_names: FieldNames) -> Result<Self> {
        let post_id = Regex::new(r"post=(\d+)").map_err(|err| LeadSyncError::Internal(err.to_string()))?;
        Ok(Self { dir: dir.into(), field_names, post_id })
    }

    fn detail_path(&self, post_id: &str) -> PathBuf {
        detail_file(&self.dir, post_id)
    }

    /// Index exports in the source directory, sorted by name.
    async fn index_files(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|err| storage_error(&self.dir, err))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|err| storage_error(&self.dir, err))? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(SOURCE_INDEX_PREFIX) && name.ends_with(".json") {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    /// Rows of one index export. Rows without a post id in their view link
    /// are dropped.
    pub fn parse_index(&self, document: &Value) -> Vec<IndexEntry> {
        let Some(rows) = document.as_array() else {
            return Vec::new();
        };
        rows.iter()
            .filter_map(|row| {
                let href = row.get("View").and_then(|view| view.get("href")).and_then(Value::as_str).unwrap_or_default();
                let post_id = self.post_id.captures(href)?.get(1)?.as_str().to_string();
                Some(IndexEntry {
                    post_id,
                    read_status: text(row, "Read/Unread"),
                    submitted_on: text(row, "Submitted On"),
                    view_href: href.to_string(),
                })
            })
            .collect()
    }

    async fn join(&self, entry: IndexEntry) -> std::result::Result<JoinedLead, String> {
        let detail = match read_json_opt::<DetailFile>(&self.detail_path(&entry.post_id)).await {
            Ok(Some(detail)) => detail,
            Ok(None) => return Err("missing detail file".into()),
            Err(err) => return Err(err.to_string()),
        };
        let form = detail.form_submission;
        Ok(JoinedLead {
            post_id: entry.post_id,
            read_status: entry.read_status,
            submitted_on: entry.submitted_on,
            view_href: entry.view_href,
            first_name: form.first_name,
            last_name: form.last_name,
            email: form.email,
            phone: form.phone,
            country: form.country,
            postcode: form.postcode,
            message: form.message,
            date_of_submission: form.date_of_submission,
            page_href: detail.extra_information.submitted_on.links.into_iter().next().map(|link| link.href),
            remote_ref: detail.remote_ref,
        })
    }
}

fn text(row: &Value, key: &str) -> String {
    row.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

#[async_trait]
impl LeadSource for FileLeadSource {
    async fn load(&self) -> Result<LeadBatch> {
        let mut batch = LeadBatch::default();
        let mut seen = BTreeSet::new();

        for path in self.index_files().await? {
            let document = match read_json_opt::<Value>(&path).await {
                Ok(Some(document)) => document,
                Ok(None) => continue,
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "unreadable index export skipped");
                    continue;
                }
            };
            let entries = self.parse_index(&document);
            debug!(path = %path.display(), rows = entries.len(), "index export parsed");

            for entry in entries {
                if !seen.insert(entry.post_id.clone()) {
                    continue;
                }
                let key = entry.post_id.clone();
                match self.join(entry).await {
                    Ok(lead) => batch.records.push(lead.into_source_record(&self.field_names)),
                    Err(reason) => batch.skipped.push(SkippedLead { external_key: key, reason }),
                }
            }
        }

        info!(dir = %self.dir.display(), leads = batch.records.len(), skipped = batch.skipped.len(), "leads loaded");
        Ok(batch)
    }

    async fn mark_synced(&self, reference: &RemoteRef) -> Result<()> {
        let path = self.detail_path(&reference.external_key);
        let mut document = read_json_opt::<Map<String, Value>>(&path)
            .await?
            .ok_or_else(|| LeadSyncError::NotFound(path.display().to_string()))?;
        let annotation = serde_json::to_value(reference).map_err(|err| LeadSyncError::Internal(err.to_string()))?;
        document.insert("remote_ref".into(), annotation);
        write_json(&path, &document).await
    }
}

/// Location of a lead's detail file inside `dir`.
pub fn detail_file(dir: &Path, post_id: &str) -> PathBuf {
    dir.join(format!("{DETAIL_FILE_PREFIX}{post_id}.json"))
}
