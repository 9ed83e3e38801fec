//! Sheet-name resolution backed by a cached definition file

use std::collections::HashMap;
use std::path::PathBuf;

use leadsync_common::RetryPolicy;
use leadsync_domain::config::OperationClass;
use leadsync_domain::{Result, TableRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::session::NotableSession;
use crate::http::HttpRequest;
use crate::storage::json::{read_json_opt, write_json};

/// One sheet of a table base, as listed by the views endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetView {
    #[serde(alias = "sheetId")]
    pub id: String,
    pub name: String,
}

/// Contents of the definition file. The endpoint answers with either
/// `items` or `value`; both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDefinition {
    #[serde(alias = "value", default)]
    pub items: Vec<SheetView>,
}

impl SheetDefinition {
    pub fn sheet_id(&self, name: &str) -> Option<&str> {
        self.items.iter().find(|view| view.name == name).map(|view| view.id.as_str())
    }
}

pub struct SheetResolver {
    session: NotableSession,
    views_url: String,
    definition_path: PathBuf,
    retry: RetryPolicy,
    resolved: Mutex<HashMap<TableRef, String>>,
}

impl SheetResolver {
    pub fn new(session: NotableSession, views_url: impl Into<String>, definition_path: PathBuf, retry: RetryPolicy) -> Self {
        Self { session, views_url: views_url.into(), definition_path, retry, resolved: Mutex::new(HashMap::new()) }
    }

    /// Lists the sheets of `base_id` from the remote API.
    pub async fn list_views(&self, base_id: &str) -> Result<SheetDefinition> {
        let url = self.session.url(&self.views_url, &[("table_id", base_id)])?;
        let request = HttpRequest::get(url.as_str(), OperationClass::GetViews).retry(self.retry.clone());
        let value = self.session.call(request).await?;
        let definition = parse_definition(value);
        info!(base_id, views = definition.items.len(), "table views listed");
        Ok(definition)
    }

    /// Loads the definition file, fetching and caching it first when absent.
    pub async fn ensure_definition(&self, base_id: &str) -> Result<SheetDefinition> {
        if let Some(definition) = read_json_opt::<SheetDefinition>(&self.definition_path).await? {
            return Ok(definition);
        }
        let definition = self.list_views(base_id).await?;
        write_json(&self.definition_path, &definition).await?;
        info!(path = %self.definition_path.display(), "table definition cached");
        Ok(definition)
    }

    /// Resolves the sheet name of `table` to its id. Names missing from the
    /// definition, or an unavailable definition, fall back to the name
    /// itself.
    pub async fn resolve(&self, table: &TableRef) -> Result<String> {
        let mut resolved = self.resolved.lock().await;
        if let Some(id) = resolved.get(table) {
            return Ok(id.clone());
        }

        let id = match self.ensure_definition(&table.base_id).await {
            Ok(definition) => match definition.sheet_id(&table.sheet) {
                Some(id) => {
                    debug!(sheet = %table.sheet, sheet_id = id, "sheet resolved");
                    id.to_string()
                }
                None => {
                    warn!(sheet = %table.sheet, "sheet not in table definition; using its name as id");
                    table.sheet.clone()
                }
            },
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                warn!(sheet = %table.sheet, error = %err, "table definition unavailable; using sheet name as id");
                table.sheet.clone()
            }
        };
        resolved.insert(table.clone(), id.clone());
        Ok(id)
    }
}

fn parse_definition(value: Value) -> SheetDefinition {
    let views = value.get("items").or_else(|| value.get("value")).and_then(Value::as_array);
    let Some(views) = views else {
        warn!("views response has neither items nor value");
        return SheetDefinition::default();
    };
    let items = views
        .iter()
        .filter_map(|view| {
            let id = view.get("id").or_else(|| view.get("sheetId")).and_then(Value::as_str)?;
            let name = view.get("name").and_then(Value::as_str)?;
            Some(SheetView { id: id.to_string(), name: name.to_string() })
        })
        .collect();
    SheetDefinition { items }
}
