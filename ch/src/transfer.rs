//! Export and import documents
//!
//! An export is a complete, versioned snapshot of every stored section. An
//! import document may carry any subset of those sections; each one present
//! replaces the stored section wholesale.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::{Clip, Settings, Stats, Template, Workspace};
use crate::history::History;
use crate::state::HistoryError;

/// Highest document version this build reads and the one it writes
pub const FORMAT_VERSION: u32 = 1;

/// Full snapshot produced by `export_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub history: Vec<Clip>,
    pub settings: Settings,
    pub stats: Stats,
    pub templates: Vec<Template>,
    pub workspaces: Vec<Workspace>,
    pub format_version: u32,
    /// Unix ms
    pub exported_at: i64,
}

/// Validated import; absent sections stay untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportDocument {
    pub history: Option<Vec<Clip>>,
    pub settings: Option<Settings>,
    pub stats: Option<Stats>,
    pub templates: Option<Vec<Template>>,
    pub workspaces: Option<Vec<Workspace>>,
}

impl ImportDocument {
    pub fn is_empty(&self) -> bool {
        self.history.is_none()
            && self.settings.is_none()
            && self.stats.is_none()
            && self.templates.is_none()
            && self.workspaces.is_none()
    }
}

fn invalid(msg: impl Into<String>) -> HistoryError {
    HistoryError::InvalidImport(msg.into())
}

/// Deserialize one section; missing or null means absent
fn section<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Result<Option<T>, HistoryError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| invalid(format!("section '{}': {}", key, e))),
    }
}

/// Validate an untrusted document; nothing is written on failure
pub fn parse_import(value: Value) -> Result<ImportDocument, HistoryError> {
    debug!("parse_import: called");
    let Value::Object(object) = value else {
        return Err(invalid("document must be a JSON object"));
    };

    if let Some(version) = object.get("formatVersion").filter(|v| !v.is_null()) {
        let version = version
            .as_u64()
            .ok_or_else(|| invalid("formatVersion must be a non-negative integer"))?;
        if version > u64::from(FORMAT_VERSION) {
            return Err(invalid(format!(
                "formatVersion {} is newer than supported version {}",
                version, FORMAT_VERSION
            )));
        }
    }

    let document = ImportDocument {
        history: section(&object, "history")?,
        settings: section(&object, "settings")?,
        stats: section(&object, "stats")?,
        templates: section(&object, "templates")?,
        workspaces: section(&object, "workspaces")?,
    };

    if let Some(clips) = &document.history {
        let history = History::new(clips.clone());
        if let Some(id) = history.duplicate_id() {
            return Err(invalid(format!("duplicate clip id '{}'", id)));
        }
    }
    if let Some(settings) = &document.settings {
        settings.validate().map_err(invalid)?;
    }

    debug!(
        clips = document.history.as_ref().map(Vec::len),
        empty = document.is_empty(),
        "parse_import: document accepted"
    );
    Ok(document)
}
