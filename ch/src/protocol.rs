//! Command contract between a presentation layer and the engine
//!
//! One JSON object per message, tagged by `"type"`. Every request gets
//! exactly one response; failures come back as `Error` with a stable kind.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::{Clip, SaveRequest, Settings, Stats, Template, TemplateDraft, Workspace};
use crate::history::HistoryFilter;
use crate::state::{HistoryError, HistoryManager, SaveOutcome};
use crate::storage::StorageUsage;
use crate::transfer::ExportDocument;

fn default_separator() -> String {
    "\n".to_string()
}

/// Requests accepted by [`dispatch`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Record a capture
    Save { data: SaveRequest },

    /// Filtered history listing; every filter is optional
    Query {
        #[serde(default)]
        filters: HistoryFilter,
    },

    Delete { id: String },

    ClearAll,

    TogglePin { id: String },

    EditClip { id: String, content: String },

    SetNote {
        id: String,
        #[serde(default)]
        note: Option<String>,
    },

    SetCategory {
        id: String,
        #[serde(default)]
        category: Option<String>,
    },

    SetWorkspace {
        id: String,
        #[serde(default)]
        workspace: Option<String>,
    },

    MergeClips {
        ids: Vec<String>,
        #[serde(default = "default_separator")]
        separator: String,
    },

    IncrementCopyCount { id: String },

    GetSettings,

    SaveSettings { settings: Settings },

    GetStats,

    GetCategories,

    GetWorkspaces,

    SetActiveWorkspace { id: String },

    CreateWorkspace {
        name: String,
        #[serde(default)]
        icon: String,
        #[serde(default)]
        color: String,
    },

    DeleteWorkspace { id: String },

    GetTemplates,

    SaveTemplate { template: TemplateDraft },

    DeleteTemplate { id: String },

    ExportData,

    ImportData { data: Value },

    CheckStorage,
}

/// Responses produced by [`dispatch`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// A new clip was created
    Saved { clip: Clip },

    /// Identical content was promoted instead
    Duplicate { duplicate: bool, clip: Clip },

    /// The source is excluded; nothing was stored
    Excluded { excluded: bool },

    Clips { clips: Vec<Clip> },

    /// A single updated clip
    Clip { clip: Clip },

    Ok,

    Pinned { pinned: bool },

    CopyCount {
        #[serde(rename = "copyCount")]
        copy_count: u64,
    },

    Cleared { count: usize },

    Settings { settings: Settings },

    Stats { stats: Stats },

    Categories { categories: Vec<String> },

    Workspaces {
        workspaces: Vec<Workspace>,
        #[serde(rename = "activeWorkspace")]
        active_workspace: String,
    },

    Workspace { workspace: Workspace },

    Templates { templates: Vec<Template> },

    Template { template: Template },

    Export { data: ExportDocument },

    Imported {
        #[serde(rename = "importedCount")]
        imported_count: usize,
    },

    Storage { usage: StorageUsage },

    Error { kind: String, message: String },
}

impl From<HistoryError> for Response {
    fn from(e: HistoryError) -> Self {
        Response::Error {
            kind: e.kind().to_string(),
            message: e.to_string(),
        }
    }
}

impl From<SaveOutcome> for Response {
    fn from(outcome: SaveOutcome) -> Self {
        match outcome {
            SaveOutcome::Saved(clip) => Response::Saved { clip },
            SaveOutcome::Duplicate(clip) => Response::Duplicate { duplicate: true, clip },
            SaveOutcome::Excluded => Response::Excluded { excluded: true },
        }
    }
}

/// Route one request to the manager
pub async fn dispatch(manager: &HistoryManager, request: Request) -> Response {
    debug!(?request, "dispatch: called");
    match handle(manager, request).await {
        Ok(response) => response,
        Err(e) => {
            debug!(kind = e.kind(), error = %e, "dispatch: request failed");
            e.into()
        }
    }
}

async fn handle(manager: &HistoryManager, request: Request) -> Result<Response, HistoryError> {
    let response: Response = match request {
        Request::Save { data } => manager.save(data).await?.into(),
        Request::Query { filters } => Response::Clips {
            clips: manager.get_history(&filters),
        },
        Request::Delete { id } => {
            manager.delete_clip(&id).await?;
            Response::Ok
        }
        Request::ClearAll => Response::Cleared {
            count: manager.clear_history().await?,
        },
        Request::TogglePin { id } => Response::Pinned {
            pinned: manager.toggle_pin(&id).await?,
        },
        Request::EditClip { id, content } => Response::Clip {
            clip: manager.edit_clip(&id, content).await?,
        },
        Request::SetNote { id, note } => {
            manager.set_note(&id, note).await?;
            Response::Ok
        }
        Request::SetCategory { id, category } => {
            manager.set_category(&id, category).await?;
            Response::Ok
        }
        Request::SetWorkspace { id, workspace } => {
            manager.set_workspace(&id, workspace).await?;
            Response::Ok
        }
        Request::MergeClips { ids, separator } => manager.merge_clips(ids, separator).await?.into(),
        Request::IncrementCopyCount { id } => Response::CopyCount {
            copy_count: manager.increment_copy_count(&id).await?,
        },
        Request::GetSettings => Response::Settings {
            settings: manager.get_settings(),
        },
        Request::SaveSettings { settings } => Response::Settings {
            settings: manager.save_settings(settings).await?,
        },
        Request::GetStats => Response::Stats {
            stats: manager.get_stats(),
        },
        Request::GetCategories => Response::Categories {
            categories: manager.get_categories(),
        },
        Request::GetWorkspaces => {
            let snapshot = manager.snapshot();
            Response::Workspaces {
                workspaces: snapshot.workspaces.clone(),
                active_workspace: snapshot.active_workspace.clone(),
            }
        }
        Request::SetActiveWorkspace { id } => {
            manager.set_active_workspace(&id).await?;
            Response::Ok
        }
        Request::CreateWorkspace { name, icon, color } => Response::Workspace {
            workspace: manager.create_workspace(name, icon, color).await?,
        },
        Request::DeleteWorkspace { id } => {
            manager.delete_workspace(&id).await?;
            Response::Ok
        }
        Request::GetTemplates => Response::Templates {
            templates: manager.get_templates(),
        },
        Request::SaveTemplate { template } => Response::Template {
            template: manager.save_template(template).await?,
        },
        Request::DeleteTemplate { id } => {
            manager.delete_template(&id).await?;
            Response::Ok
        }
        Request::ExportData => Response::Export {
            data: manager.export_data(),
        },
        Request::ImportData { data } => Response::Imported {
            imported_count: manager.import_data(data).await?,
        },
        Request::CheckStorage => Response::Storage {
            usage: manager.check_storage().await?,
        },
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ManagerOptions;
    use kvstore::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    async fn manager() -> HistoryManager {
        HistoryManager::spawn(Arc::new(MemoryStore::new()), ManagerOptions::default())
            .await
            .unwrap()
    }

    fn request(value: Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    fn save(content: &str) -> Request {
        Request::Save {
            data: SaveRequest::text(content),
        }
    }

    #[test]
    fn test_save_request_deserializes_flat() {
        let req = request(json!({
            "type": "Save",
            "data": {"content": "hi", "type": "code", "source": {"hostname": "a.test"}}
        }));
        let Request::Save { data } = req else {
            panic!("expected Save");
        };
        assert_eq!(data.content.as_deref(), Some("hi"));
        assert_eq!(data.clip_type, Some(crate::domain::ClipType::Code));
        assert_eq!(data.source.unwrap().hostname, "a.test");
    }

    #[test]
    fn test_query_without_filters() {
        assert_eq!(
            request(json!({"type": "Query"})),
            Request::Query {
                filters: HistoryFilter::default()
            }
        );
    }

    #[test]
    fn test_unit_request_serializes_tag_only() {
        assert_eq!(serde_json::to_string(&Request::ClearAll).unwrap(), r#"{"type":"ClearAll"}"#);
    }

    #[test]
    fn test_duplicate_and_excluded_flags() {
        let value = serde_json::to_value(Response::from(SaveOutcome::Excluded)).unwrap();
        assert_eq!(value, json!({"type": "Excluded", "excluded": true}));

        let value = serde_json::to_value(Response::Imported { imported_count: 3 }).unwrap();
        assert_eq!(value, json!({"type": "Imported", "importedCount": 3}));
    }

    #[test]
    fn test_error_response_carries_kind() {
        let value = serde_json::to_value(Response::from(HistoryError::Io("disk full".to_string()))).unwrap();
        assert_eq!(value["type"], "Error");
        assert_eq!(value["kind"], "IOError");
        assert!(value["message"].as_str().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_dispatch_save_then_duplicate() {
        let m = manager().await;
        let first = dispatch(&m, request(json!({"type": "Save", "data": {"content": "abc"}}))).await;
        assert!(matches!(first, Response::Saved { .. }));

        let second = dispatch(&m, request(json!({"type": "Save", "data": {"content": "abc"}}))).await;
        assert!(matches!(second, Response::Duplicate { duplicate: true, .. }));
    }

    #[tokio::test]
    async fn test_dispatch_errors_become_responses() {
        let m = manager().await;
        let response = dispatch(&m, request(json!({"type": "Save", "data": {"content": "  "}}))).await;
        assert_eq!(
            response,
            Response::Error {
                kind: "EmptyContent".to_string(),
                message: "Clip content is empty".to_string(),
            }
        );

        let response = dispatch(&m, request(json!({"type": "DeleteWorkspace", "id": "default"}))).await;
        assert!(matches!(response, Response::Error { ref kind, .. } if kind == "CannotDeleteDefault"));
    }

    #[tokio::test]
    async fn test_dispatch_merge_and_query() {
        let m = manager().await;
        let Response::Saved { clip: a } = dispatch(&m, save("one")).await else {
            panic!("expected Saved");
        };
        let Response::Saved { clip: b } = dispatch(&m, save("two")).await else {
            panic!("expected Saved");
        };

        let merged = dispatch(
            &m,
            request(json!({"type": "MergeClips", "ids": [a.id, b.id], "separator": "+"})),
        )
        .await;
        assert!(matches!(merged, Response::Saved { ref clip } if clip.content == "one+two"));

        let Response::Clips { clips } = dispatch(&m, request(json!({"type": "Query", "filters": {"search": "ONE"}}))).await else {
            panic!("expected Clips");
        };
        assert_eq!(clips.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_workspaces_report_active() {
        let m = manager().await;
        let Response::Workspace { workspace } =
            dispatch(&m, request(json!({"type": "CreateWorkspace", "name": "Work"}))).await
        else {
            panic!("expected Workspace");
        };
        dispatch(&m, Request::SetActiveWorkspace { id: workspace.id.clone() }).await;

        let Response::Workspaces {
            workspaces,
            active_workspace,
        } = dispatch(&m, Request::GetWorkspaces).await
        else {
            panic!("expected Workspaces");
        };
        assert_eq!(workspaces.len(), 2);
        assert_eq!(active_workspace, workspace.id);
    }

    #[tokio::test]
    async fn test_dispatch_export_import() {
        let m = manager().await;
        dispatch(&m, save("exported")).await;
        let Response::Export { data } = dispatch(&m, Request::ExportData).await else {
            panic!("expected Export");
        };

        let other = manager().await;
        let response = dispatch(
            &other,
            Request::ImportData {
                data: serde_json::to_value(&data).unwrap(),
            },
        )
        .await;
        assert_eq!(response, Response::Imported { imported_count: 1 });
    }
}
