//! HistoryManager - actor that owns the engine state
//!
//! Mutations are queued on a bounded channel and applied one at a time.
//! Committed states are published on a watch channel, so reads never wait
//! behind the queue.

use std::sync::Arc;

use kvstore::KvStore;
use serde_json::Value;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::domain::{Clip, SaveRequest, Settings, Stats, Template, TemplateDraft, Workspace, now_millis};
use crate::history::HistoryFilter;
use crate::storage::{StorageUsage, StoreAdapter};
use crate::transfer::{ExportDocument, parse_import};

use super::engine::{Change, EngineState};
use super::messages::{HistoryCommand, HistoryError, HistoryEvent, HistoryResponse, SaveOutcome};

/// Default bound of the mutation queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Tuning for [`HistoryManager::spawn`]
#[derive(Debug, Clone)]
pub struct ManagerOptions {
    pub queue_capacity: usize,
}

impl Default for ManagerOptions {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Handle to the HistoryManager actor
#[derive(Clone)]
pub struct HistoryManager {
    tx: mpsc::Sender<HistoryCommand>,
    snapshot: watch::Receiver<Arc<EngineState>>,
    /// Broadcast sender for change notifications
    event_tx: broadcast::Sender<HistoryEvent>,
    adapter: Arc<StoreAdapter>,
}

impl HistoryManager {
    /// Load state from the store and spawn the actor
    pub async fn spawn(store: Arc<dyn KvStore>, options: ManagerOptions) -> HistoryResponse<Self> {
        debug!(queue_capacity = options.queue_capacity, "spawn: called");
        let adapter = Arc::new(StoreAdapter::new(store));
        let state = adapter.load().await?;

        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let (snapshot_tx, snapshot) = watch::channel(Arc::new(state));
        let (event_tx, _) = broadcast::channel(64);

        tokio::spawn(actor_loop(adapter.clone(), rx, snapshot_tx, event_tx.clone()));

        info!("HistoryManager spawned");
        Ok(Self {
            tx,
            snapshot,
            event_tx,
            adapter,
        })
    }

    /// Subscribe to change events
    pub fn subscribe_events(&self) -> broadcast::Receiver<HistoryEvent> {
        self.event_tx.subscribe()
    }

    /// Latest committed state
    pub fn snapshot(&self) -> Arc<EngineState> {
        self.snapshot.borrow().clone()
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<HistoryResponse<T>>) -> HistoryCommand) -> HistoryResponse<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| HistoryError::ChannelError)?;
        reply_rx.await.map_err(|_| HistoryError::ChannelError)?
    }

    // === Reads (served from the snapshot) ===

    pub fn get_history(&self, filter: &HistoryFilter) -> Vec<Clip> {
        debug!(?filter, "get_history: called");
        self.snapshot().query(filter)
    }

    pub fn get_clip(&self, id: &str) -> Option<Clip> {
        self.snapshot().history.get(id).cloned()
    }

    pub fn get_settings(&self) -> Settings {
        self.snapshot().settings.clone()
    }

    pub fn get_stats(&self) -> Stats {
        self.snapshot().stats.clone()
    }

    pub fn get_categories(&self) -> Vec<String> {
        self.snapshot().categories()
    }

    pub fn get_workspaces(&self) -> Vec<Workspace> {
        self.snapshot().workspaces.clone()
    }

    pub fn active_workspace(&self) -> String {
        self.snapshot().active_workspace.clone()
    }

    pub fn get_templates(&self) -> Vec<Template> {
        self.snapshot().templates.clone()
    }

    pub fn export_data(&self) -> ExportDocument {
        debug!("export_data: called");
        self.snapshot().export(now_millis())
    }

    pub async fn check_storage(&self) -> HistoryResponse<StorageUsage> {
        debug!("check_storage: called");
        self.adapter.usage().await
    }

    // === Clip operations ===

    pub async fn save(&self, request: SaveRequest) -> HistoryResponse<SaveOutcome> {
        debug!(clip_type = ?request.clip_type, "save: called");
        self.request(|reply| HistoryCommand::Save { request, reply }).await
    }

    pub async fn toggle_pin(&self, id: &str) -> HistoryResponse<bool> {
        debug!(%id, "toggle_pin: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::TogglePin { id, reply }).await
    }

    pub async fn edit_clip(&self, id: &str, content: impl Into<String>) -> HistoryResponse<Clip> {
        debug!(%id, "edit_clip: called");
        let (id, content) = (id.to_string(), content.into());
        self.request(|reply| HistoryCommand::EditClip { id, content, reply })
            .await
    }

    pub async fn set_note(&self, id: &str, note: Option<String>) -> HistoryResponse<()> {
        debug!(%id, "set_note: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::SetNote { id, note, reply }).await
    }

    pub async fn set_category(&self, id: &str, category: Option<String>) -> HistoryResponse<()> {
        debug!(%id, ?category, "set_category: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::SetCategory { id, category, reply })
            .await
    }

    pub async fn set_workspace(&self, id: &str, workspace: Option<String>) -> HistoryResponse<()> {
        debug!(%id, ?workspace, "set_workspace: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::SetWorkspace { id, workspace, reply })
            .await
    }

    pub async fn merge_clips(&self, ids: Vec<String>, separator: impl Into<String>) -> HistoryResponse<SaveOutcome> {
        debug!(count = ids.len(), "merge_clips: called");
        let separator = separator.into();
        self.request(|reply| HistoryCommand::MergeClips { ids, separator, reply })
            .await
    }

    pub async fn increment_copy_count(&self, id: &str) -> HistoryResponse<u64> {
        debug!(%id, "increment_copy_count: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::IncrementCopyCount { id, reply })
            .await
    }

    pub async fn delete_clip(&self, id: &str) -> HistoryResponse<()> {
        debug!(%id, "delete_clip: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::DeleteClip { id, reply }).await
    }

    pub async fn clear_history(&self) -> HistoryResponse<usize> {
        debug!("clear_history: called");
        self.request(|reply| HistoryCommand::ClearHistory { reply }).await
    }

    // === Settings ===

    pub async fn save_settings(&self, settings: Settings) -> HistoryResponse<Settings> {
        debug!("save_settings: called");
        self.request(|reply| HistoryCommand::SaveSettings { settings, reply })
            .await
    }

    // === Workspaces ===

    pub async fn set_active_workspace(&self, id: &str) -> HistoryResponse<()> {
        debug!(%id, "set_active_workspace: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::SetActiveWorkspace { id, reply })
            .await
    }

    pub async fn create_workspace(
        &self,
        name: impl Into<String>,
        icon: impl Into<String>,
        color: impl Into<String>,
    ) -> HistoryResponse<Workspace> {
        let (name, icon, color) = (name.into(), icon.into(), color.into());
        debug!(%name, "create_workspace: called");
        self.request(|reply| HistoryCommand::CreateWorkspace {
            name,
            icon,
            color,
            reply,
        })
        .await
    }

    pub async fn delete_workspace(&self, id: &str) -> HistoryResponse<()> {
        debug!(%id, "delete_workspace: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::DeleteWorkspace { id, reply })
            .await
    }

    // === Templates ===

    pub async fn save_template(&self, draft: TemplateDraft) -> HistoryResponse<Template> {
        debug!(id = ?draft.id, "save_template: called");
        self.request(|reply| HistoryCommand::SaveTemplate { draft, reply })
            .await
    }

    pub async fn delete_template(&self, id: &str) -> HistoryResponse<()> {
        debug!(%id, "delete_template: called");
        let id = id.to_string();
        self.request(|reply| HistoryCommand::DeleteTemplate { id, reply })
            .await
    }

    // === Import ===

    /// Validate and apply an import document; returns the imported clip count
    pub async fn import_data(&self, value: Value) -> HistoryResponse<usize> {
        debug!("import_data: called");
        let document = parse_import(value)?;
        self.request(|reply| HistoryCommand::Import { document, reply })
            .await
    }

    /// Stop the actor; pending commands queued before this are still applied
    pub async fn shutdown(&self) -> HistoryResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(HistoryCommand::Shutdown)
            .await
            .map_err(|_| HistoryError::ChannelError)
    }
}

/// Apply a computed change: persist, publish, broadcast
///
/// On a store failure the committed state is left as it was.
async fn commit<T>(
    adapter: &StoreAdapter,
    snapshot_tx: &watch::Sender<Arc<EngineState>>,
    event_tx: &broadcast::Sender<HistoryEvent>,
    result: HistoryResponse<Change<T>>,
) -> HistoryResponse<T> {
    let change = result?;
    let Some(state) = change.state else {
        return Ok(change.output);
    };

    adapter.persist(&state, &change.keys).await?;
    snapshot_tx.send_replace(Arc::new(state));

    for event in change.events {
        // No subscribers is fine
        let _ = event_tx.send(event);
    }

    match adapter.usage().await {
        Ok(usage) if usage.near_full => {
            warn!(
                bytes_in_use = usage.bytes_in_use,
                quota_bytes = usage.quota_bytes,
                "Storage is nearly full"
            );
            let _ = event_tx.send(HistoryEvent::StorageNearFull {
                bytes_in_use: usage.bytes_in_use,
                quota_bytes: usage.quota_bytes,
            });
        }
        Ok(_) => {}
        Err(e) => debug!(error = %e, "commit: could not read storage usage"),
    }

    Ok(change.output)
}

async fn actor_loop(
    adapter: Arc<StoreAdapter>,
    mut rx: mpsc::Receiver<HistoryCommand>,
    snapshot_tx: watch::Sender<Arc<EngineState>>,
    event_tx: broadcast::Sender<HistoryEvent>,
) {
    debug!("actor_loop: called");

    while let Some(cmd) = rx.recv().await {
        let state = snapshot_tx.borrow().clone();
        let now = now_millis();

        macro_rules! apply {
            ($reply:expr, $result:expr) => {{
                let result = commit(&adapter, &snapshot_tx, &event_tx, $result).await;
                let _ = $reply.send(result);
            }};
        }

        match cmd {
            HistoryCommand::Save { request, reply } => {
                debug!("actor_loop: Save command");
                apply!(reply, state.save(request, now))
            }
            HistoryCommand::TogglePin { id, reply } => {
                debug!(%id, "actor_loop: TogglePin command");
                apply!(reply, state.toggle_pin(&id))
            }
            HistoryCommand::EditClip { id, content, reply } => {
                debug!(%id, "actor_loop: EditClip command");
                apply!(reply, state.edit_clip(&id, content, now))
            }
            HistoryCommand::SetNote { id, note, reply } => {
                debug!(%id, "actor_loop: SetNote command");
                apply!(reply, state.set_note(&id, note))
            }
            HistoryCommand::SetCategory { id, category, reply } => {
                debug!(%id, "actor_loop: SetCategory command");
                apply!(reply, state.set_category(&id, category))
            }
            HistoryCommand::SetWorkspace { id, workspace, reply } => {
                debug!(%id, "actor_loop: SetWorkspace command");
                apply!(reply, state.set_workspace(&id, workspace))
            }
            HistoryCommand::MergeClips { ids, separator, reply } => {
                debug!(count = ids.len(), "actor_loop: MergeClips command");
                apply!(reply, state.merge_clips(&ids, &separator, now))
            }
            HistoryCommand::IncrementCopyCount { id, reply } => {
                debug!(%id, "actor_loop: IncrementCopyCount command");
                apply!(reply, state.increment_copy_count(&id))
            }
            HistoryCommand::DeleteClip { id, reply } => {
                debug!(%id, "actor_loop: DeleteClip command");
                apply!(reply, state.delete_clip(&id))
            }
            HistoryCommand::ClearHistory { reply } => {
                debug!("actor_loop: ClearHistory command");
                apply!(reply, state.clear_history())
            }
            HistoryCommand::SaveSettings { settings, reply } => {
                debug!("actor_loop: SaveSettings command");
                apply!(reply, state.save_settings(settings))
            }
            HistoryCommand::SetActiveWorkspace { id, reply } => {
                debug!(%id, "actor_loop: SetActiveWorkspace command");
                apply!(reply, state.set_active_workspace(&id))
            }
            HistoryCommand::CreateWorkspace { name, icon, color, reply } => {
                debug!(%name, "actor_loop: CreateWorkspace command");
                apply!(reply, state.create_workspace(&name, &icon, &color))
            }
            HistoryCommand::DeleteWorkspace { id, reply } => {
                debug!(%id, "actor_loop: DeleteWorkspace command");
                apply!(reply, state.delete_workspace(&id))
            }
            HistoryCommand::SaveTemplate { draft, reply } => {
                debug!(id = ?draft.id, "actor_loop: SaveTemplate command");
                apply!(reply, state.save_template(draft))
            }
            HistoryCommand::DeleteTemplate { id, reply } => {
                debug!(%id, "actor_loop: DeleteTemplate command");
                apply!(reply, state.delete_template(&id))
            }
            HistoryCommand::Import { document, reply } => {
                debug!("actor_loop: Import command");
                apply!(reply, state.import(document))
            }
            HistoryCommand::Shutdown => {
                debug!("actor_loop: Shutdown command");
                info!("HistoryManager shutting down");
                break;
            }
        }
    }

    debug!("HistoryManager actor stopped");
}
