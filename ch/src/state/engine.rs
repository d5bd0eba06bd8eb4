//! Engine state and its transitions
//!
//! Every mutation is a pure function from the current state to a [`Change`]:
//! the complete next state, the store keys it touches, the caller's output,
//! and the events to broadcast once committed. Nothing here performs I/O, so
//! a failed write can simply discard the change.

use tracing::debug;

use crate::classify::{self, Classification};
use crate::domain::{
    Clip, ClipType, DEFAULT_WORKSPACE_ID, SaveRequest, Settings, Stats, Template, TemplateDraft, Workspace,
    ensure_default,
};
use crate::history::{History, HistoryFilter};
use crate::transfer::{ExportDocument, FORMAT_VERSION, ImportDocument};

use super::messages::{HistoryError, HistoryEvent, HistoryResponse, SaveOutcome};

/// Logical keys in the persistent store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    History,
    Settings,
    Stats,
    Templates,
    Workspaces,
    ActiveWorkspace,
}

impl StoreKey {
    pub const ALL: [StoreKey; 6] = [
        StoreKey::History,
        StoreKey::Settings,
        StoreKey::Stats,
        StoreKey::Templates,
        StoreKey::Workspaces,
        StoreKey::ActiveWorkspace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::History => "history",
            StoreKey::Settings => "settings",
            StoreKey::Stats => "stats",
            StoreKey::Templates => "templates",
            StoreKey::Workspaces => "workspaces",
            StoreKey::ActiveWorkspace => "activeWorkspace",
        }
    }
}

/// Outcome of a transition, not yet committed
#[derive(Debug)]
pub struct Change<T> {
    /// Next state, or None when nothing changed
    pub state: Option<EngineState>,
    pub keys: Vec<StoreKey>,
    pub output: T,
    pub events: Vec<HistoryEvent>,
}

impl<T> Change<T> {
    fn none(output: T) -> Self {
        Self {
            state: None,
            keys: Vec::new(),
            output,
            events: Vec::new(),
        }
    }

    fn write(state: EngineState, keys: &[StoreKey], output: T) -> Self {
        Self {
            state: Some(state),
            keys: keys.to_vec(),
            output,
            events: Vec::new(),
        }
    }

    fn event(mut self, event: HistoryEvent) -> Self {
        self.events.push(event);
        self
    }
}

/// All process-wide state owned by the engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineState {
    pub history: History,
    pub settings: Settings,
    pub stats: Stats,
    pub templates: Vec<Template>,
    pub workspaces: Vec<Workspace>,
    pub active_workspace: String,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            history: History::default(),
            settings: Settings::default(),
            stats: Stats::default(),
            templates: Vec::new(),
            workspaces: vec![Workspace::seed()],
            active_workspace: DEFAULT_WORKSPACE_ID.to_string(),
        }
    }
}

/// Normalize an optional text field: empty clears it
fn cleared_if_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl EngineState {
    // === Reads ===

    pub fn query(&self, filter: &HistoryFilter) -> Vec<Clip> {
        self.history.query(filter)
    }

    pub fn categories(&self) -> Vec<String> {
        self.history.categories()
    }

    pub fn has_workspace(&self, id: &str) -> bool {
        self.workspaces.iter().any(|w| w.id == id)
    }

    pub fn export(&self, now: i64) -> ExportDocument {
        ExportDocument {
            history: self.history.clips().to_vec(),
            settings: self.settings.clone(),
            stats: self.stats.clone(),
            templates: self.templates.clone(),
            workspaces: self.workspaces.clone(),
            format_version: FORMAT_VERSION,
            exported_at: now,
        }
    }

    // === Clip operations ===

    /// Record a capture: dedup-promote, or insert and evict
    pub fn save(&self, request: SaveRequest, now: i64) -> HistoryResponse<Change<SaveOutcome>> {
        let content = match request.content {
            Some(content) if !content.trim().is_empty() => content,
            _ => {
                debug!("save: rejecting empty content");
                return Err(HistoryError::EmptyContent);
            }
        };
        let source = request.source.unwrap_or_default();

        if self.settings.is_excluded(&source.hostname) {
            debug!(hostname = %source.hostname, "save: source is excluded");
            return Ok(Change::none(SaveOutcome::Excluded));
        }

        let Classification {
            clip_type,
            is_sensitive: secret_shaped,
        } = match request.clip_type {
            Some(clip_type) => Classification {
                clip_type,
                is_sensitive: clip_type.is_text_like() && classify::is_sensitive(&content),
            },
            None => classify::classify(&content),
        };
        let mut next = self.clone();

        if clip_type != ClipType::Image
            && let Some(index) = next.history.find_duplicate(&content)
            && let Some(clip) = next.history.promote(index, source.clone(), now).cloned()
        {
            debug!(id = %clip.id, from = index, "save: promoting duplicate");
            let id = clip.id.clone();
            return Ok(Change::write(next, &[StoreKey::History], SaveOutcome::Duplicate(clip))
                .event(HistoryEvent::ClipPromoted { id }));
        }

        let is_sensitive = self.settings.detect_sensitive && clip_type.is_text_like() && secret_shaped;
        if is_sensitive {
            debug!(pattern = ?classify::sensitive_pattern(&content), "save: flagged sensitive content");
        }

        let mut clip = Clip::new(content, clip_type, source, &self.active_workspace, now);
        clip.html = request.html;
        clip.mime_type = request.mime_type;
        clip.is_sensitive = is_sensitive;

        next.history.push_front(clip.clone());
        next.stats.record_save(clip_type);
        let evicted = next.history.evict(&next.settings, now);
        debug!(id = %clip.id, %clip_type, is_sensitive, evicted, "save: inserted new clip");

        let mut change = Change::write(next, &[StoreKey::History, StoreKey::Stats], SaveOutcome::Saved(clip.clone()))
            .event(HistoryEvent::ClipSaved { id: clip.id });
        if evicted > 0 {
            change = change.event(HistoryEvent::ClipsEvicted { count: evicted });
        }
        Ok(change)
    }

    fn update_clip<T>(
        &self,
        id: &str,
        keys: &[StoreKey],
        f: impl FnOnce(&mut Clip) -> HistoryResponse<T>,
    ) -> HistoryResponse<Change<T>> {
        let mut next = self.clone();
        let clip = next
            .history
            .get_mut(id)
            .ok_or_else(|| HistoryError::NotFound(format!("Clip {}", id)))?;
        let output = f(clip)?;
        Ok(Change::write(next, keys, output))
    }

    /// Flip the pinned flag; returns the new value
    pub fn toggle_pin(&self, id: &str) -> HistoryResponse<Change<bool>> {
        self.update_clip(id, &[StoreKey::History], |clip| {
            clip.pinned = !clip.pinned;
            Ok(clip.pinned)
        })
    }

    /// Replace the content of a text clip
    ///
    /// Type and sensitivity are left as they were at capture time.
    pub fn edit_clip(&self, id: &str, content: String, now: i64) -> HistoryResponse<Change<Clip>> {
        self.update_clip(id, &[StoreKey::History], |clip| {
            if !clip.clip_type.is_editable() {
                return Err(HistoryError::UnsupportedClipType(clip.clip_type));
            }
            if content.trim().is_empty() {
                return Err(HistoryError::EmptyContent);
            }
            clip.content = content;
            clip.edited_at = Some(now);
            Ok(clip.clone())
        })
    }

    pub fn set_note(&self, id: &str, note: Option<String>) -> HistoryResponse<Change<()>> {
        self.update_clip(id, &[StoreKey::History], |clip| {
            clip.note = cleared_if_empty(note);
            Ok(())
        })
    }

    pub fn set_category(&self, id: &str, category: Option<String>) -> HistoryResponse<Change<()>> {
        self.update_clip(id, &[StoreKey::History], |clip| {
            clip.category = cleared_if_empty(category);
            Ok(())
        })
    }

    pub fn set_workspace(&self, id: &str, workspace: Option<String>) -> HistoryResponse<Change<()>> {
        self.update_clip(id, &[StoreKey::History], |clip| {
            clip.workspace = cleared_if_empty(workspace);
            Ok(())
        })
    }

    /// Join the content of the given clips, in `ids` order, into a new clip
    pub fn merge_clips(&self, ids: &[String], separator: &str, now: i64) -> HistoryResponse<Change<SaveOutcome>> {
        let parts: Vec<&str> = ids
            .iter()
            .filter_map(|id| self.history.get(id))
            .filter(|clip| !clip.is_image())
            .map(|clip| clip.content.as_str())
            .collect();

        if parts.len() < 2 {
            debug!(found = parts.len(), "merge_clips: not enough text clips");
            return Err(HistoryError::InsufficientClips { found: parts.len() });
        }

        self.save(SaveRequest::text(parts.join(separator)), now)
    }

    /// Count a copy-back; returns the clip's new copy count
    pub fn increment_copy_count(&self, id: &str) -> HistoryResponse<Change<u64>> {
        let mut change = self.update_clip(id, &[StoreKey::History, StoreKey::Stats], |clip| {
            clip.copy_count += 1;
            Ok(clip.copy_count)
        })?;
        if let Some(next) = change.state.as_mut() {
            next.stats.record_copy();
        }
        Ok(change)
    }

    pub fn delete_clip(&self, id: &str) -> HistoryResponse<Change<()>> {
        let mut next = self.clone();
        next.history
            .remove(id)
            .ok_or_else(|| HistoryError::NotFound(format!("Clip {}", id)))?;
        Ok(Change::write(next, &[StoreKey::History], ()).event(HistoryEvent::ClipRemoved { id: id.to_string() }))
    }

    /// Remove every clip; returns how many were removed
    pub fn clear_history(&self) -> HistoryResponse<Change<usize>> {
        let count = self.history.len();
        let mut next = self.clone();
        next.history.clear();
        Ok(Change::write(next, &[StoreKey::History], count).event(HistoryEvent::HistoryCleared { count }))
    }

    // === Settings ===

    pub fn save_settings(&self, settings: Settings) -> HistoryResponse<Change<Settings>> {
        settings.validate().map_err(HistoryError::InvalidSettings)?;
        let mut next = self.clone();
        next.settings = settings.clone();
        Ok(Change::write(next, &[StoreKey::Settings], settings))
    }

    // === Workspaces ===

    pub fn set_active_workspace(&self, id: &str) -> HistoryResponse<Change<()>> {
        if !self.has_workspace(id) {
            return Err(HistoryError::NotFound(format!("Workspace {}", id)));
        }
        let mut next = self.clone();
        next.active_workspace = id.to_string();
        Ok(Change::write(next, &[StoreKey::ActiveWorkspace], ()))
    }

    pub fn create_workspace(&self, name: &str, icon: &str, color: &str) -> HistoryResponse<Change<Workspace>> {
        let workspace = Workspace::new(name, icon, color);
        let mut next = self.clone();
        next.workspaces.push(workspace.clone());
        Ok(Change::write(next, &[StoreKey::Workspaces], workspace))
    }

    /// Remove a workspace definition; clips tagged with it are left alone
    pub fn delete_workspace(&self, id: &str) -> HistoryResponse<Change<()>> {
        if id == DEFAULT_WORKSPACE_ID {
            return Err(HistoryError::CannotDeleteDefault);
        }
        let index = self
            .workspaces
            .iter()
            .position(|w| w.id == id)
            .ok_or_else(|| HistoryError::NotFound(format!("Workspace {}", id)))?;

        let mut next = self.clone();
        next.workspaces.remove(index);
        if next.active_workspace == id {
            debug!(%id, "delete_workspace: active workspace deleted, falling back to default");
            next.active_workspace = DEFAULT_WORKSPACE_ID.to_string();
            return Ok(Change::write(next, &[StoreKey::Workspaces, StoreKey::ActiveWorkspace], ()));
        }
        Ok(Change::write(next, &[StoreKey::Workspaces], ()))
    }

    // === Templates ===

    pub fn save_template(&self, draft: TemplateDraft) -> HistoryResponse<Change<Template>> {
        let mut next = self.clone();
        let template = match draft.id {
            Some(id) => {
                let existing = next
                    .templates
                    .iter_mut()
                    .find(|t| t.id == id)
                    .ok_or_else(|| HistoryError::NotFound(format!("Template {}", id)))?;
                existing.name = draft.name;
                existing.content = draft.content;
                existing.clone()
            }
            None => {
                let template = Template::new(draft.name, draft.content);
                next.templates.push(template.clone());
                template
            }
        };
        Ok(Change::write(next, &[StoreKey::Templates], template))
    }

    pub fn delete_template(&self, id: &str) -> HistoryResponse<Change<()>> {
        let index = self
            .templates
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| HistoryError::NotFound(format!("Template {}", id)))?;
        let mut next = self.clone();
        next.templates.remove(index);
        Ok(Change::write(next, &[StoreKey::Templates], ()))
    }

    // === Import ===

    /// Replace every section present in the document; returns the imported clip count
    pub fn import(&self, document: ImportDocument) -> HistoryResponse<Change<usize>> {
        let mut next = self.clone();
        let mut keys = Vec::new();
        let mut count = 0;

        if let Some(history) = document.history {
            count = history.len();
            next.history = History::new(history);
            keys.push(StoreKey::History);
        }
        if let Some(settings) = document.settings {
            next.settings = settings;
            keys.push(StoreKey::Settings);
        }
        if let Some(stats) = document.stats {
            next.stats = stats;
            keys.push(StoreKey::Stats);
        }
        if let Some(templates) = document.templates {
            next.templates = templates;
            keys.push(StoreKey::Templates);
        }
        if let Some(mut workspaces) = document.workspaces {
            ensure_default(&mut workspaces);
            next.workspaces = workspaces;
            keys.push(StoreKey::Workspaces);
            if !next.has_workspace(&next.active_workspace) {
                next.active_workspace = DEFAULT_WORKSPACE_ID.to_string();
                keys.push(StoreKey::ActiveWorkspace);
            }
        }

        debug!(count, sections = keys.len(), "import: replacing sections");
        if keys.is_empty() {
            return Ok(Change::none(0));
        }
        Ok(Change::write(next, &keys, count).event(HistoryEvent::Imported { count }))
    }
}
