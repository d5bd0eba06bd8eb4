//! History manager messages
//!
//! Commands, events, and errors for the actor pattern.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::domain::{Clip, ClipType, SaveRequest, Settings, Template, TemplateDraft, Workspace};
use crate::transfer::ImportDocument;

/// Errors from history operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Clip content is empty")]
    EmptyContent,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("The default workspace cannot be deleted")]
    CannotDeleteDefault,

    #[error("Merging needs at least 2 text clips, found {found}")]
    InsufficientClips { found: usize },

    #[error("Storage error: {0}")]
    Io(String),

    #[error("Invalid import document: {0}")]
    InvalidImport(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Cannot edit {0} clips")]
    UnsupportedClipType(ClipType),

    #[error("Channel error")]
    ChannelError,
}

impl HistoryError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            HistoryError::EmptyContent => "EmptyContent",
            HistoryError::NotFound(_) => "NotFound",
            HistoryError::CannotDeleteDefault => "CannotDeleteDefault",
            HistoryError::InsufficientClips { .. } => "InsufficientClips",
            HistoryError::Io(_) => "IOError",
            HistoryError::InvalidImport(_) => "InvalidImport",
            HistoryError::InvalidSettings(_) => "InvalidSettings",
            HistoryError::UnsupportedClipType(_) => "UnsupportedClipType",
            HistoryError::ChannelError => "ChannelError",
        }
    }
}

impl From<kvstore::KvError> for HistoryError {
    fn from(e: kvstore::KvError) -> Self {
        HistoryError::Io(e.to_string())
    }
}

/// Response from history operations
pub type HistoryResponse<T> = Result<T, HistoryError>;

/// Result of a save request
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// A new clip was created
    Saved(Clip),
    /// Identical content already existed and was promoted to the head
    Duplicate(Clip),
    /// The source hostname is excluded; nothing changed
    Excluded,
}

impl SaveOutcome {
    pub fn clip(&self) -> Option<&Clip> {
        match self {
            SaveOutcome::Saved(clip) | SaveOutcome::Duplicate(clip) => Some(clip),
            SaveOutcome::Excluded => None,
        }
    }
}

/// Broadcast when committed state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum HistoryEvent {
    ClipSaved { id: String },
    ClipPromoted { id: String },
    ClipsEvicted { count: usize },
    ClipRemoved { id: String },
    HistoryCleared { count: usize },
    Imported { count: usize },
    StorageNearFull { bytes_in_use: u64, quota_bytes: u64 },
}

/// Mutating commands sent to the HistoryManager actor
///
/// Reads never go through the queue; they use the published snapshot.
#[derive(Debug)]
pub enum HistoryCommand {
    // Clip operations
    Save {
        request: SaveRequest,
        reply: oneshot::Sender<HistoryResponse<SaveOutcome>>,
    },
    TogglePin {
        id: String,
        reply: oneshot::Sender<HistoryResponse<bool>>,
    },
    EditClip {
        id: String,
        content: String,
        reply: oneshot::Sender<HistoryResponse<Clip>>,
    },
    SetNote {
        id: String,
        note: Option<String>,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },
    SetCategory {
        id: String,
        category: Option<String>,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },
    SetWorkspace {
        id: String,
        workspace: Option<String>,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },
    MergeClips {
        ids: Vec<String>,
        separator: String,
        reply: oneshot::Sender<HistoryResponse<SaveOutcome>>,
    },
    IncrementCopyCount {
        id: String,
        reply: oneshot::Sender<HistoryResponse<u64>>,
    },
    DeleteClip {
        id: String,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },
    ClearHistory {
        reply: oneshot::Sender<HistoryResponse<usize>>,
    },

    // Settings
    SaveSettings {
        settings: Settings,
        reply: oneshot::Sender<HistoryResponse<Settings>>,
    },

    // Workspaces
    SetActiveWorkspace {
        id: String,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },
    CreateWorkspace {
        name: String,
        icon: String,
        color: String,
        reply: oneshot::Sender<HistoryResponse<Workspace>>,
    },
    DeleteWorkspace {
        id: String,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },

    // Templates
    SaveTemplate {
        draft: TemplateDraft,
        reply: oneshot::Sender<HistoryResponse<Template>>,
    },
    DeleteTemplate {
        id: String,
        reply: oneshot::Sender<HistoryResponse<()>>,
    },

    // Import
    Import {
        document: ImportDocument,
        reply: oneshot::Sender<HistoryResponse<usize>>,
    },

    // Shutdown
    Shutdown,
}
