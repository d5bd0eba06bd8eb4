//! Domain types for the clip history
//!
//! Everything here is plain data with serde derives; persisted documents use
//! camelCase field names.

mod clip;
mod id;
mod settings;
mod stats;
mod template;
mod workspace;

pub use clip::{Clip, ClipType, SaveRequest, Source, UNKNOWN_SOURCE};
pub use id::{generate_id, now_millis};
pub use settings::{DEFAULT_MAX_HISTORY_SIZE, Settings, Theme};
pub use stats::Stats;
pub use template::{Template, TemplateDraft};
pub use workspace::{ALL_WORKSPACES, DEFAULT_WORKSPACE_ID, Workspace, ensure_default};

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;
