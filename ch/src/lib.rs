//! ClipStash - clipboard history engine
//!
//! A bounded, deduplicating store of clipboard captures. New clips are
//! classified and checked for secrets, identical content is promoted rather
//! than duplicated, and unpinned clips are evicted by count and age. Clips
//! can be pinned, annotated, merged and grouped into workspaces; reusable
//! snippets live alongside as templates.
//!
//! # Core Concepts
//!
//! - **Single writer**: one actor task applies mutations in order
//! - **Snapshot reads**: queries read the last committed state without waiting
//! - **All-or-nothing writes**: each mutation issues at most one store write
//!
//! # Modules
//!
//! - [`classify`] - Content type detection and secret patterns
//! - [`domain`] - Clips, settings, stats, templates, workspaces
//! - [`history`] - Ordered clip list, filters and eviction
//! - [`state`] - HistoryManager actor and state transitions
//! - [`storage`] - Typed load/persist over a [`kvstore::KvStore`]
//! - [`transfer`] - Export and import documents
//! - [`protocol`] - Tagged request/response contract
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod classify;
pub mod cli;
pub mod config;
pub mod domain;
pub mod history;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod transfer;

pub use domain::{Clip, ClipType, SaveRequest, Settings, Source};
pub use history::HistoryFilter;
pub use protocol::{Request, Response, dispatch};
pub use state::{HistoryError, HistoryEvent, HistoryManager, ManagerOptions, SaveOutcome};
