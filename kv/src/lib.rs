//! KvStore - async JSON key-value storage with a byte quota
//!
//! A small durable mapping of string keys to JSON values, shaped after the
//! browser extension `storage.local` area: batched `get`, batched `set`, and
//! a `bytes_in_use` gauge measured against a fixed quota.
//!
//! # Backends
//!
//! - [`MemoryStore`] - process-local, used by tests and ephemeral sessions
//! - [`FileStore`] - a single JSON document on disk, written atomically and
//!   guarded by an exclusive lock file so only one process owns it
//!
//! # Example
//!
//! ```ignore
//! use kvstore::{FileStore, KvStore};
//!
//! let store = FileStore::open("clips.json", kvstore::DEFAULT_QUOTA_BYTES)?;
//! store.set([("history".to_string(), serde_json::json!([]))].into()).await?;
//! let values = store.get(&["history"]).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Default capacity ceiling (5MB, the `storage.local` quota)
pub const DEFAULT_QUOTA_BYTES: u64 = 5 * 1024 * 1024;

/// Errors from key-value store operations
#[derive(Debug, Error)]
pub enum KvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Quota exceeded: write needs {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: u64, quota: u64 },

    #[error("Store is locked by another process: {0}")]
    Locked(String),

    #[error("Corrupt store file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, KvError>;

/// Durable mapping of keys to JSON values
///
/// `set` is all-or-nothing: either every entry of the batch is stored or
/// none is.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the given keys; missing keys are absent from the result
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>>;

    /// Store every entry of the batch, replacing existing values
    async fn set(&self, items: HashMap<String, Value>) -> Result<()>;

    /// Bytes currently used by all stored entries
    async fn bytes_in_use(&self) -> Result<u64>;

    /// Capacity ceiling in bytes
    fn quota_bytes(&self) -> u64;
}

/// Size of one entry as accounted against the quota: key plus serialized value
pub fn entry_size(key: &str, value: &Value) -> u64 {
    let value_len = serde_json::to_string(value).map(|s| s.len()).unwrap_or(0);
    (key.len() + value_len) as u64
}

/// Total accounted size of a map of entries
pub fn usage(entries: &HashMap<String, Value>) -> u64 {
    entries.iter().map(|(k, v)| entry_size(k, v)).sum()
}

/// Merge a batch into a copy of `current` and check it against the quota
pub(crate) fn apply_batch(
    current: &HashMap<String, Value>,
    items: HashMap<String, Value>,
    quota: u64,
) -> Result<HashMap<String, Value>> {
    let mut next = current.clone();
    next.extend(items);
    let needed = usage(&next);
    if needed > quota {
        return Err(KvError::QuotaExceeded { needed, quota });
    }
    Ok(next)
}
