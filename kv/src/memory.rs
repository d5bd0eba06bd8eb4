//! In-memory backend

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{DEFAULT_QUOTA_BYTES, KvStore, Result, apply_batch, usage};

/// Process-local store; contents are lost when dropped
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    quota: u64,
}

impl MemoryStore {
    /// Create an empty store with the default quota
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    /// Create an empty store with a custom quota
    pub fn with_quota(quota: u64) -> Self {
        debug!(quota, "MemoryStore::with_quota: called");
        Self {
            entries: RwLock::new(HashMap::new()),
            quota,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.read().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        debug!(count = items.len(), "MemoryStore::set: called");
        let mut entries = self.entries.write().await;
        *entries = apply_batch(&entries, items, self.quota)?;
        Ok(())
    }

    async fn bytes_in_use(&self) -> Result<u64> {
        Ok(usage(&*self.entries.read().await))
    }

    fn quota_bytes(&self) -> u64 {
        self.quota
    }
}
