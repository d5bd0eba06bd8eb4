//! Typed access to the key-value store
//!
//! Loads every section once at startup (filling defaults and repairing older
//! documents), writes changed sections back in a single batch, and reports
//! usage against the store quota.

use std::collections::HashMap;
use std::sync::Arc;

use kvstore::KvStore;
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{DEFAULT_WORKSPACE_ID, ensure_default};
use crate::state::{EngineState, HistoryError, StoreKey};

/// Fraction of the quota above which storage counts as nearly full
pub const NEAR_FULL_RATIO: f64 = 0.8;

/// Storage usage report
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageUsage {
    pub bytes_in_use: u64,
    pub quota_bytes: u64,
    /// 0-100
    pub percent_used: f64,
    pub near_full: bool,
}

impl StorageUsage {
    pub fn new(bytes_in_use: u64, quota_bytes: u64) -> Self {
        let ratio = if quota_bytes == 0 {
            1.0
        } else {
            bytes_in_use as f64 / quota_bytes as f64
        };
        Self {
            bytes_in_use,
            quota_bytes,
            percent_used: (ratio * 1000.0).round() / 10.0,
            near_full: ratio > NEAR_FULL_RATIO,
        }
    }
}

/// Adapter between [`EngineState`] and a [`KvStore`]
pub struct StoreAdapter {
    store: Arc<dyn KvStore>,
}

fn decode<T: DeserializeOwned + Default>(values: &mut HashMap<String, Value>, key: StoreKey) -> Result<T, HistoryError> {
    match values.remove(key.as_str()) {
        None | Some(Value::Null) => Ok(T::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| HistoryError::Io(format!("stored '{}' is malformed: {}", key.as_str(), e))),
    }
}

fn encode<T: Serialize>(key: StoreKey, value: &T) -> Result<Value, HistoryError> {
    serde_json::to_value(value).map_err(|e| HistoryError::Io(format!("cannot encode '{}': {}", key.as_str(), e)))
}

impl StoreAdapter {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Read every section, filling defaults and repairing older documents
    ///
    /// Nothing is written back; repaired values are persisted the next time
    /// their section changes.
    pub async fn load(&self) -> Result<EngineState, HistoryError> {
        debug!("load: called");
        let keys: Vec<&str> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        let mut values = self.store.get(&keys).await?;
        debug!(present = values.len(), "load: fetched sections");

        let mut state = EngineState {
            history: decode(&mut values, StoreKey::History)?,
            settings: decode(&mut values, StoreKey::Settings)?,
            stats: decode(&mut values, StoreKey::Stats)?,
            templates: decode(&mut values, StoreKey::Templates)?,
            workspaces: decode(&mut values, StoreKey::Workspaces)?,
            active_workspace: decode::<Option<String>>(&mut values, StoreKey::ActiveWorkspace)?
                .unwrap_or_else(|| DEFAULT_WORKSPACE_ID.to_string()),
        };

        if ensure_default(&mut state.workspaces) {
            debug!("load: seeded default workspace");
        }
        if state.settings.max_history_size < 1 {
            warn!("Stored maxHistorySize was 0, clamping to 1");
            state.settings.max_history_size = 1;
        }
        if !state.has_workspace(&state.active_workspace) {
            warn!(active = %state.active_workspace, "Active workspace no longer exists, using default");
            state.active_workspace = DEFAULT_WORKSPACE_ID.to_string();
        }

        info!(
            clips = state.history.len(),
            templates = state.templates.len(),
            workspaces = state.workspaces.len(),
            "Loaded history state"
        );
        Ok(state)
    }

    /// Write the given sections of `state` in one batch
    pub async fn persist(&self, state: &EngineState, keys: &[StoreKey]) -> Result<(), HistoryError> {
        debug!(?keys, "persist: called");
        if keys.is_empty() {
            return Ok(());
        }
        let mut items = HashMap::with_capacity(keys.len());
        for key in keys {
            let value = match key {
                StoreKey::History => encode(*key, &state.history)?,
                StoreKey::Settings => encode(*key, &state.settings)?,
                StoreKey::Stats => encode(*key, &state.stats)?,
                StoreKey::Templates => encode(*key, &state.templates)?,
                StoreKey::Workspaces => encode(*key, &state.workspaces)?,
                StoreKey::ActiveWorkspace => encode(*key, &state.active_workspace)?,
            };
            items.insert(key.as_str().to_string(), value);
        }
        self.store.set(items).await?;
        Ok(())
    }

    /// Current usage against the store quota
    pub async fn usage(&self) -> Result<StorageUsage, HistoryError> {
        let bytes_in_use = self.store.bytes_in_use().await?;
        Ok(StorageUsage::new(bytes_in_use, self.store.quota_bytes()))
    }
}
