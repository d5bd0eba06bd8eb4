//! File-backed store: one JSON object per file

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{KvError, KvStore, Result, apply_batch, usage};

/// Store persisted as a single JSON document
///
/// Writes go to a temporary sibling and are renamed into place, so a crash
/// mid-write leaves the previous document intact. An exclusive lock on
/// `<path>.lock` is held for the lifetime of the store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Value>>,
    quota: u64,
    _lock: fs::File,
}

impl FileStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>, quota: u64) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        debug!(?path, quota, "FileStore::open: called");

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let lock_path = lock_path(&path);
        let lock = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        FileExt::try_lock_exclusive(&lock).map_err(|_| KvError::Locked(lock_path.display().to_string()))?;

        let entries = if path.exists() {
            load_document(&path)?
        } else {
            debug!("FileStore::open: no existing document, starting empty");
            HashMap::new()
        };

        info!(path = %path.display(), keys = entries.len(), "Opened file store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
            quota,
            _lock: lock,
        })
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, entries: &HashMap<String, Value>) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string(entries)?;
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn load_document(path: &Path) -> Result<HashMap<String, Value>> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(KvError::Corrupt {
            path: path.display().to_string(),
            reason: format!("expected a JSON object, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<HashMap<String, Value>> {
        let entries = self.entries.lock().await;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(*k).map(|v| (k.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, items: HashMap<String, Value>) -> Result<()> {
        debug!(count = items.len(), path = %self.path.display(), "FileStore::set: called");
        let mut entries = self.entries.lock().await;
        let next = apply_batch(&entries, items, self.quota)?;
        self.write_document(&next)?;
        *entries = next;
        Ok(())
    }

    async fn bytes_in_use(&self) -> Result<u64> {
        Ok(usage(&*self.entries.lock().await))
    }

    fn quota_bytes(&self) -> u64 {
        self.quota
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_QUOTA_BYTES;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");

        {
            let store = FileStore::open(&path, DEFAULT_QUOTA_BYTES).unwrap();
            store
                .set([("history".to_string(), json!([{"id": "a"}]))].into())
                .await
                .unwrap();
        }

        let store = FileStore::open(&path, DEFAULT_QUOTA_BYTES).unwrap();
        let values = store.get(&["history"]).await.unwrap();
        assert_eq!(values["history"], json!([{"id": "a"}]));
    }

    #[tokio::test]
    async fn test_second_open_is_locked_out() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");

        let _first = FileStore::open(&path, DEFAULT_QUOTA_BYTES).unwrap();
        let second = FileStore::open(&path, DEFAULT_QUOTA_BYTES);
        assert!(matches!(second, Err(KvError::Locked(_))));
    }

    #[tokio::test]
    async fn test_quota_failure_does_not_touch_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        let store = FileStore::open(&path, 64).unwrap();

        store.set([("a".to_string(), json!(1))].into()).await.unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let result = store.set([("b".to_string(), json!("y".repeat(200)))].into()).await;
        assert!(matches!(result, Err(KvError::QuotaExceeded { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
        assert!(store.get(&["b"]).await.unwrap().is_empty());
    }

    #[test]
    fn test_non_object_document_is_corrupt() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("store.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let result = FileStore::open(&path, DEFAULT_QUOTA_BYTES);
        assert!(matches!(result, Err(KvError::Corrupt { .. })));
    }

    #[test]
    fn test_lock_path_is_sibling() {
        assert_eq!(
            lock_path(Path::new("/tmp/x/store.json")),
            PathBuf::from("/tmp/x/store.json.lock")
        );
    }
}
