//! ClipStash configuration types and loading

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::{DEFAULT_QUEUE_CAPACITY, ManagerOptions};

const APP_NAME: &str = "clipstash";

/// Main ClipStash configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Persistent store configuration
    pub store: StoreConfig,

    /// Bound of the mutation queue
    #[serde(rename = "queue-capacity")]
    pub queue_capacity: usize,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            log_level: None,
        }
    }
}

/// Store location and capacity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON document holding all persisted sections
    pub path: PathBuf,

    /// Capacity ceiling in bytes
    #[serde(rename = "quota-bytes")]
    pub quota_bytes: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            quota_bytes: kvstore::DEFAULT_QUOTA_BYTES,
        }
    }
}

fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("store.json")
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, it must load
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for candidate in Self::candidates() {
            if candidate.exists() {
                match Self::load_from_file(&candidate) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", candidate.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; `load` reports them once logging works.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::candidates().into_iter().find(|p| p.exists())?,
        };
        Self::load_from_file(&path).ok()?.log_level
    }

    /// Options for the history manager
    pub fn manager_options(&self) -> ManagerOptions {
        ManagerOptions {
            queue_capacity: self.queue_capacity,
        }
    }

    /// Project-local config first, then user config
    fn candidates() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(format!(".{}.yml", APP_NAME))];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(APP_NAME).join(format!("{}.yml", APP_NAME)));
        }
        paths
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Directory that receives the log file
pub fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("logs")
}
