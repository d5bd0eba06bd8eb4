//! User-facing engine settings

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::workspace::DEFAULT_WORKSPACE_ID;

/// Default cap on unpinned clips
pub const DEFAULT_MAX_HISTORY_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    System,
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(Theme::System),
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}. Use system, light or dark", s)),
        }
    }
}

/// Engine settings
///
/// Missing fields in a stored document take their defaults, so older
/// documents load without migration code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Maximum number of unpinned clips kept (at least 1)
    pub max_history_size: usize,
    /// Age in days after which unpinned clips are dropped on save (0 = never)
    pub auto_delete_days: u32,
    /// Hostnames whose copies are never recorded
    pub excluded_sites: BTreeSet<String>,
    pub detect_sensitive: bool,
    pub show_notifications: bool,
    pub theme: Theme,
    pub auto_paste: bool,
    pub default_workspace: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_history_size: DEFAULT_MAX_HISTORY_SIZE,
            auto_delete_days: 0,
            excluded_sites: BTreeSet::new(),
            detect_sensitive: true,
            show_notifications: true,
            theme: Theme::System,
            auto_paste: false,
            default_workspace: DEFAULT_WORKSPACE_ID.to_string(),
        }
    }
}

impl Settings {
    /// Check value ranges
    pub fn validate(&self) -> Result<(), String> {
        if self.max_history_size < 1 {
            return Err("maxHistorySize must be at least 1".to_string());
        }
        if self.default_workspace.trim().is_empty() {
            return Err("defaultWorkspace must not be empty".to_string());
        }
        Ok(())
    }

    pub fn is_excluded(&self, hostname: &str) -> bool {
        self.excluded_sites.contains(hostname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.max_history_size, 100);
        assert_eq!(settings.auto_delete_days, 0);
        assert!(settings.detect_sensitive);
        assert_eq!(settings.theme, Theme::System);
        assert_eq!(settings.default_workspace, "default");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_document_merges_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"maxHistorySize": 5, "excludedSites": ["bank.example"]}"#).unwrap();
        assert_eq!(settings.max_history_size, 5);
        assert!(settings.is_excluded("bank.example"));
        assert!(settings.show_notifications);
    }

    #[test]
    fn test_zero_history_size_is_invalid() {
        let settings = Settings {
            max_history_size: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
