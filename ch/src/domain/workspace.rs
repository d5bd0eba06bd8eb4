//! Named partitions for organizing clips

use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Id of the seeded workspace that can never be deleted
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Workspace filter value that disables workspace filtering
pub const ALL_WORKSPACES: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub color: String,
}

impl Workspace {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: generate_id("ws"),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
        }
    }

    /// The seeded `default` workspace
    pub fn seed() -> Self {
        Self {
            id: DEFAULT_WORKSPACE_ID.to_string(),
            name: "Default".to_string(),
            icon: "📋".to_string(),
            color: "#6366f1".to_string(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_WORKSPACE_ID
    }
}

/// Prepend the seed workspace if the list lacks it; returns true if changed
pub fn ensure_default(workspaces: &mut Vec<Workspace>) -> bool {
    if workspaces.iter().any(Workspace::is_default) {
        return false;
    }
    workspaces.insert(0, Workspace::seed());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_default_prepends_seed_once() {
        let mut list = vec![Workspace::new("Work", "💼", "#000000")];
        assert!(ensure_default(&mut list));
        assert!(!ensure_default(&mut list));
        assert_eq!(list.len(), 2);
        assert!(list[0].is_default());
    }

    #[test]
    fn test_new_workspace_gets_fresh_id() {
        let a = Workspace::new("A", "", "");
        let b = Workspace::new("A", "", "");
        assert_ne!(a.id, b.id);
        assert!(!a.is_default());
    }
}
