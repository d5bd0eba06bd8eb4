//! Reusable text snippets, independent of history

use serde::{Deserialize, Serialize};

use super::id::generate_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub content: String,
}

impl Template {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: generate_id("tpl"),
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Input to `save_template`: no id creates, an id updates that template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDraft {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub content: String,
}
