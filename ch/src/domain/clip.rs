//! Clip records and save requests

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Hostname recorded when the capture layer supplies no source
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Kind of clipboard content
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipType {
    #[default]
    Text,
    Url,
    Email,
    Phone,
    Code,
    Image,
    Richtext,
}

impl ClipType {
    /// Whether the content is plain text that can be classified and searched
    pub fn is_text_like(self) -> bool {
        !matches!(self, ClipType::Image)
    }

    /// Whether the content may be edited in place (image and rich media may not)
    pub fn is_editable(self) -> bool {
        !matches!(self, ClipType::Image | ClipType::Richtext)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ClipType::Text => "text",
            ClipType::Url => "url",
            ClipType::Email => "email",
            ClipType::Phone => "phone",
            ClipType::Code => "code",
            ClipType::Image => "image",
            ClipType::Richtext => "richtext",
        }
    }
}

impl fmt::Display for ClipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ClipType::Text),
            "url" => Ok(ClipType::Url),
            "email" => Ok(ClipType::Email),
            "phone" => Ok(ClipType::Phone),
            "code" => Ok(ClipType::Code),
            "image" => Ok(ClipType::Image),
            "richtext" => Ok(ClipType::Richtext),
            other => Err(format!("Unknown clip type: '{}'", other)),
        }
    }
}

/// Where a clip was copied from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "SourceRepr")]
pub struct Source {
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Source {
    pub fn hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            url: None,
            title: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

impl Default for Source {
    fn default() -> Self {
        Self::hostname(UNKNOWN_SOURCE)
    }
}

/// Accepted shapes of a stored source: older records hold a bare string
#[derive(Deserialize)]
#[serde(untagged)]
enum SourceRepr {
    Legacy(String),
    Full {
        #[serde(default = "unknown_hostname")]
        hostname: String,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },
}

fn unknown_hostname() -> String {
    UNKNOWN_SOURCE.to_string()
}

impl From<SourceRepr> for Source {
    fn from(repr: SourceRepr) -> Self {
        match repr {
            SourceRepr::Legacy(hostname) => Self::hostname(hostname),
            SourceRepr::Full { hostname, url, title } => Self { hostname, url, title },
        }
    }
}

/// One stored clipboard capture with its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    /// Text content, or a data URL for image clips
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(rename = "type", default)]
    pub clip_type: ClipType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Last touch (create or dedup-promote), Unix ms
    pub timestamp: i64,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub category: Option<String>,
    /// Absent on records that predate workspaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub copy_count: u64,
    #[serde(default)]
    pub is_sensitive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<i64>,
}

impl Clip {
    /// Create a fresh, unpinned clip with a new id
    pub fn new(content: impl Into<String>, clip_type: ClipType, source: Source, workspace: &str, now: i64) -> Self {
        Self {
            id: generate_id("clip"),
            content: content.into(),
            html: None,
            clip_type,
            mime_type: None,
            timestamp: now,
            source,
            pinned: false,
            category: None,
            workspace: Some(workspace.to_string()),
            note: None,
            copy_count: 0,
            is_sensitive: false,
            edited_at: None,
        }
    }

    pub fn is_image(&self) -> bool {
        self.clip_type == ClipType::Image
    }
}

/// A capture handed to `save` by the capture layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    /// Classified by the engine when absent
    #[serde(rename = "type", default)]
    pub clip_type: Option<ClipType>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
}

impl SaveRequest {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn image(data_url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            content: Some(data_url.into()),
            clip_type: Some(ClipType::Image),
            mime_type: Some(mime_type.into()),
            ..Default::default()
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_type(mut self, clip_type: ClipType) -> Self {
        self.clip_type = Some(clip_type);
        self
    }
}
