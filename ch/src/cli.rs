//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::domain::{ClipType, Theme};

/// ClipStash - clipboard history engine
#[derive(Parser, Debug)]
#[command(
    name = "clipstash",
    about = "Bounded, deduplicating clipboard history with pinning, workspaces and templates",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a clip (reads stdin when no content is given)
    Save {
        content: Option<String>,

        /// Content type; classified automatically when omitted
        #[arg(short = 't', long = "type")]
        clip_type: Option<ClipType>,

        /// Hostname the content was copied from
        #[arg(short, long)]
        source: Option<String>,

        /// Page URL the content was copied from
        #[arg(long)]
        url: Option<String>,

        /// Page title the content was copied from
        #[arg(long)]
        title: Option<String>,
    },

    /// List clips, most recent first
    List {
        /// Workspace id, or "all"
        #[arg(short, long)]
        workspace: Option<String>,

        #[arg(short = 't', long = "type")]
        clip_type: Option<ClipType>,

        #[arg(long)]
        category: Option<String>,

        /// Only pinned clips
        #[arg(short, long)]
        pinned: bool,

        /// Source hostname
        #[arg(long)]
        source: Option<String>,

        /// Case-insensitive text search
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Earliest timestamp, Unix ms
        #[arg(long)]
        since: Option<i64>,

        /// Latest timestamp, Unix ms
        #[arg(long)]
        until: Option<i64>,
    },

    /// Toggle the pinned flag of a clip
    Pin { id: String },

    /// Replace the content of a text clip
    Edit { id: String, content: String },

    /// Set or clear (when omitted) a clip's note
    Note { id: String, note: Option<String> },

    /// Set or clear (when omitted) a clip's category
    Category { id: String, category: Option<String> },

    /// Move a clip to a workspace, or untag it when omitted
    Move { id: String, workspace: Option<String> },

    /// Join several clips into a new one
    Merge {
        #[arg(required = true, num_args = 2..)]
        ids: Vec<String>,

        #[arg(short, long, default_value = "\n")]
        separator: String,
    },

    /// Print a clip's content and count the copy
    Copy { id: String },

    /// Delete a clip
    Delete { id: String },

    /// Delete every clip
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },

    /// Show lifetime counters
    Stats,

    /// List categories in use
    Categories,

    /// Manage workspaces
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommand,
    },

    /// Manage templates
    Template {
        #[command(subcommand)]
        command: TemplateCommand,
    },

    /// Write a full export document
    Export {
        /// Output file; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace stored sections with those in an export document
    Import {
        file: PathBuf,

        /// Confirm the replacement
        #[arg(long)]
        yes: bool,
    },

    /// Show storage usage
    Storage,

    /// Serve JSON requests on stdin, one per line
    Serve,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Print current settings
    Get,

    /// Change one or more settings
    Set {
        #[arg(long)]
        max_history_size: Option<usize>,

        /// Days before unpinned clips expire (0 = never)
        #[arg(long)]
        auto_delete_days: Option<u32>,

        #[arg(long)]
        detect_sensitive: Option<bool>,

        #[arg(long)]
        show_notifications: Option<bool>,

        #[arg(long)]
        auto_paste: Option<bool>,

        #[arg(long)]
        theme: Option<Theme>,

        /// Stop recording copies from this hostname
        #[arg(long = "exclude")]
        exclude: Vec<String>,

        /// Resume recording copies from this hostname
        #[arg(long = "include")]
        include: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum WorkspaceCommand {
    /// List workspaces
    List,

    /// Create a workspace
    Create {
        name: String,

        #[arg(long, default_value = "📁")]
        icon: String,

        #[arg(long, default_value = "#6366f1")]
        color: String,
    },

    /// Delete a workspace definition
    Delete { id: String },

    /// Make a workspace active for new clips
    Use { id: String },
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List templates
    List,

    /// Create a template, or update one with --id
    Save {
        name: String,
        content: String,

        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a template
    Delete { id: String },
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use text or json", s)),
        }
    }
}
