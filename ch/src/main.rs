//! ClipStash - clipboard history engine
//!
//! CLI entry point: one-shot commands against the local store, or `serve`
//! for a line-delimited JSON session.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, bail, eyre};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use cliphistory::cli::{Cli, Command, OutputFormat, SettingsCommand, TemplateCommand, WorkspaceCommand};
use cliphistory::config::{self, Config};
use cliphistory::domain::{Clip, ClipType, SaveRequest, Source, TemplateDraft, UNKNOWN_SOURCE};
use cliphistory::history::HistoryFilter;
use cliphistory::protocol::{Request, Response, dispatch};
use cliphistory::state::HistoryManager;
use kvstore::FileStore;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Logging isn't initialized yet, so nothing can be traced here
    let log_dir = config::log_dir();
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("clipstash.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Log level comes from config, so peek at it before the full load
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(store = %config.store.path.display(), "ClipStash loaded config");

    let store = FileStore::open(&config.store.path, config.store.quota_bytes)
        .context(format!("Failed to open store at {}", config.store.path.display()))?;
    debug!(path = %store.path().display(), "main: store opened");
    let manager = HistoryManager::spawn(Arc::new(store), config.manager_options())
        .await
        .context("Failed to load history")?;

    debug!(command = ?cli.command, "main: dispatching command");
    let result = run(&manager, cli.command, cli.format).await;

    if let Err(e) = manager.shutdown().await {
        debug!(error = %e, "main: manager already stopped");
    }
    result
}

async fn run(manager: &HistoryManager, command: Command, format: OutputFormat) -> Result<()> {
    match command {
        Command::Save {
            content,
            clip_type,
            source,
            url,
            title,
        } => {
            debug!(?clip_type, ?source, "run: matched Save command");
            let content = match content {
                Some(content) => content,
                None => read_stdin().await?,
            };
            let mut request = SaveRequest::text(content);
            if let Some(clip_type) = clip_type {
                request = request.with_type(clip_type);
            }
            if source.is_some() || url.is_some() || title.is_some() {
                let mut src = Source::hostname(source.unwrap_or_else(|| UNKNOWN_SOURCE.to_string()));
                if let Some(url) = url {
                    src = src.with_url(url);
                }
                if let Some(title) = title {
                    src = src.with_title(title);
                }
                request = request.with_source(src);
            }
            execute(manager, Request::Save { data: request }, format).await
        }
        Command::List {
            workspace,
            clip_type,
            category,
            pinned,
            source,
            search,
            since,
            until,
        } => {
            debug!(?workspace, ?search, "run: matched List command");
            let filters = HistoryFilter {
                workspace,
                clip_type,
                category,
                pinned: pinned.then_some(true),
                source,
                search,
                start_date: since,
                end_date: until,
            };
            execute(manager, Request::Query { filters }, format).await
        }
        Command::Pin { id } => execute(manager, Request::TogglePin { id }, format).await,
        Command::Edit { id, content } => execute(manager, Request::EditClip { id, content }, format).await,
        Command::Note { id, note } => execute(manager, Request::SetNote { id, note }, format).await,
        Command::Category { id, category } => execute(manager, Request::SetCategory { id, category }, format).await,
        Command::Move { id, workspace } => execute(manager, Request::SetWorkspace { id, workspace }, format).await,
        Command::Merge { ids, separator } => execute(manager, Request::MergeClips { ids, separator }, format).await,
        Command::Copy { id } => cmd_copy(manager, id, format).await,
        Command::Delete { id } => execute(manager, Request::Delete { id }, format).await,
        Command::Clear { yes } => {
            if !yes {
                bail!("Refusing to delete every clip without --yes");
            }
            execute(manager, Request::ClearAll, format).await
        }
        Command::Settings { command } => cmd_settings(manager, command, format).await,
        Command::Stats => execute(manager, Request::GetStats, format).await,
        Command::Categories => execute(manager, Request::GetCategories, format).await,
        Command::Workspace { command } => {
            let request = match command {
                WorkspaceCommand::List => Request::GetWorkspaces,
                WorkspaceCommand::Create { name, icon, color } => Request::CreateWorkspace { name, icon, color },
                WorkspaceCommand::Delete { id } => Request::DeleteWorkspace { id },
                WorkspaceCommand::Use { id } => Request::SetActiveWorkspace { id },
            };
            execute(manager, request, format).await
        }
        Command::Template { command } => {
            let request = match command {
                TemplateCommand::List => Request::GetTemplates,
                TemplateCommand::Save { name, content, id } => Request::SaveTemplate {
                    template: TemplateDraft { id, name, content },
                },
                TemplateCommand::Delete { id } => Request::DeleteTemplate { id },
            };
            execute(manager, request, format).await
        }
        Command::Export { output } => cmd_export(manager, output.as_deref()).await,
        Command::Import { file, yes } => cmd_import(manager, &file, yes, format).await,
        Command::Storage => execute(manager, Request::CheckStorage, format).await,
        Command::Serve => cmd_serve(manager).await,
    }
}

/// Dispatch one request and print the response
async fn execute(manager: &HistoryManager, request: Request, format: OutputFormat) -> Result<()> {
    let response = checked(dispatch(manager, request).await)?;
    print_response(&response, format)
}

/// Turn an error response into an error
fn checked(response: Response) -> Result<Response> {
    match response {
        Response::Error { kind, message } => Err(eyre!("{} ({})", message, kind)),
        other => Ok(other),
    }
}

async fn read_stdin() -> Result<String> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("Failed to read stdin")?;
    Ok(strip_trailing_newline(content))
}

/// Drop the single line ending that `echo` and most pipes append
fn strip_trailing_newline(mut content: String) -> String {
    if content.ends_with('\n') {
        content.pop();
        if content.ends_with('\r') {
            content.pop();
        }
    }
    content
}

async fn cmd_copy(manager: &HistoryManager, id: String, format: OutputFormat) -> Result<()> {
    debug!(%id, "cmd_copy: called");
    let clip = manager
        .get_clip(&id)
        .ok_or_else(|| eyre!("Not found: Clip {} (NotFound)", id))?;
    let response = checked(dispatch(manager, Request::IncrementCopyCount { id }).await)?;
    match format {
        OutputFormat::Json => print_response(&response, format),
        OutputFormat::Text => {
            println!("{}", clip.content);
            Ok(())
        }
    }
}

async fn cmd_settings(manager: &HistoryManager, command: SettingsCommand, format: OutputFormat) -> Result<()> {
    match command {
        SettingsCommand::Get => execute(manager, Request::GetSettings, format).await,
        SettingsCommand::Set {
            max_history_size,
            auto_delete_days,
            detect_sensitive,
            show_notifications,
            auto_paste,
            theme,
            exclude,
            include,
        } => {
            debug!(?max_history_size, ?auto_delete_days, "cmd_settings: Set");
            let mut settings = manager.get_settings();
            if let Some(v) = max_history_size {
                settings.max_history_size = v;
            }
            if let Some(v) = auto_delete_days {
                settings.auto_delete_days = v;
            }
            if let Some(v) = detect_sensitive {
                settings.detect_sensitive = v;
            }
            if let Some(v) = show_notifications {
                settings.show_notifications = v;
            }
            if let Some(v) = auto_paste {
                settings.auto_paste = v;
            }
            if let Some(v) = theme {
                settings.theme = v;
            }
            settings.excluded_sites.extend(exclude);
            for host in include {
                settings.excluded_sites.remove(&host);
            }
            execute(manager, Request::SaveSettings { settings }, format).await
        }
    }
}

async fn cmd_export(manager: &HistoryManager, output: Option<&Path>) -> Result<()> {
    debug!(?output, "cmd_export: called");
    let Response::Export { data } = checked(dispatch(manager, Request::ExportData).await)? else {
        bail!("Unexpected response to export");
    };
    let json = serde_json::to_string_pretty(&data)?;
    match output {
        Some(path) => {
            fs::write(path, json).context(format!("Failed to write {}", path.display()))?;
            println!(
                "{} Exported {} clips to {}",
                "✓".green(),
                data.history.len(),
                path.display().to_string().cyan()
            );
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_import(manager: &HistoryManager, file: &Path, yes: bool, format: OutputFormat) -> Result<()> {
    debug!(?file, yes, "cmd_import: called");
    let content = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let data: serde_json::Value = serde_json::from_str(&content).context("Import file is not valid JSON")?;

    if !yes {
        let sections: Vec<&str> = ["history", "settings", "stats", "templates", "workspaces"]
            .into_iter()
            .filter(|key| data.get(*key).is_some_and(|v| !v.is_null()))
            .collect();
        bail!(
            "Import replaces these stored sections: {}. Re-run with --yes to continue",
            sections.join(", ")
        );
    }
    execute(manager, Request::ImportData { data }, format).await
}

/// Answer one JSON request per input line until stdin closes
async fn cmd_serve(manager: &HistoryManager) -> Result<()> {
    info!("Serving requests on stdin");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => dispatch(manager, request).await,
            Err(e) => {
                debug!(error = %e, "cmd_serve: malformed request");
                Response::Error {
                    kind: "InvalidRequest".to_string(),
                    message: e.to_string(),
                }
            }
        };
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    info!("Request stream closed");
    Ok(())
}

/// One-line preview of a clip's content
fn preview(clip: &Clip) -> String {
    if clip.is_image() {
        return format!("[image {}]", clip.mime_type.as_deref().unwrap_or("unknown"));
    }
    if clip.is_sensitive {
        return "••••••••".to_string();
    }
    let line = clip.content.lines().next().unwrap_or_default();
    let mut short: String = line.chars().take(60).collect();
    if short.len() < line.len() || clip.content.lines().nth(1).is_some() {
        short.push('…');
    }
    short
}

fn type_label(clip_type: ClipType) -> ColoredString {
    let label = format!("{:<5}", clip_type.as_str());
    match clip_type {
        ClipType::Url | ClipType::Email | ClipType::Phone => label.blue(),
        ClipType::Code => label.magenta(),
        ClipType::Image | ClipType::Richtext => label.cyan(),
        ClipType::Text => label.normal(),
    }
}

fn print_response(response: &Response, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(response)?);
        return Ok(());
    }

    match response {
        Response::Saved { clip } => println!("{} Saved {} ({})", "✓".green(), clip.id.cyan(), clip.clip_type),
        Response::Duplicate { clip, .. } => {
            println!("{} Already saved, moved to top: {}", "↑".yellow(), clip.id.cyan())
        }
        Response::Excluded { .. } => println!("{}", "Source is excluded; nothing saved".dimmed()),
        Response::Clips { clips } => {
            if clips.is_empty() {
                println!("No clips found");
            }
            for clip in clips {
                let pin = if clip.pinned { "*".yellow() } else { " ".normal() };
                println!("{} {} {} {}", pin, clip.id.yellow(), type_label(clip.clip_type), preview(clip));
            }
        }
        Response::Clip { clip } => println!("{} Updated {}", "✓".green(), clip.id.cyan()),
        Response::Ok => println!("{} Done", "✓".green()),
        Response::Pinned { pinned } => {
            println!("{} {}", "✓".green(), if *pinned { "Pinned" } else { "Unpinned" })
        }
        Response::CopyCount { copy_count } => println!("Copied {} times", copy_count),
        Response::Cleared { count } => println!("{} Cleared {} clips", "✓".green(), count),
        Response::Settings { settings } => println!("{}", serde_yaml::to_string(settings)?.trim_end()),
        Response::Stats { stats } => {
            println!("Clips saved:        {}", stats.total_clips_saved);
            println!("Images saved:       {}", stats.total_images_saved);
            println!("Copies from history: {}", stats.total_copies_from_history);
        }
        Response::Categories { categories } => {
            if categories.is_empty() {
                println!("No categories");
            }
            for category in categories {
                println!("{}", category);
            }
        }
        Response::Workspaces {
            workspaces,
            active_workspace,
        } => {
            for ws in workspaces {
                let marker = if &ws.id == active_workspace { "*".green() } else { " ".normal() };
                println!("{} {} {} {}", marker, ws.icon, ws.id.yellow(), ws.name);
            }
        }
        Response::Workspace { workspace } => println!(
            "{} Created workspace {} ({})",
            "✓".green(),
            workspace.id.cyan(),
            workspace.name
        ),
        Response::Templates { templates } => {
            if templates.is_empty() {
                println!("No templates");
            }
            for tpl in templates {
                println!("{} {}", tpl.id.yellow(), tpl.name);
            }
        }
        Response::Template { template } => println!("{} Saved template {}", "✓".green(), template.id.cyan()),
        Response::Export { data } => println!("{}", serde_json::to_string_pretty(data)?),
        Response::Imported { imported_count } => println!("{} Imported {} clips", "✓".green(), imported_count),
        Response::Storage { usage } => {
            let line = format!(
                "{} of {} bytes used ({:.1}%)",
                usage.bytes_in_use, usage.quota_bytes, usage.percent_used
            );
            if usage.near_full {
                println!("{} {}", line.red(), "storage is nearly full".red().bold());
            } else {
                println!("{}", line);
            }
        }
        Response::Error { kind, message } => bail!("{} ({})", message, kind),
    }
    Ok(())
}
