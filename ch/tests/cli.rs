//! End-to-end tests for the clipstash binary

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Isolated home, config and store for one test
struct Sandbox {
    dir: TempDir,
    config: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("clipstash.yml");
        let store = dir.path().join("data").join("store.json");
        fs::write(&config, format!("store:\n  path: {}\n", store.display())).unwrap();
        Self { dir, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("clipstash").unwrap();
        cmd.current_dir(self.dir.path())
            .env("HOME", self.dir.path())
            .env("XDG_DATA_HOME", self.dir.path().join("share"))
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("NO_COLOR", "1")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().args(args).args(["--format", "json"]).output().unwrap();
        assert!(output.status.success(), "command {:?} failed: {:?}", args, output);
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[test]
fn test_save_then_list() {
    let sandbox = Sandbox::new();

    sandbox
        .cmd()
        .args(["save", "https://example.com/docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("https://example.com/docs"))
        .stdout(predicate::str::contains("url"));
}

#[test]
fn test_duplicate_save_is_promoted() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["save", "same text"]).assert().success();
    sandbox.cmd().args(["save", "other text"]).assert().success();
    sandbox
        .cmd()
        .args(["save", "same text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Already saved"));

    let response = sandbox.json(&["list"]);
    let clips = response["clips"].as_array().unwrap();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0]["content"], "same text");
}

#[test]
fn test_save_reads_stdin() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("save").write_stdin("from a pipe").assert().success();

    let response = sandbox.json(&["list", "--search", "PIPE"]);
    assert_eq!(response["clips"][0]["content"], "from a pipe");
}

#[test]
fn test_piped_content_dedups_with_argument() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["save", "hi"]).assert().success();
    sandbox
        .cmd()
        .arg("save")
        .write_stdin("hi\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Already saved"));

    let response = sandbox.json(&["list"]);
    assert_eq!(response["clips"].as_array().unwrap().len(), 1);
}

#[test]
fn test_save_records_source_details() {
    let sandbox = Sandbox::new();
    let saved = sandbox.json(&[
        "save",
        "from a page",
        "--source",
        "docs.example",
        "--url",
        "https://docs.example/a",
        "--title",
        "Docs",
        "--type",
        "code",
    ]);
    assert_eq!(saved["clip"]["type"], "code");
    assert_eq!(saved["clip"]["source"]["hostname"], "docs.example");
    assert_eq!(saved["clip"]["source"]["url"], "https://docs.example/a");
    assert_eq!(saved["clip"]["source"]["title"], "Docs");
}

#[test]
fn test_sensitive_content_is_masked() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["save", "sk-abcdefghijklmnopqrstuvwxyz0123"])
        .assert()
        .success();

    sandbox
        .cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("sk-abcdef").not());
}

#[test]
fn test_pin_and_filter() {
    let sandbox = Sandbox::new();
    let saved = sandbox.json(&["save", "keep this"]);
    let id = saved["clip"]["id"].as_str().unwrap().to_string();
    sandbox.cmd().args(["save", "not pinned"]).assert().success();

    sandbox
        .cmd()
        .args(["pin", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Pinned"));

    let response = sandbox.json(&["list", "--pinned"]);
    let clips = response["clips"].as_array().unwrap();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0]["id"], id.as_str());
}

#[test]
fn test_copy_prints_content_and_counts() {
    let sandbox = Sandbox::new();
    let saved = sandbox.json(&["save", "copy me"]);
    let id = saved["clip"]["id"].as_str().unwrap().to_string();

    sandbox
        .cmd()
        .args(["copy", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("copy me"));

    let stats = sandbox.json(&["stats"]);
    assert_eq!(stats["stats"]["totalCopiesFromHistory"], 1);
}

#[test]
fn test_merge_creates_new_clip() {
    let sandbox = Sandbox::new();
    let a = sandbox.json(&["save", "alpha"]);
    let b = sandbox.json(&["save", "beta"]);

    let merged = sandbox.json(&[
        "merge",
        a["clip"]["id"].as_str().unwrap(),
        b["clip"]["id"].as_str().unwrap(),
        "--separator",
        " + ",
    ]);
    assert_eq!(merged["type"], "Saved");
    assert_eq!(merged["clip"]["content"], "alpha + beta");
}

#[test]
fn test_delete_unknown_clip_fails() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["delete", "clip_missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NotFound"));
}

#[test]
fn test_clear_requires_confirmation() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["save", "something"]).assert().success();

    sandbox
        .cmd()
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    sandbox
        .cmd()
        .args(["clear", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 1 clips"));
}

#[test]
fn test_settings_validation() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["settings", "set", "--max-history-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidSettings"));

    let settings = sandbox.json(&["settings", "set", "--max-history-size", "3", "--exclude", "bank.example"]);
    assert_eq!(settings["settings"]["maxHistorySize"], 3);
    assert_eq!(settings["settings"]["excludedSites"][0], "bank.example");
}

#[test]
fn test_excluded_source_is_not_saved() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["settings", "set", "--exclude", "bank.example"])
        .assert()
        .success();

    sandbox
        .cmd()
        .args(["save", "account 1234", "--source", "bank.example"])
        .assert()
        .success()
        .stdout(predicate::str::contains("excluded"));

    let response = sandbox.json(&["list"]);
    assert!(response["clips"].as_array().unwrap().is_empty());
}

#[test]
fn test_default_workspace_cannot_be_deleted() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["workspace", "delete", "default"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CannotDeleteDefault"));
}

#[test]
fn test_workspace_use_tags_new_clips() {
    let sandbox = Sandbox::new();
    let created = sandbox.json(&["workspace", "create", "Work"]);
    let id = created["workspace"]["id"].as_str().unwrap().to_string();

    sandbox.cmd().args(["workspace", "use", &id]).assert().success();
    let saved = sandbox.json(&["save", "in work"]);
    assert_eq!(saved["clip"]["workspace"], id.as_str());

    let workspaces = sandbox.json(&["workspace", "list"]);
    assert_eq!(workspaces["activeWorkspace"], id.as_str());
}

#[test]
fn test_export_import_between_stores() {
    let source = Sandbox::new();
    source.cmd().args(["save", "travels"]).assert().success();
    source.cmd().args(["template", "save", "Sig", "Regards"]).assert().success();

    let export_path = source.dir.path().join("export.json");
    source
        .cmd()
        .args(["export", "--output"])
        .arg(&export_path)
        .assert()
        .success();

    let target = Sandbox::new();
    target
        .cmd()
        .arg("import")
        .arg(&export_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    target
        .cmd()
        .arg("import")
        .arg(&export_path)
        .arg("--yes")
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 clips"));

    let templates = target.json(&["template", "list"]);
    assert_eq!(templates["templates"][0]["name"], "Sig");
}

#[test]
fn test_serve_answers_each_line() {
    let sandbox = Sandbox::new();
    let input = concat!(
        r#"{"type":"Save","data":{"content":"served"}}"#,
        "\n",
        "\n",
        r#"{"type":"Query"}"#,
        "\n",
        "not json\n",
        r#"{"type":"TogglePin","id":"clip_missing"}"#,
        "\n",
    );

    let output = sandbox.cmd().arg("serve").write_stdin(input).output().unwrap();
    assert!(output.status.success());

    let responses: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0]["type"], "Saved");
    assert_eq!(responses[1]["clips"][0]["content"], "served");
    assert_eq!(responses[2]["kind"], "InvalidRequest");
    assert_eq!(responses[3]["kind"], "NotFound");
}

#[test]
fn test_storage_report() {
    let sandbox = Sandbox::new();
    sandbox.cmd().args(["save", "a"]).assert().success();

    let response = sandbox.json(&["storage"]);
    assert_eq!(response["usage"]["quotaBytes"], 5 * 1024 * 1024);
    assert_eq!(response["usage"]["nearFull"], false);
}
