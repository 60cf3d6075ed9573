use std::fs;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use promptsync::config::PromptSyncConfig;
use promptsync::remote::MemoryContentStore;
use promptsync::store::{FileStateStore, StateStore};
use promptsync::tooling::cli::{Cli, CliContext, Commands};
use tempfile::TempDir;

use crate::support::library;

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["promptsync", "publish"],
        vec!["promptsync", "publish", "--yes"],
        vec!["promptsync", "pull", "-y"],
        vec!["promptsync", "import", "backup.json"],
        vec!["promptsync", "import", "backup.json", "--replace-prompts"],
        vec!["promptsync", "export", "out.json"],
        vec!["promptsync", "status", "--format", "json"],
        vec!["promptsync", "tree"],
        vec!["promptsync", "--state", "/tmp/s.json", "--log-level", "debug", "tree"],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_missing_arguments() {
    assert!(Cli::try_parse_from(["promptsync"]).is_err());
    assert!(Cli::try_parse_from(["promptsync", "import"]).is_err());
    assert!(Cli::try_parse_from(["promptsync", "export"]).is_err());
    assert!(Cli::try_parse_from(["promptsync", "sync"]).is_err());
}

#[test]
fn command_definition_is_consistent() {
    Cli::command().debug_assert();
}

fn context(dir: &TempDir, name: &str) -> CliContext {
    CliContext::from_parts(
        PromptSyncConfig::default(),
        FileStateStore::new(dir.path().join(name)),
    )
}

#[test]
fn status_json_contract_has_required_fields() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, "state.json");
    cli.state_store().save(&library()).unwrap();

    let output = cli
        .execute(&Commands::Status {
            format: "json".to_string(),
        })
        .unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert!(parsed.get("state_file").and_then(|v| v.as_str()).is_some());
    assert!(parsed.get("remote").and_then(|v| v.as_str()).is_some());
    assert_eq!(parsed.get("folders").and_then(|v| v.as_u64()), Some(1));
    assert_eq!(parsed.get("components").and_then(|v| v.as_u64()), Some(3));
    assert_eq!(parsed.get("prompts").and_then(|v| v.as_u64()), Some(1));
}

#[test]
fn status_text_mentions_remote_target() {
    let dir = TempDir::new().unwrap();
    let mut config = PromptSyncConfig::default();
    config.remote.owner = Some("octo".to_string());
    config.remote.repo = Some("notes".to_string());
    let cli = CliContext::from_parts(config, FileStateStore::new(dir.path().join("state.json")));

    let output = cli
        .execute(&Commands::Status {
            format: "text".to_string(),
        })
        .unwrap();
    assert!(output.contains("octo/notes/prompt-builder-data.json"));
    assert!(output.contains("never"));
}

#[test]
fn export_writes_canonical_backup() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, "state.json");
    cli.state_store().save(&library()).unwrap();
    let out = dir.path().join("export.json");

    cli.execute(&Commands::Export { file: out.clone() }).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    assert!(value.get("components").is_some());
    assert!(value.get("lastUpdated").and_then(|v| v.as_str()).is_some());
}

#[test]
fn import_of_garbage_leaves_state_untouched() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, "state.json");
    cli.state_store().save(&library()).unwrap();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, b"{\"unrelated\": true}").unwrap();

    let err = cli
        .execute(&Commands::Import {
            file: bad,
            replace_prompts: true,
        })
        .unwrap_err();
    assert!(err.to_string().contains("Malformed snapshot"));
    assert_eq!(cli.state_store().load().unwrap(), library());
}

#[test]
fn pull_without_remote_data_reports_unchanged() {
    let dir = TempDir::new().unwrap();
    let cli = context(&dir, "state.json")
        .with_remote_store(Arc::new(MemoryContentStore::new("data.json")));
    cli.state_store().save(&library()).unwrap();

    let output = cli.execute(&Commands::Pull { yes: true }).unwrap();
    assert!(output.contains("local state unchanged"));
    assert_eq!(cli.state_store().load().unwrap(), library());
}
