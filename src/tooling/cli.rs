//! CLI Tooling
//!
//! Command-line interface over the local state file and the remote store.
//! Every command returns its output as a string; the binary prints it.

use crate::config::{ConfigLoader, PromptSyncConfig};
use crate::error::SyncError;
use crate::logging::{LogFormat, LogOutput, LoggingConfig};
use crate::remote::{ContentStore, GitHubContentStore, RemoteStoreClient};
use crate::snapshot::Snapshot;
use crate::store::{FileStateStore, StateStore};
use crate::sync::{PullOutcome, SyncOrchestrator};
use crate::tree::{MergeReport, Node, Tree};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Prompt component library sync
#[derive(Parser)]
#[command(name = "promptsync")]
#[command(about = "Sync a prompt component library with a GitHub-hosted snapshot", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Local state file (overrides state.file from config)
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<LogOutput>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Fold logging flags over the configured logging section.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.format = format;
        }
        if let Some(output) = self.log_output {
            config.output = output;
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Overwrite the remote snapshot with local state
    Publish {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Merge remote components into local state and adopt remote prompts
    Pull {
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Merge a backup file into local state
    Import {
        /// Backup file (current or legacy format)
        file: PathBuf,
        /// Replace local prompts with the prompts in the file
        #[arg(long)]
        replace_prompts: bool,
    },
    /// Write local state as a backup file
    Export {
        /// Destination file
        file: PathBuf,
    },
    /// Show local state summary and remote target
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the local component tree
    Tree,
}

/// Status summary
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub state_file: String,
    pub remote: String,
    pub branch: Option<String>,
    pub folders: usize,
    pub components: usize,
    pub prompts: usize,
    pub last_updated: Option<String>,
}

/// CLI context holding configuration and local state
pub struct CliContext {
    config: PromptSyncConfig,
    state: FileStateStore,
    remote_override: Option<Arc<dyn ContentStore>>,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(config_path: Option<PathBuf>, state_path: Option<PathBuf>) -> Result<Self, SyncError> {
        let config = ConfigLoader::load_optional(config_path.as_deref())?;
        let state_file = match state_path {
            Some(path) => path,
            None => config.state.resolve_file()?,
        };
        Ok(Self::from_parts(config, FileStateStore::new(state_file)))
    }

    pub fn from_parts(config: PromptSyncConfig, state: FileStateStore) -> Self {
        Self {
            config,
            state,
            remote_override: None,
        }
    }

    /// Use `store` instead of the configured GitHub target.
    pub fn with_remote_store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.remote_override = Some(store);
        self
    }

    pub fn config(&self) -> &PromptSyncConfig {
        &self.config
    }

    pub fn state_store(&self) -> &FileStateStore {
        &self.state
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, SyncError> {
        match command {
            Commands::Publish { yes } => self.handle_publish(*yes),
            Commands::Pull { yes } => self.handle_pull(*yes),
            Commands::Import {
                file,
                replace_prompts,
            } => self.handle_import(file, *replace_prompts),
            Commands::Export { file } => self.handle_export(file),
            Commands::Status { format } => self.handle_status(format),
            Commands::Tree => self.handle_tree(),
        }
    }

    fn orchestrator(&self) -> Result<SyncOrchestrator, SyncError> {
        let store: Arc<dyn ContentStore> = match &self.remote_override {
            Some(store) => Arc::clone(store),
            None => Arc::new(GitHubContentStore::from_config(&self.config.remote)?),
        };
        Ok(SyncOrchestrator::new(RemoteStoreClient::new(store)))
    }

    fn runtime() -> Result<tokio::runtime::Runtime, SyncError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(SyncError::ConfigError(
                "Cannot run a sync command from within an async runtime".to_string(),
            ));
        }
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Failed to create runtime: {}", e)))
    }

    fn confirm(prompt: String) -> Result<bool, SyncError> {
        use dialoguer::Confirm;
        Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(|e| SyncError::ConfigError(format!("Failed to get user input: {}", e)))
    }

    /// Handle publish command
    fn handle_publish(&self, yes: bool) -> Result<String, SyncError> {
        let orchestrator = self.orchestrator()?;
        let target = orchestrator
            .remote()
            .map(RemoteStoreClient::target)
            .unwrap_or_default();
        let local = self.state.load()?;

        if !yes
            && !Self::confirm(format!(
                "Overwrite the remote snapshot at {} with {} components and {} prompts?",
                target,
                local.components.component_count(),
                local.prompts.len()
            ))?
        {
            return Ok("Publish cancelled".to_string());
        }

        let rt = Self::runtime()?;
        let outcome = rt.block_on(orchestrator.publish(&local.components, &local.prompts))?;

        let stamped = local.stamped(outcome.last_updated);
        self.state.save(&stamped)?;

        Ok(format!(
            "{} {} components and {} prompts to {}\nVersion: {}{}",
            "Published".green(),
            stamped.components.component_count(),
            stamped.prompts.len(),
            target,
            outcome.version.short(),
            if outcome.created { " (new file)" } else { "" }
        ))
    }

    /// Handle pull command
    fn handle_pull(&self, yes: bool) -> Result<String, SyncError> {
        let orchestrator = self.orchestrator()?;
        let target = orchestrator
            .remote()
            .map(RemoteStoreClient::target)
            .unwrap_or_default();

        if !yes
            && !Self::confirm(format!(
                "Replace local prompts and merge components from {}?",
                target
            ))?
        {
            return Ok("Pull cancelled".to_string());
        }

        let local = self.state.load()?;
        let rt = Self::runtime()?;
        let outcome = rt.block_on(orchestrator.pull_and_merge(&local.components))?;

        match outcome {
            PullOutcome::NoRemoteData => Ok(format!(
                "No data published at {} yet; local state unchanged",
                target
            )),
            PullOutcome::Merged {
                tree,
                prompts,
                version,
                report,
                last_updated,
            } => {
                let replaced = prompts.is_some();
                let merged = Snapshot {
                    components: tree,
                    prompts: prompts.unwrap_or(local.prompts),
                    last_updated,
                };
                self.state.save(&merged)?;
                Ok(format!(
                    "{} {} (version {})\n{}\nPrompts: {}{}",
                    "Pulled".green(),
                    target,
                    version.short(),
                    format_report(&report),
                    merged.prompts.len(),
                    if replaced { " (replaced)" } else { " (kept, remote has none)" }
                ))
            }
        }
    }

    /// Handle import command
    fn handle_import(&self, file: &Path, replace_prompts: bool) -> Result<String, SyncError> {
        let bytes = std::fs::read(file).map_err(|e| {
            SyncError::StateStorage(format!("Failed to read {}: {}", file.display(), e))
        })?;
        let local = self.state.load()?;
        let outcome = SyncOrchestrator::offline().import(&local.components, &bytes)?;

        let (prompts, replaced) = match outcome.prompts {
            Some(prompts) if replace_prompts => (prompts, true),
            _ => (local.prompts, false),
        };
        let prompt_count = prompts.len();
        self.state.save(&Snapshot {
            components: outcome.tree,
            prompts,
            last_updated: local.last_updated,
        })?;

        info!(file = %file.display(), shape = %outcome.shape, "Imported backup");
        Ok(format!(
            "{} {} ({} format)\n{}\nPrompts: {}{}",
            "Imported".green(),
            file.display(),
            outcome.shape,
            format_report(&outcome.report),
            prompt_count,
            if replaced { " (replaced)" } else { " (kept)" }
        ))
    }

    /// Handle export command
    fn handle_export(&self, file: &Path) -> Result<String, SyncError> {
        let local = self.state.load()?;
        let bytes = SyncOrchestrator::offline().export(&local.components, &local.prompts)?;

        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                SyncError::StateStorage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        std::fs::write(file, &bytes).map_err(|e| {
            SyncError::StateStorage(format!("Failed to write {}: {}", file.display(), e))
        })?;

        Ok(format!(
            "{} {} components and {} prompts to {}",
            "Exported".green(),
            local.components.component_count(),
            local.prompts.len(),
            file.display()
        ))
    }

    fn status(&self) -> Result<StatusOutput, SyncError> {
        let local = self.state.load()?;
        let components = local.components.component_count();
        Ok(StatusOutput {
            state_file: self.state.path().display().to_string(),
            remote: self.config.remote.display_target(),
            branch: self.config.remote.branch.clone(),
            folders: local.components.len() - components,
            components,
            prompts: local.prompts.len(),
            last_updated: local.last_updated.map(|t| t.to_rfc3339()),
        })
    }

    /// Handle status command
    fn handle_status(&self, format: &str) -> Result<String, SyncError> {
        let status = self.status()?;
        match format {
            "json" => serde_json::to_string_pretty(&status)
                .map_err(|e| SyncError::ConfigError(format!("Failed to serialize status: {}", e))),
            "text" => Ok(format_status_text(&status)),
            other => Err(SyncError::ConfigError(format!(
                "Invalid format: {} (must be 'text' or 'json')",
                other
            ))),
        }
    }

    /// Handle tree command
    fn handle_tree(&self) -> Result<String, SyncError> {
        let local = self.state.load()?;
        if local.components.is_empty() {
            return Ok("(no components)".to_string());
        }
        Ok(format_tree(&local.components))
    }
}

fn format_report(report: &MergeReport) -> String {
    format!(
        "Components: {} updated, {} unchanged, {} inserted; folders created: {}",
        report.updated, report.unchanged, report.inserted, report.folders_created
    )
}

/// Format status as human-readable text.
pub fn format_status_text(status: &StatusOutput) -> String {
    let mut out = format!("{}\n\n", "Promptsync Status".bold().underline());

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.add_row(vec!["State file".to_string(), status.state_file.clone()]);
    table.add_row(vec!["Remote".to_string(), status.remote.clone()]);
    table.add_row(vec![
        "Branch".to_string(),
        status.branch.clone().unwrap_or_else(|| "(default)".to_string()),
    ]);
    table.add_row(vec!["Folders".to_string(), status.folders.to_string()]);
    table.add_row(vec!["Components".to_string(), status.components.to_string()]);
    table.add_row(vec!["Prompts".to_string(), status.prompts.to_string()]);
    table.add_row(vec![
        "Last updated".to_string(),
        status.last_updated.clone().unwrap_or_else(|| "never".to_string()),
    ]);
    out.push_str(&table.to_string());
    out
}

/// Indented listing, folders first-class, components tagged with their type.
pub fn format_tree(tree: &Tree) -> String {
    let mut lines = Vec::new();
    tree.walk(|node, depth| {
        let indent = "  ".repeat(depth);
        match node {
            Node::Folder(folder) => lines.push(format!("{}{}/", indent, folder.name)),
            Node::Component(component) => lines.push(format!(
                "{}{} [{}]",
                indent, component.name, component.component_type
            )),
        }
    });
    lines.join("\n")
}
