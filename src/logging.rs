//! Logging System
//!
//! Structured logging using the `tracing` crate. Level, format and destination
//! come from config, with `PROMPTSYNC_LOG*` environment variables taking
//! precedence.

use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const LEVEL_ENV: &str = "PROMPTSYNC_LOG";
const FORMAT_ENV: &str = "PROMPTSYNC_LOG_FORMAT";
const OUTPUT_ENV: &str = "PROMPTSYNC_LOG_OUTPUT";
const FILE_ENV: &str = "PROMPTSYNC_LOG_FILE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(SyncError::ConfigError(format!(
                "Invalid log format: {} (must be 'json' or 'text')",
                other
            ))),
        }
    }
}

/// Where log lines go. Stdout is left to command output unless asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogOutput {
    #[serde(rename = "stdout")]
    Stdout,
    #[serde(rename = "stderr")]
    Stderr,
    #[default]
    #[serde(rename = "file")]
    File,
    #[serde(rename = "file+stderr")]
    FileAndStderr,
    #[serde(rename = "both")]
    StdoutAndStderr,
}

impl LogOutput {
    fn writes_file(self) -> bool {
        matches!(self, LogOutput::File | LogOutput::FileAndStderr)
    }
}

impl FromStr for LogOutput {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdout" => Ok(LogOutput::Stdout),
            "stderr" => Ok(LogOutput::Stderr),
            "file" => Ok(LogOutput::File),
            "file+stderr" => Ok(LogOutput::FileAndStderr),
            "both" => Ok(LogOutput::StdoutAndStderr),
            other => Err(SyncError::ConfigError(format!(
                "Invalid log output: {} (must be 'stdout', 'stderr', 'file', 'file+stderr', or 'both')",
                other
            ))),
        }
    }
}

impl fmt::Display for LogOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogOutput::Stdout => "stdout",
            LogOutput::Stderr => "stderr",
            LogOutput::File => "file",
            LogOutput::FileAndStderr => "file+stderr",
            LogOutput::StdoutAndStderr => "both",
        })
    }
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    /// Default filter directive: trace, debug, info, warn, error, off
    pub level: String,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file; None means the platform state directory
    pub file: Option<PathBuf>,
    /// ANSI colors for text output on a terminal stream
    pub color: bool,
    /// Per-target levels, e.g. `promptsync::remote = "debug"`
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            format: LogFormat::Text,
            output: LogOutput::File,
            file: None,
            color: true,
            modules: BTreeMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Apply `PROMPTSYNC_LOG_FORMAT` and `PROMPTSYNC_LOG_OUTPUT` when set.
    fn with_env_overrides(&self) -> Result<Self, SyncError> {
        let mut resolved = self.clone();
        if let Some(format) = env_value(FORMAT_ENV) {
            resolved.format = format.parse()?;
        }
        if let Some(output) = env_value(OUTPUT_ENV) {
            resolved.output = output.parse()?;
        }
        Ok(resolved)
    }

    /// Filter from `PROMPTSYNC_LOG`, else level plus module directives.
    fn env_filter(&self) -> Result<EnvFilter, SyncError> {
        if let Ok(filter) = EnvFilter::try_from_env(LEVEL_ENV) {
            return Ok(filter);
        }
        let mut directives = vec![self.level.clone()];
        directives.extend(
            self.modules
                .iter()
                .map(|(target, level)| format!("{}={}", target, level)),
        );
        EnvFilter::try_new(directives.join(","))
            .map_err(|e| SyncError::ConfigError(format!("Invalid log directive: {}", e)))
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Log file location: explicit path, then `PROMPTSYNC_LOG_FILE`, then config,
/// then `<state dir>/promptsync.log`.
pub fn resolve_log_file_path(
    explicit: Option<PathBuf>,
    configured: Option<PathBuf>,
) -> Result<PathBuf, SyncError> {
    let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
    if let Some(path) = explicit.filter(non_empty) {
        return Ok(path);
    }
    if let Some(path) = env_value(FILE_ENV) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = configured.filter(non_empty) {
        return Ok(path);
    }
    let dirs = directories::ProjectDirs::from("", "", "promptsync").ok_or_else(|| {
        SyncError::ConfigError("Could not determine platform state directory for log file".to_string())
    })?;
    let dir = dirs.state_dir().unwrap_or_else(|| dirs.data_local_dir());
    Ok(dir.join("promptsync.log"))
}

fn open_log_file(config: &LoggingConfig) -> Result<std::fs::File, SyncError> {
    let path = resolve_log_file_path(None, config.file.clone())?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            SyncError::ConfigError(format!("Failed to create log directory {}: {}", parent.display(), e))
        })?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| SyncError::ConfigError(format!("Failed to open log file {}: {}", path.display(), e)))
}

fn make_writer(config: &LoggingConfig) -> Result<BoxMakeWriter, SyncError> {
    let writer = match config.output {
        LogOutput::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogOutput::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogOutput::StdoutAndStderr => BoxMakeWriter::new(std::io::stdout.and(std::io::stderr)),
        LogOutput::File => BoxMakeWriter::new(Arc::new(open_log_file(config)?)),
        LogOutput::FileAndStderr => {
            BoxMakeWriter::new(Arc::new(open_log_file(config)?).and(std::io::stderr))
        }
    };
    Ok(writer)
}

/// Install the global subscriber.
///
/// Environment variables win over `config`, which wins over defaults. Calling
/// this twice returns an error rather than replacing the first subscriber.
pub fn init_logging(config: Option<&LoggingConfig>) -> Result<(), SyncError> {
    let config = config.cloned().unwrap_or_default().with_env_overrides()?;
    let init_error = |e: tracing_subscriber::util::TryInitError| {
        SyncError::ConfigError(format!("Failed to initialize logging: {}", e))
    };

    if !config.enabled {
        return Registry::default()
            .with(EnvFilter::new("off"))
            .try_init()
            .map_err(init_error);
    }

    let filter = config.env_filter()?;
    let layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(make_writer(&config)?);

    match config.format {
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(layer.json())
            .try_init()
            .map_err(init_error),
        LogFormat::Text => Registry::default()
            .with(filter)
            .with(layer.with_ansi(config.color && !config.output.writes_file()))
            .try_init()
            .map_err(init_error),
    }
}
