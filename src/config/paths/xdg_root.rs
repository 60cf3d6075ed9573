//! XDG Base Directory utilities for local state and configuration.

use crate::error::SyncError;
use std::path::PathBuf;

const APP_DIR: &str = "promptsync";

/// `$<var>` when set and non-empty, else `$HOME/<fallback>`.
fn base_dir(var: &str, fallback: &[&str]) -> Option<PathBuf> {
    match std::env::var_os(var) {
        Some(dir) if !dir.is_empty() => Some(PathBuf::from(dir)),
        _ => std::env::var_os("HOME")
            .map(|home| fallback.iter().fold(PathBuf::from(home), |dir, part| dir.join(part))),
    }
}

fn unresolved(kind: &str) -> SyncError {
    SyncError::ConfigError(format!(
        "Could not determine XDG {} home directory (HOME not set)",
        kind
    ))
}

/// `$XDG_DATA_HOME`, defaulting to `$HOME/.local/share`
pub fn data_home() -> Option<PathBuf> {
    base_dir("XDG_DATA_HOME", &[".local", "share"])
}

/// `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`
pub fn config_home() -> Result<PathBuf, SyncError> {
    base_dir("XDG_CONFIG_HOME", &[".config"]).ok_or_else(|| unresolved("config"))
}

/// Application data directory: `$XDG_DATA_HOME/promptsync/`
pub fn app_data_dir() -> Result<PathBuf, SyncError> {
    Ok(data_home().ok_or_else(|| unresolved("data"))?.join(APP_DIR))
}

/// Global config file: `$XDG_CONFIG_HOME/promptsync/config.toml`
pub fn global_config_file() -> Result<PathBuf, SyncError> {
    Ok(config_home()?.join(APP_DIR).join("config.toml"))
}
