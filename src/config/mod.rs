//! Configuration
//!
//! Layered configuration built with the `config` crate: built-in defaults, an
//! optional TOML file, then environment variables. The remote target (owner,
//! repository, path) is required before any network call is attempted.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod state_paths;

pub use facade::ConfigLoader;
pub use state_paths::StateConfig;

use crate::error::SyncError;
use crate::logging::LoggingConfig;
use merge::merge_policy::{
    DEFAULT_API_BASE, DEFAULT_COMMIT_MESSAGE, DEFAULT_REMOTE_PATH, DEFAULT_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable holding the bearer credential for the remote store.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptSyncConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote content store target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: Option<String>,

    /// Repository name
    #[serde(default)]
    pub repo: Option<String>,

    /// File path inside the repository
    #[serde(default = "default_remote_path")]
    pub path: String,

    /// Branch to read and write; None means the repository default branch
    #[serde(default)]
    pub branch: Option<String>,

    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Commit message used for every publish
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Bearer token; falls back to the GITHUB_TOKEN environment variable
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
}

fn default_remote_path() -> String {
    DEFAULT_REMOTE_PATH.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_commit_message() -> String {
    DEFAULT_COMMIT_MESSAGE.to_string()
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            path: default_remote_path(),
            branch: None,
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            commit_message: default_commit_message(),
            token: None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RemoteConfig {
    /// Check that the target is fully specified.
    pub fn validate(&self) -> Result<(), SyncError> {
        let mut missing = Vec::new();
        if non_empty(&self.owner).is_none() {
            missing.push("remote.owner (REPO_OWNER)");
        }
        if non_empty(&self.repo).is_none() {
            missing.push("remote.repo (REPO_NAME)");
        }
        if self.path.trim().trim_matches('/').is_empty() {
            missing.push("remote.path (REPO_PATH)");
        }
        if !missing.is_empty() {
            return Err(SyncError::ConfigError(format!(
                "Missing remote repository configuration: {}",
                missing.join(", ")
            )));
        }

        if self.path.ends_with('/') {
            return Err(SyncError::ConfigError(format!(
                "Remote path must name a file, not a directory: {}",
                self.path
            )));
        }

        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(SyncError::ConfigError(format!(
                "Invalid API base URL: {}",
                self.api_base
            )));
        }

        if self.timeout_secs == 0 {
            return Err(SyncError::ConfigError(
                "remote.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn owner(&self) -> Option<&str> {
        non_empty(&self.owner)
    }

    pub fn repo(&self) -> Option<&str> {
        non_empty(&self.repo)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Bearer token from config or `GITHUB_TOKEN`.
    pub fn resolve_token(&self) -> Result<String, SyncError> {
        if let Some(token) = non_empty(&self.token) {
            return Ok(token.to_string());
        }
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                SyncError::ConfigError(format!(
                    "{} is not set (set it in the environment or remote.token in config)",
                    TOKEN_ENV_VAR
                ))
            })
    }

    /// `owner/repo/path` for display
    pub fn display_target(&self) -> String {
        format!(
            "{}/{}/{}",
            self.owner().unwrap_or("?"),
            self.repo().unwrap_or("?"),
            self.path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::merge::merge_policy::builder_with_defaults;
    use crate::config::sources::{environment, global_file};
    use std::collections::HashMap;

    fn target(owner: &str, repo: &str) -> RemoteConfig {
        RemoteConfig {
            owner: Some(owner.to_string()),
            repo: Some(repo.to_string()),
            ..RemoteConfig::default()
        }
    }

    #[test]
    fn defaults_match_remote_layout() {
        let config = RemoteConfig::default();
        assert_eq!(config.path, "prompt-builder-data.json");
        assert_eq!(config.api_base, "https://api.github.com");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.owner.is_none());
    }

    #[test]
    fn missing_target_is_reported_together() {
        let err = RemoteConfig::default().validate().unwrap_err();
        match err {
            SyncError::ConfigError(message) => {
                assert!(message.contains("REPO_OWNER"));
                assert!(message.contains("REPO_NAME"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn validate_rejects_directory_paths_and_zero_timeout() {
        let mut config = target("octo", "notes");
        assert!(config.validate().is_ok());

        config.path = "data/".to_string();
        assert!(config.validate().is_err());

        let mut config = target("octo", "notes");
        config.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = target("octo", "notes");
        config.api_base = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = target("  ", "notes");
        assert!(config.validate().is_err());
        assert_eq!(config.owner(), None);
    }

    #[test]
    fn configured_token_wins() {
        let config = RemoteConfig {
            token: Some("from-config".to_string()),
            ..RemoteConfig::default()
        };
        assert_eq!(config.resolve_token().unwrap(), "from-config");
    }

    #[test]
    fn layers_file_then_target_variables() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("config.toml");
        std::fs::write(
            &file,
            "[remote]\nowner = \"file-owner\"\nrepo = \"file-repo\"\nbranch = \"sync\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let vars: HashMap<&str, &str> = [("REPO_OWNER", "env-owner"), ("REPO_PATH", "nested/data.json")]
            .into_iter()
            .collect();

        let builder = builder_with_defaults().unwrap();
        let builder = global_file::add_explicit(builder, &file).unwrap();
        let builder = environment::add_target_variables(builder, |name| {
            vars.get(name).map(|v| v.to_string())
        })
        .unwrap();
        let config: PromptSyncConfig = builder.build().unwrap().try_deserialize().unwrap();

        assert_eq!(config.remote.owner(), Some("env-owner"));
        assert_eq!(config.remote.repo(), Some("file-repo"));
        assert_eq!(config.remote.path, "nested/data.json");
        assert_eq!(config.remote.branch.as_deref(), Some("sync"));
        assert_eq!(config.remote.timeout_secs, 30);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn explicit_file_must_exist() {
        let builder = builder_with_defaults().unwrap();
        let result = global_file::add_explicit(builder, std::path::Path::new("/nonexistent/promptsync.toml"));
        assert!(result.is_err());
    }
}
