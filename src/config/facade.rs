//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::PromptSyncConfig;
use crate::error::SyncError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    pub fn load() -> Result<PromptSyncConfig, SyncError> {
        Ok(MergeService::load()?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<PromptSyncConfig, SyncError> {
        Ok(MergeService::load_from_file(path)?)
    }

    /// Load from `path` when given, otherwise from standard sources.
    pub fn load_optional(path: Option<&Path>) -> Result<PromptSyncConfig, SyncError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load(),
        }
    }

    /// Create default configuration.
    pub fn default() -> PromptSyncConfig {
        PromptSyncConfig::default()
    }
}
