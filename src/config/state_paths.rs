//! StateConfig and resolution of the local state file location.

use crate::config::paths;
use crate::error::SyncError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const STATE_FILE_NAME: &str = "state.json";

/// Local state configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// Working snapshot file; None means `$XDG_DATA_HOME/promptsync/state.json`
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl StateConfig {
    /// Resolve the state file path, falling back to the XDG data directory.
    pub fn resolve_file(&self) -> Result<PathBuf, SyncError> {
        match &self.file {
            Some(path) if !path.as_os_str().is_empty() => Ok(path.clone()),
            _ => Ok(paths::app_data_dir()?.join(STATE_FILE_NAME)),
        }
    }
}
