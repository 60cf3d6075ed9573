//! File-backed state store.

use super::StateStore;
use crate::error::SyncError;
use crate::snapshot::{self, Snapshot};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> Result<PathBuf, SyncError> {
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                SyncError::StateStorage(format!("Invalid state file path: {}", self.path.display()))
            })?;
        Ok(self
            .path
            .with_file_name(format!(".{}.tmp.{}", file_name, std::process::id())))
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Snapshot, SyncError> {
        let raw = match fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No local state yet");
                return Ok(Snapshot::default());
            }
            Err(e) => {
                return Err(SyncError::StateStorage(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        snapshot::decode(&raw)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError> {
        let bytes = snapshot::encode(snapshot)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SyncError::StateStorage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let tmp = self.temp_path()?;
        fs::write(&tmp, &bytes).map_err(|e| {
            SyncError::StateStorage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(SyncError::StateStorage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "Saved local state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Prompt;
    use crate::tree::{ComponentType, Node, Tree};
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        Snapshot::new(
            Tree::new(vec![Node::folder(
                "f1",
                "Personas",
                vec![Node::component("c1", "Reviewer", ComponentType::Role, "You review code.")],
            )]),
            vec![Prompt {
                id: "p1".to_string(),
                name: "Review".to_string(),
                component_ids: vec!["c1".to_string()],
            }],
        )
    }

    #[test]
    fn missing_file_loads_empty_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        let loaded = store.load().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn save_creates_parent_and_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("nested/deeper/state.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), sample());

        let leftovers: Vec<_> = fs::read_dir(dir.path().join("nested/deeper"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn save_replaces_previous_state() {
        let dir = TempDir::new().unwrap();
        let store = FileStateStore::new(dir.path().join("state.json"));
        store.save(&sample()).unwrap();
        store.save(&Snapshot::default()).unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"not json").unwrap();
        let err = FileStateStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SyncError::MalformedSnapshot(_)));
    }

    #[test]
    fn unreadable_path_is_state_storage_error() {
        let dir = TempDir::new().unwrap();
        let err = FileStateStore::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, SyncError::StateStorage(_)));
    }
}
