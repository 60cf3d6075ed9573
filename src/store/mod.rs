//! Local State Store
//!
//! Persists the local snapshot between CLI invocations. The on-disk format is
//! the canonical snapshot encoding, so a state file doubles as a backup.

pub mod file;

pub use file::FileStateStore;

use crate::error::SyncError;
use crate::snapshot::Snapshot;

/// Local snapshot storage interface
pub trait StateStore {
    /// Load the saved snapshot; an empty snapshot when nothing was saved yet.
    fn load(&self) -> Result<Snapshot, SyncError>;
    fn save(&self, snapshot: &Snapshot) -> Result<(), SyncError>;
}
