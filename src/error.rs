//! Error taxonomy for the sync subsystem.
//!
//! Every operation ends in success or one of these variants. An absent remote
//! document is not an error; it is modelled as `None` by the store APIs.

use crate::sync::SyncState;
use thiserror::Error;

/// Errors surfaced by codec, merge engine, remote store and orchestrator.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Payload is not JSON or matches no recognized snapshot shape.
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// CAS update rejected: the remote changed since the token was read.
    #[error("Version conflict on {path}: remote no longer matches version {expected}")]
    VersionConflict { path: String, expected: String },

    /// Create rejected: the remote path already holds content.
    #[error("Remote file already exists: {0}")]
    AlreadyExists(String),

    /// Retryable network, timeout, rate-limit or server failure.
    #[error("Transient store error: {0}")]
    TransientStore(String),

    /// Non-retryable store failure (credentials, path shape, payload size).
    #[error("Store error: {0}")]
    PermanentStore(String),

    /// Merge input violates the identity-key shape.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing or invalid configuration, reported before any network call.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A sync session is already in flight.
    #[error("Sync already in progress (state: {0})")]
    SyncBusy(SyncState),

    /// Local state file could not be read or written.
    #[error("State storage error: {0}")]
    StateStorage(String),
}

impl SyncError {
    /// Only transient store failures are safe to retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::TransientStore(_))
    }

    /// Conflicts require a fresh pull before the caller may write again.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            SyncError::VersionConflict { .. } | SyncError::AlreadyExists(_)
        )
    }
}

impl From<config::ConfigError> for SyncError {
    fn from(err: config::ConfigError) -> Self {
        SyncError::ConfigError(err.to_string())
    }
}
