//! Remote Store
//!
//! Compare-and-swap access to a single snapshot file in a remote content store.
//! Transports implement [`ContentStore`] over raw bytes; [`RemoteStoreClient`]
//! layers the snapshot codec on top.

pub mod client;
pub mod github;
pub mod memory;

pub use client::{RemoteRead, RemoteStoreClient};
pub use github::GitHubContentStore;
pub use memory::MemoryContentStore;

use crate::error::SyncError;
use crate::types::VersionToken;
use async_trait::async_trait;

/// Raw remote file content together with the version it was read at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteBlob {
    pub bytes: Vec<u8>,
    pub version: VersionToken,
}

/// Content-addressed file store over one logical path.
///
/// Implementations never cache version tokens between calls.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Human-readable target, e.g. `github:owner/repo/path`
    fn describe(&self) -> String;

    /// Read the current content. `Ok(None)` means nothing was ever published.
    async fn fetch(&self) -> Result<Option<RemoteBlob>, SyncError>;

    /// Read only the current version token.
    ///
    /// Stores that can report a version without transferring the content
    /// should override this; it must succeed even when `fetch` cannot return
    /// the body.
    async fn fetch_version(&self) -> Result<Option<VersionToken>, SyncError> {
        Ok(self.fetch().await?.map(|blob| blob.version))
    }

    /// Write `bytes`.
    ///
    /// `expected = None` creates the file and fails with `AlreadyExists` if it
    /// has content. `expected = Some(token)` updates only if the current version
    /// equals `token`, failing with `VersionConflict` otherwise. A rejected
    /// write leaves the remote unchanged.
    async fn put(
        &self,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError>;
}
