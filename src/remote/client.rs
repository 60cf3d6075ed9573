//! Codec-aware remote store client.

use super::ContentStore;
use crate::error::SyncError;
use crate::snapshot::{self, Snapshot};
use crate::types::VersionToken;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of a remote read. Both options are `None` when nothing was published.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRead {
    pub snapshot: Option<Snapshot>,
    pub version: Option<VersionToken>,
    /// Whether the remote payload had its own prompt list
    pub carries_prompts: bool,
}

impl RemoteRead {
    pub fn is_absent(&self) -> bool {
        self.snapshot.is_none()
    }
}

/// Reads and writes snapshots through a [`ContentStore`].
#[derive(Clone)]
pub struct RemoteStoreClient {
    store: Arc<dyn ContentStore>,
}

impl RemoteStoreClient {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub fn target(&self) -> String {
        self.store.describe()
    }

    /// Read and decode the remote snapshot.
    pub async fn read(&self) -> Result<RemoteRead, SyncError> {
        match self.store.fetch().await? {
            None => {
                debug!(remote = %self.target(), "No remote snapshot published yet");
                Ok(RemoteRead {
                    snapshot: None,
                    version: None,
                    carries_prompts: false,
                })
            }
            Some(blob) => {
                let decoded = snapshot::decode_payload(&blob.bytes)?;
                debug!(
                    remote = %self.target(),
                    version = %blob.version,
                    bytes = blob.bytes.len(),
                    shape = %decoded.shape,
                    "Read remote snapshot"
                );
                Ok(RemoteRead {
                    snapshot: Some(decoded.snapshot),
                    version: Some(blob.version),
                    carries_prompts: decoded.carries_prompts,
                })
            }
        }
    }

    /// Fetch the current version token without decoding the content.
    pub async fn current_version(&self) -> Result<Option<VersionToken>, SyncError> {
        self.store.fetch_version().await
    }

    /// Encode and write `snapshot`, creating the file when `expected` is `None`.
    pub async fn write(
        &self,
        snapshot: &Snapshot,
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError> {
        let bytes = snapshot::encode(snapshot)?;
        let version = self.store.put(&bytes, expected).await?;
        info!(
            remote = %self.target(),
            version = %version,
            created = expected.is_none(),
            "Wrote remote snapshot"
        );
        Ok(version)
    }
}
