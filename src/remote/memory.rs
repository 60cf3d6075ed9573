//! In-process content store with blake3 content hashes as version tokens.

use super::{ContentStore, RemoteBlob};
use crate::error::SyncError;
use crate::types::VersionToken;
use async_trait::async_trait;
use parking_lot::Mutex;

pub struct MemoryContentStore {
    path: String,
    current: Mutex<Option<RemoteBlob>>,
    pending_failure: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryContentStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            current: Mutex::new(None),
            pending_failure: Mutex::new(None),
            writes: Mutex::new(0),
        }
    }

    /// Store pre-populated with `bytes`, as if published earlier.
    pub fn with_content(path: impl Into<String>, bytes: &[u8]) -> Self {
        let store = Self::new(path);
        store.replace(bytes);
        store
    }

    pub fn version_of(bytes: &[u8]) -> VersionToken {
        VersionToken::new(hex::encode(blake3::hash(bytes).as_bytes()))
    }

    /// Overwrite the content unconditionally, as another device would.
    pub fn replace(&self, bytes: &[u8]) -> VersionToken {
        let version = Self::version_of(bytes);
        *self.current.lock() = Some(RemoteBlob {
            bytes: bytes.to_vec(),
            version: version.clone(),
        });
        version
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.current.lock().as_ref().map(|blob| blob.bytes.clone())
    }

    pub fn version(&self) -> Option<VersionToken> {
        self.current.lock().as_ref().map(|blob| blob.version.clone())
    }

    /// Number of accepted writes
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }

    /// Make the next fetch or put fail with a transient error.
    pub fn fail_next(&self, message: impl Into<String>) {
        *self.pending_failure.lock() = Some(message.into());
    }

    fn take_failure(&self) -> Result<(), SyncError> {
        match self.pending_failure.lock().take() {
            Some(message) => Err(SyncError::TransientStore(message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    fn describe(&self) -> String {
        format!("memory:{}", self.path)
    }

    async fn fetch(&self) -> Result<Option<RemoteBlob>, SyncError> {
        self.take_failure()?;
        Ok(self.current.lock().clone())
    }

    async fn put(
        &self,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError> {
        self.take_failure()?;

        let mut current = self.current.lock();
        match (current.as_ref(), expected) {
            (Some(_), None) => return Err(SyncError::AlreadyExists(self.path.clone())),
            (None, Some(token)) => {
                return Err(SyncError::VersionConflict {
                    path: self.path.clone(),
                    expected: token.to_string(),
                })
            }
            (Some(blob), Some(token)) if &blob.version != token => {
                return Err(SyncError::VersionConflict {
                    path: self.path.clone(),
                    expected: token.to_string(),
                })
            }
            _ => {}
        }

        let version = Self::version_of(bytes);
        *current = Some(RemoteBlob {
            bytes: bytes.to_vec(),
            version: version.clone(),
        });
        *self.writes.lock() += 1;
        Ok(version)
    }
}
