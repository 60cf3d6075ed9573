//! Core identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// NodeId: opaque identifier of a folder or component, unique across the forest
pub type NodeId = String;

/// Opaque content hash identifying one exact remote state.
///
/// Returned by a store read and required for an update-in-place write. Never
/// persisted locally: a fresh token is fetched immediately before each write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for human-readable output.
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(idx, _)| idx)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
