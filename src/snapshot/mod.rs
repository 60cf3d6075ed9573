//! Snapshots
//!
//! The externally persisted unit: the whole component tree, the prompt list,
//! and the time of the last publish or export.

pub mod codec;

pub use codec::{decode, decode_payload, decode_with_shape, encode, Decoded, SnapshotShape};

use crate::tree::Tree;
use crate::types::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordered assembly of components under a display name.
///
/// Prompts are never merged: a pull replaces the local list wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub name: String,
    /// Component ids in assembly order
    #[serde(default)]
    pub component_ids: Vec<NodeId>,
}

/// Canonical in-memory snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub components: Tree,
    pub prompts: Vec<Prompt>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Snapshot {
    pub fn new(components: Tree, prompts: Vec<Prompt>) -> Self {
        Self {
            components,
            prompts,
            last_updated: None,
        }
    }

    /// Copy of this snapshot stamped with `at`
    pub fn stamped(&self, at: DateTime<Utc>) -> Self {
        Self {
            components: self.components.clone(),
            prompts: self.prompts.clone(),
            last_updated: Some(at),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty() && self.prompts.is_empty()
    }
}
