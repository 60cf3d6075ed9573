//! Component Tree
//!
//! The hierarchy of folders and reusable text components, plus the merge
//! engine that reconciles it with incoming snapshots.

pub mod index;
pub mod merge;
pub mod node;

pub use index::{IdentityIndex, IdentityKey};
pub use merge::{merge, MergeOutcome, MergeReport, DEFAULT_CONTAINER_ID, DEFAULT_CONTAINER_NAME};
pub use node::{Component, ComponentType, Folder, Node, Tree};

use crate::types::NodeId;

/// Mint a fresh random node id.
pub fn new_node_id() -> NodeId {
    uuid::Uuid::new_v4().to_string()
}
