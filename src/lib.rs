//! Promptsync: prompt component library with conflict-safe remote sync
//!
//! A library of reusable prompt components organized in folders, persisted as
//! a single JSON snapshot in a GitHub repository. Publishing is a
//! compare-and-swap write; pulling merges remote components into the local
//! tree by identity key without deleting anything.

pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod snapshot;
pub mod store;
pub mod sync;
pub mod tooling;
pub mod tree;
pub mod types;

pub use error::SyncError;
