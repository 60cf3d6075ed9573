//! Publish and pull sessions against the remote store.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{ImportOutcome, PublishOutcome, PullOutcome, SyncOrchestrator};
pub use state::{StateMachine, SyncSession, SyncState};
