//! Sync Orchestrator
//!
//! Sequences remote reads, merges and CAS writes for publish and pull, and
//! offers the local import/export paths through the same codec and merge
//! engine. Remote operations run one at a time under the state machine.

use super::state::{StateMachine, SyncSession, SyncState};
use crate::error::SyncError;
use crate::remote::RemoteStoreClient;
use crate::snapshot::{self, Prompt, Snapshot, SnapshotShape};
use crate::tree::{self, MergeReport, Tree};
use crate::types::{NodeId, VersionToken};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

type IdGenerator = Box<dyn FnMut() -> NodeId + Send>;

/// Result of a successful publish
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishOutcome {
    pub version: VersionToken,
    /// True when the remote file did not exist before
    pub created: bool,
    pub last_updated: DateTime<Utc>,
}

/// Result of a pull
#[derive(Debug, Clone)]
pub enum PullOutcome {
    /// Nothing published yet; local state is untouched.
    NoRemoteData,
    Merged {
        tree: Tree,
        /// Remote prompts, replacing the local list wholesale. `None` when the
        /// remote payload had no prompt list, in which case local prompts stay.
        prompts: Option<Vec<Prompt>>,
        version: VersionToken,
        report: MergeReport,
        last_updated: Option<DateTime<Utc>>,
    },
}

/// Result of importing a backup file
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub tree: Tree,
    /// Prompts carried by the file, if it has a prompt list; the caller decides
    /// whether to adopt them
    pub prompts: Option<Vec<Prompt>>,
    pub report: MergeReport,
    pub shape: SnapshotShape,
}

pub struct SyncOrchestrator {
    remote: Option<RemoteStoreClient>,
    machine: StateMachine,
    next_id: Mutex<IdGenerator>,
}

impl SyncOrchestrator {
    pub fn new(remote: RemoteStoreClient) -> Self {
        Self {
            remote: Some(remote),
            machine: StateMachine::new(),
            next_id: Mutex::new(Box::new(tree::new_node_id) as IdGenerator),
        }
    }

    /// Orchestrator without a remote store; only import and export succeed.
    pub fn offline() -> Self {
        Self {
            remote: None,
            machine: StateMachine::new(),
            next_id: Mutex::new(Box::new(tree::new_node_id) as IdGenerator),
        }
    }

    /// Replace the id source used for nodes created by merges.
    pub fn with_id_generator<G>(mut self, generator: G) -> Self
    where
        G: FnMut() -> NodeId + Send + 'static,
    {
        self.next_id = Mutex::new(Box::new(generator) as IdGenerator);
        self
    }

    pub fn remote(&self) -> Option<&RemoteStoreClient> {
        self.remote.as_ref()
    }

    fn require_remote(&self) -> Result<&RemoteStoreClient, SyncError> {
        self.remote.as_ref().ok_or_else(|| {
            SyncError::ConfigError("No remote store configured for this session".to_string())
        })
    }

    pub fn state(&self) -> SyncState {
        self.machine.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.machine.subscribe()
    }

    /// Overwrite the remote snapshot with the local tree and prompts.
    ///
    /// The write is conditioned on the version read at the start of the
    /// session; a concurrent publisher surfaces as `VersionConflict` (or
    /// `AlreadyExists` when both raced to create the file).
    pub async fn publish(
        &self,
        tree: &Tree,
        prompts: &[Prompt],
    ) -> Result<PublishOutcome, SyncError> {
        let session = self.machine.begin()?;
        let result = self.run_publish(&session, tree, prompts).await;
        session.finish(result)
    }

    async fn run_publish(
        &self,
        session: &SyncSession<'_>,
        tree: &Tree,
        prompts: &[Prompt],
    ) -> Result<PublishOutcome, SyncError> {
        let remote = self.require_remote()?;
        tree.validate_ids().map_err(SyncError::Validation)?;

        let expected = remote.current_version().await?;

        session.advance(SyncState::Encoding);
        let last_updated = Utc::now();
        let snapshot = Snapshot {
            components: tree.clone(),
            prompts: prompts.to_vec(),
            last_updated: Some(last_updated),
        };

        session.advance(SyncState::Writing);
        let version = match remote.write(&snapshot, expected.as_ref()).await {
            Ok(version) => version,
            Err(e) => {
                if e.is_conflict() {
                    warn!(
                        remote = %remote.target(),
                        error = %e,
                        "Publish lost a concurrent write; pull before publishing again"
                    );
                }
                return Err(e);
            }
        };

        info!(
            remote = %remote.target(),
            version = %version.short(),
            components = tree.component_count(),
            prompts = prompts.len(),
            "Published snapshot"
        );

        Ok(PublishOutcome {
            version,
            created: expected.is_none(),
            last_updated,
        })
    }

    /// Fetch the remote snapshot and merge its components into `tree`.
    pub async fn pull_and_merge(&self, tree: &Tree) -> Result<PullOutcome, SyncError> {
        let session = self.machine.begin()?;
        let result = self.run_pull(&session, tree).await;
        session.finish(result)
    }

    async fn run_pull(
        &self,
        session: &SyncSession<'_>,
        tree: &Tree,
    ) -> Result<PullOutcome, SyncError> {
        let remote = self.require_remote()?;
        let read = remote.read().await?;
        let carries_prompts = read.carries_prompts;
        let (snapshot, version) = match (read.snapshot, read.version) {
            (Some(snapshot), Some(version)) => (snapshot, version),
            _ => {
                info!(remote = %remote.target(), "No remote data to pull");
                return Ok(PullOutcome::NoRemoteData);
            }
        };

        session.advance(SyncState::Merging);
        let outcome = self.merge(tree, &snapshot.components)?;

        info!(
            remote = %remote.target(),
            version = %version.short(),
            updated = outcome.report.updated,
            inserted = outcome.report.inserted,
            prompts = snapshot.prompts.len(),
            carries_prompts,
            "Pulled and merged remote snapshot"
        );

        Ok(PullOutcome::Merged {
            tree: outcome.tree,
            prompts: carries_prompts.then_some(snapshot.prompts),
            version,
            report: outcome.report,
            last_updated: snapshot.last_updated,
        })
    }

    /// Merge the components of a backup file (any accepted shape) into `tree`.
    pub fn import(&self, tree: &Tree, bytes: &[u8]) -> Result<ImportOutcome, SyncError> {
        let decoded = snapshot::decode_payload(bytes)?;
        let shape = decoded.shape;
        let snapshot = decoded.snapshot;
        let outcome = self.merge(tree, &snapshot.components)?;
        info!(
            shape = %shape,
            updated = outcome.report.updated,
            inserted = outcome.report.inserted,
            "Imported snapshot"
        );
        Ok(ImportOutcome {
            tree: outcome.tree,
            prompts: decoded.carries_prompts.then_some(snapshot.prompts),
            report: outcome.report,
            shape,
        })
    }

    /// Canonical backup bytes for the local state, stamped with the current time.
    pub fn export(&self, tree: &Tree, prompts: &[Prompt]) -> Result<Vec<u8>, SyncError> {
        tree.validate_ids().map_err(SyncError::Validation)?;
        let snapshot = Snapshot::new(tree.clone(), prompts.to_vec()).stamped(Utc::now());
        snapshot::encode(&snapshot)
    }

    fn merge(&self, base: &Tree, incoming: &Tree) -> Result<tree::MergeOutcome, SyncError> {
        let mut next_id = self.next_id.lock();
        tree::merge(base, &incoming.roots, &mut *next_id)
    }
}
