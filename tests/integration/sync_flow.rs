use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use promptsync::remote::{ContentStore, MemoryContentStore, RemoteBlob, RemoteStoreClient};
use promptsync::snapshot::{self, Prompt, Snapshot};
use promptsync::sync::{PullOutcome, SyncOrchestrator, SyncState};
use promptsync::tree::{ComponentType, Node, Tree, DEFAULT_CONTAINER_NAME};
use promptsync::types::VersionToken;
use promptsync::SyncError;

use crate::support::{library, sequential_ids};

/// Store where another device writes right after our read.
struct RacingStore {
    inner: MemoryContentStore,
    interloper: Mutex<Option<Vec<u8>>>,
}

impl RacingStore {
    fn new(inner: MemoryContentStore, interloper: Vec<u8>) -> Self {
        Self {
            inner,
            interloper: Mutex::new(Some(interloper)),
        }
    }
}

#[async_trait]
impl ContentStore for RacingStore {
    fn describe(&self) -> String {
        self.inner.describe()
    }

    async fn fetch(&self) -> Result<Option<RemoteBlob>, SyncError> {
        let blob = self.inner.fetch().await?;
        if let Some(bytes) = self.interloper.lock().take() {
            self.inner.replace(&bytes);
        }
        Ok(blob)
    }

    async fn put(
        &self,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError> {
        self.inner.put(bytes, expected).await
    }
}

fn device(store: Arc<dyn ContentStore>) -> SyncOrchestrator {
    SyncOrchestrator::new(RemoteStoreClient::new(store)).with_id_generator(sequential_ids())
}

type Pulled = (Tree, Option<Vec<Prompt>>, Option<DateTime<Utc>>);

fn merged(outcome: PullOutcome) -> Pulled {
    match outcome {
        PullOutcome::Merged {
            tree,
            prompts,
            last_updated,
            ..
        } => (tree, prompts, last_updated),
        PullOutcome::NoRemoteData => panic!("expected remote data"),
    }
}

#[tokio::test]
async fn second_device_pulls_what_first_published() {
    let store = Arc::new(MemoryContentStore::new("prompt-builder-data.json"));
    let laptop = device(store.clone());
    let desktop = device(store.clone());

    let local = library();
    let published = laptop.publish(&local.components, &local.prompts).await.unwrap();
    assert!(published.created);

    let (tree, prompts, last_updated) =
        merged(desktop.pull_and_merge(&Tree::default()).await.unwrap());
    assert_eq!(prompts, Some(local.prompts.clone()));
    assert_eq!(last_updated, Some(published.last_updated));
    assert_eq!(tree.component_count(), 3);

    // Top-level remote components land in the default container on an empty device.
    let names: Vec<&str> = tree.roots.iter().map(Node::name).collect();
    assert_eq!(names, vec!["Writing", DEFAULT_CONTAINER_NAME]);
}

#[tokio::test]
async fn pull_never_removes_local_only_components() {
    let store = Arc::new(MemoryContentStore::new("data.json"));
    let laptop = device(store.clone());
    let local = library();
    laptop.publish(&local.components, &local.prompts).await.unwrap();

    let desktop_tree = Tree::new(vec![Node::component(
        "d1",
        "Scratch",
        ComponentType::Context,
        "only here",
    )]);
    let desktop = device(store);
    let (tree, _, _) = merged(desktop.pull_and_merge(&desktop_tree).await.unwrap());

    assert!(tree.len() >= desktop_tree.len());
    assert!(tree.find("d1").is_some());
}

#[tokio::test]
async fn concurrent_update_is_rejected_and_remote_kept() {
    let initial = snapshot::encode(&library()).unwrap();
    let theirs = snapshot::encode(&Snapshot::default()).unwrap();
    let racing = Arc::new(RacingStore::new(
        MemoryContentStore::with_content("data.json", &initial),
        theirs.clone(),
    ));
    let laptop = device(racing.clone());

    let err = laptop
        .publish(&library().components, &[])
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::VersionConflict { .. }));
    assert!(err.is_conflict());
    assert!(!err.is_retryable());
    assert_eq!(racing.inner.contents().unwrap(), theirs);
    assert_eq!(laptop.state(), SyncState::Failed);
}

#[tokio::test]
async fn concurrent_create_is_already_exists() {
    let theirs = snapshot::encode(&library()).unwrap();
    let racing = Arc::new(RacingStore::new(
        MemoryContentStore::new("data.json"),
        theirs.clone(),
    ));
    let laptop = device(racing.clone());

    let err = laptop.publish(&Tree::default(), &[]).await.unwrap_err();
    assert!(matches!(err, SyncError::AlreadyExists(_)));
    assert_eq!(racing.inner.contents().unwrap(), theirs);
}

#[tokio::test]
async fn transient_failure_surfaces_and_next_attempt_succeeds() {
    let store = Arc::new(MemoryContentStore::new("data.json"));
    let laptop = device(store.clone());
    store.fail_next("connection reset by peer");

    let err = laptop.publish(&library().components, &[]).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(store.write_count(), 0);

    laptop.publish(&library().components, &[]).await.unwrap();
    assert_eq!(store.write_count(), 1);
    assert_eq!(laptop.state(), SyncState::Idle);
}

#[tokio::test]
async fn legacy_remote_payload_is_merged() {
    let legacy = br#"{"tree": [
        {"type": "folder", "id": "old-f", "name": "Writing", "children": [
            {"type": "component", "id": "old-c", "name": "Tone", "componentType": "style", "content": "Formal."}
        ]}
    ]}"#;
    let store = Arc::new(MemoryContentStore::with_content("data.json", legacy));
    let desktop = device(store);

    let local = library();
    let (tree, prompts, last_updated) =
        merged(desktop.pull_and_merge(&local.components).await.unwrap());
    assert!(prompts.is_none());
    assert!(last_updated.is_none());
    let kept = prompts.unwrap_or_else(|| local.prompts.clone());
    assert_eq!(kept, local.prompts);
    assert!(!kept.is_empty());
    assert_eq!(tree.len(), local.components.len());
    match tree.find("c-tone") {
        Some(Node::Component(tone)) => assert_eq!(tone.content, "Formal."),
        other => panic!("unexpected node: {:?}", other),
    }
}
