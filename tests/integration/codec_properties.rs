use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use promptsync::snapshot::{self, Prompt, Snapshot, SnapshotShape};
use promptsync::tree::{ComponentType, Node, Tree};

use crate::support::library;

fn snapshot_strategy() -> impl Strategy<Value = Snapshot> {
    let kinds = prop::sample::select(ComponentType::ALL.to_vec());
    let components = prop::collection::vec((".{1,16}", kinds, ".{0,40}"), 0..6);
    let prompts = prop::collection::vec("[A-Za-z ]{1,12}", 0..3);
    (components, prompts, prop::option::of(0i64..4_000_000_000)).prop_map(
        |(components, prompt_names, seconds)| {
            let roots: Vec<Node> = components
                .into_iter()
                .enumerate()
                .map(|(i, (name, kind, content))| Node::component(format!("c{}", i), name, kind, content))
                .collect();
            let prompts = prompt_names
                .into_iter()
                .enumerate()
                .map(|(i, name)| Prompt {
                    id: format!("p{}", i),
                    name,
                    component_ids: vec![],
                })
                .collect();
            Snapshot {
                components: Tree::new(vec![Node::folder("root", "All", roots)]),
                prompts,
                last_updated: seconds.and_then(|s| Utc.timestamp_opt(s, 0).single()),
            }
        },
    )
}

proptest! {
    #[test]
    fn decode_inverts_encode(snapshot in snapshot_strategy()) {
        let bytes = snapshot::encode(&snapshot).unwrap();
        let (decoded, shape) = snapshot::decode_with_shape(&bytes).unwrap();
        prop_assert_eq!(shape, SnapshotShape::Canonical);
        prop_assert_eq!(decoded, snapshot);
    }
}

#[test]
fn legacy_shapes_decode_to_same_components() {
    let roots = library().components.roots;
    let bare = serde_json::to_vec(&roots).unwrap();
    let envelope = serde_json::to_vec(&serde_json::json!({ "tree": roots })).unwrap();

    let (from_bare, bare_shape) = snapshot::decode_with_shape(&bare).unwrap();
    let (from_envelope, envelope_shape) = snapshot::decode_with_shape(&envelope).unwrap();

    assert_eq!(bare_shape, SnapshotShape::LegacyBare);
    assert_eq!(envelope_shape, SnapshotShape::LegacyEnvelope);
    assert_eq!(from_bare, from_envelope);
    assert_eq!(from_bare, Snapshot::new(Tree::new(roots), vec![]));
}

#[test]
fn canonical_wire_names_are_camel_case() {
    let mut snapshot = library();
    snapshot.last_updated = Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
    let value: serde_json::Value =
        serde_json::from_slice(&snapshot::encode(&snapshot).unwrap()).unwrap();

    assert!(value.get("lastUpdated").is_some());
    assert_eq!(value["components"][0]["type"], "folder");
    assert_eq!(value["components"][0]["children"][0]["componentType"], "style");
    assert_eq!(value["prompts"][0]["componentIds"][0], "c-role");
}
