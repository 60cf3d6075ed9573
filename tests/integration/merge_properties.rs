use proptest::prelude::*;
use promptsync::tree::{merge, ComponentType, Node, Tree};

use crate::support::sequential_ids;

fn component_type() -> impl Strategy<Value = ComponentType> {
    prop::sample::select(ComponentType::ALL.to_vec())
}

fn component(prefix: &'static str) -> impl Strategy<Value = Node> {
    (0u8..6, component_type(), "[a-z ]{0,12}", any::<u32>()).prop_map(
        move |(name, kind, content, id)| {
            Node::component(format!("{}-{}", prefix, id), format!("n{}", name), kind, content)
        },
    )
}

fn forest(prefix: &'static str) -> impl Strategy<Value = Vec<Node>> {
    let leaf = component(prefix);
    let folder = (0u8..3, prop::collection::vec(component(prefix), 0..4), any::<u32>()).prop_map(
        move |(name, children, id)| Node::folder(format!("{}-f{}", prefix, id), format!("dir{}", name), children),
    );
    prop::collection::vec(prop_oneof![3 => leaf, 1 => folder], 0..8)
}

/// Give every node a unique id so the base is a valid tree.
fn renumber(nodes: Vec<Node>, counter: &mut usize) -> Vec<Node> {
    nodes
        .into_iter()
        .map(|node| {
            *counter += 1;
            let id = format!("b{}", counter);
            match node {
                Node::Folder(mut folder) => {
                    folder.id = id;
                    folder.children = renumber(folder.children, counter);
                    Node::Folder(folder)
                }
                Node::Component(mut component) => {
                    component.id = id;
                    Node::Component(component)
                }
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn merge_never_shrinks_the_tree(base in forest("base"), incoming in forest("in")) {
        let base = Tree::new(renumber(base, &mut 0));
        let outcome = merge(&base, &incoming, &mut sequential_ids()).unwrap();

        prop_assert!(outcome.tree.len() >= base.len());
        for id in base.ids() {
            prop_assert!(outcome.tree.find(&id).is_some());
        }
        prop_assert!(outcome.tree.validate_ids().is_ok());
    }

    #[test]
    fn empty_incoming_is_identity(base in forest("base")) {
        let base = Tree::new(renumber(base, &mut 0));
        let outcome = merge(&base, &[], &mut sequential_ids()).unwrap();
        prop_assert_eq!(outcome.tree, base);
        prop_assert!(outcome.report.is_noop());
    }

    #[test]
    fn merging_twice_adds_nothing_new(base in forest("base"), incoming in forest("in")) {
        let base = Tree::new(renumber(base, &mut 0));
        let mut ids = sequential_ids();
        let once = merge(&base, &incoming, &mut ids).unwrap();
        let twice = merge(&once.tree, &incoming, &mut ids).unwrap();

        prop_assert_eq!(twice.tree.len(), once.tree.len());
        prop_assert_eq!(twice.report.inserted, 0);
    }
}
