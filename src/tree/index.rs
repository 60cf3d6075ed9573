//! Identity index over a component tree.
//!
//! Maps each component's `(name, componentType)` key to its position in the
//! forest. Positions are index paths (`[root, child, grandchild, ..]`); the
//! merge engine only ever appends to child lists, so recorded paths stay valid
//! for the whole merge.

use crate::tree::node::{ComponentType, Node, Tree};
use std::collections::HashMap;

/// Identity of a component for merge purposes. Content is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub component_type: ComponentType,
}

impl IdentityKey {
    pub fn new(name: impl Into<String>, component_type: ComponentType) -> Self {
        Self {
            name: name.into(),
            component_type,
        }
    }
}

/// Index path from the forest root to a node
pub type NodePath = Vec<usize>;

#[derive(Debug, Default)]
pub struct IdentityIndex {
    entries: HashMap<IdentityKey, NodePath>,
}

impl IdentityIndex {
    /// Index every component in `tree`. When the tree already holds two
    /// components with the same key, the first in depth-first order is kept.
    pub fn build(tree: &Tree) -> Self {
        let mut index = Self::default();
        let mut path = Vec::new();
        index.index_nodes(&tree.roots, &mut path);
        index
    }

    fn index_nodes(&mut self, nodes: &[Node], path: &mut NodePath) {
        for (position, node) in nodes.iter().enumerate() {
            path.push(position);
            match node {
                Node::Component(component) => {
                    self.entries
                        .entry(IdentityKey::new(
                            component.name.clone(),
                            component.component_type,
                        ))
                        .or_insert_with(|| path.clone());
                }
                Node::Folder(folder) => self.index_nodes(&folder.children, path),
            }
            path.pop();
        }
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&NodePath> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: IdentityKey, path: NodePath) {
        self.entries.insert(key, path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolve an index path to a mutable node.
pub fn node_at_mut<'a>(roots: &'a mut [Node], path: &[usize]) -> Option<&'a mut Node> {
    let (first, rest) = path.split_first()?;
    let mut node = roots.get_mut(*first)?;
    for position in rest {
        node = match node {
            Node::Folder(folder) => folder.children.get_mut(*position)?,
            Node::Component(_) => return None,
        };
    }
    Some(node)
}
