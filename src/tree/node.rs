//! Component tree node types

use crate::error::SyncError;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Fixed set of component kinds. No other value is valid input or output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    Instruction,
    Role,
    Context,
    Format,
    Style,
}

impl ComponentType {
    pub const ALL: [ComponentType; 5] = [
        ComponentType::Instruction,
        ComponentType::Role,
        ComponentType::Context,
        ComponentType::Format,
        ComponentType::Style,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Instruction => "instruction",
            ComponentType::Role => "role",
            ComponentType::Context => "context",
            ComponentType::Format => "format",
            ComponentType::Style => "style",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentType {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComponentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                SyncError::Validation(format!(
                    "Invalid component type: {}. Must be instruction, role, context, format, or style",
                    s
                ))
            })
    }
}

/// Folder node: owns its children in display order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// Component node: a reusable text fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub content: String,
    pub component_type: ComponentType,
}

/// Tree element, tagged on the wire by `"type"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Folder(Folder),
    Component(Component),
}

impl Node {
    pub fn folder(id: impl Into<NodeId>, name: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Folder(Folder {
            id: id.into(),
            name: name.into(),
            children,
        })
    }

    pub fn component(
        id: impl Into<NodeId>,
        name: impl Into<String>,
        component_type: ComponentType,
        content: impl Into<String>,
    ) -> Self {
        Node::Component(Component {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            component_type,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Node::Folder(folder) => &folder.id,
            Node::Component(component) => &component.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Node::Folder(folder) => &folder.name,
            Node::Component(component) => &component.name,
        }
    }

    /// Number of nodes in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        match self {
            Node::Folder(folder) => 1 + folder.children.iter().map(Node::subtree_len).sum::<usize>(),
            Node::Component(_) => 1,
        }
    }
}

/// Ordered forest of top-level nodes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tree {
    pub roots: Vec<Node>,
}

impl Tree {
    pub fn new(roots: Vec<Node>) -> Self {
        Self { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total node count across the forest
    pub fn len(&self) -> usize {
        self.roots.iter().map(Node::subtree_len).sum()
    }

    pub fn component_count(&self) -> usize {
        let mut count = 0;
        self.walk(|node, _| {
            if matches!(node, Node::Component(_)) {
                count += 1;
            }
        });
        count
    }

    /// Depth-first, pre-order traversal. The callback receives the node depth.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&Node, usize),
    {
        fn walk_nodes<F: FnMut(&Node, usize)>(nodes: &[Node], depth: usize, visit: &mut F) {
            for node in nodes {
                visit(node, depth);
                if let Node::Folder(folder) = node {
                    walk_nodes(&folder.children, depth + 1, visit);
                }
            }
        }
        walk_nodes(&self.roots, 0, &mut visit);
    }

    pub fn find(&self, id: &str) -> Option<&Node> {
        fn find_in<'a>(nodes: &'a [Node], id: &str) -> Option<&'a Node> {
            for node in nodes {
                if node.id() == id {
                    return Some(node);
                }
                if let Node::Folder(folder) = node {
                    if let Some(found) = find_in(&folder.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        find_in(&self.roots, id)
    }

    pub fn ids(&self) -> HashSet<NodeId> {
        let mut ids = HashSet::new();
        self.walk(|node, _| {
            ids.insert(node.id().to_string());
        });
        ids
    }

    /// Check that every id is non-empty and unique across the forest.
    pub fn validate_ids(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        let mut problem = None;
        self.walk(|node, _| {
            if problem.is_some() {
                return;
            }
            if node.id().trim().is_empty() {
                problem = Some(format!("node '{}' has an empty id", node.name()));
            } else if !seen.insert(node.id().to_string()) {
                problem = Some(format!("duplicate node id '{}'", node.id()));
            }
        });
        match problem {
            Some(message) => Err(message),
            None => Ok(()),
        }
    }
}
