//! Tree Merge Engine
//!
//! Reconciles a base component tree with incoming nodes from an import file or
//! a remote snapshot. The merge is non-destructive: it only adds nodes or
//! updates matched components in place, so the node count never decreases.
//!
//! Matching rules:
//! - components match by identity key `(name, componentType)` anywhere in the
//!   base tree; a match takes the incoming `content` and `componentType` and
//!   keeps its id and position (last writer wins)
//! - folders match by name among the folders at the same level
//! - unmatched top-level components land in the default container folder;
//!   unmatched nested components land in their (matched or new) parent folder

use crate::error::SyncError;
use crate::tree::index::{node_at_mut, IdentityIndex, IdentityKey, NodePath};
use crate::tree::node::{Component, Folder, Node, Tree};
use crate::types::NodeId;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Name of the root-level folder that receives unmatched top-level components.
pub const DEFAULT_CONTAINER_NAME: &str = "Imported";

/// Id given to a newly created default container unless the tree already uses it.
pub const DEFAULT_CONTAINER_ID: &str = "imported";

/// Attempts to obtain an unused id from the generator before giving up.
const MAX_ID_ATTEMPTS: usize = 8;

/// Counts describing what a merge changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Matched components whose content or type changed
    pub updated: usize,
    /// Matched components that were already identical
    pub unchanged: usize,
    /// New components inserted
    pub inserted: usize,
    /// New folders created (including the default container)
    pub folders_created: usize,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.updated == 0 && self.inserted == 0 && self.folders_created == 0
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub tree: Tree,
    pub report: MergeReport,
}

/// Merge `incoming` into a copy of `base`.
///
/// Incoming node ids are ignored; new nodes get ids from `next_id`. Duplicate
/// identity keys within `incoming` resolve to the last occurrence. On error the
/// caller's `base` is untouched.
pub fn merge<G>(base: &Tree, incoming: &[Node], next_id: &mut G) -> Result<MergeOutcome, SyncError>
where
    G: FnMut() -> NodeId,
{
    if incoming.is_empty() {
        return Ok(MergeOutcome {
            tree: base.clone(),
            report: MergeReport::default(),
        });
    }

    validate_incoming(incoming)?;

    let mut merger = TreeMerger {
        index: IdentityIndex::build(base),
        used_ids: base.ids(),
        tree: base.clone(),
        default_container: None,
        report: MergeReport::default(),
        next_id,
    };

    for node in incoming {
        merger.merge_node(node, None)?;
    }

    debug!(
        updated = merger.report.updated,
        unchanged = merger.report.unchanged,
        inserted = merger.report.inserted,
        folders_created = merger.report.folders_created,
        "Merged incoming nodes"
    );

    Ok(MergeOutcome {
        tree: merger.tree,
        report: merger.report,
    })
}

/// Reject incoming entries whose identity key cannot be formed.
pub fn validate_incoming(incoming: &[Node]) -> Result<(), SyncError> {
    for node in incoming {
        if node.name().trim().is_empty() {
            let kind = match node {
                Node::Folder(_) => "folder",
                Node::Component(_) => "component",
            };
            return Err(SyncError::Validation(format!(
                "Incoming {} '{}' has an empty name",
                kind,
                node.id()
            )));
        }
        if let Node::Folder(folder) = node {
            validate_incoming(&folder.children)?;
        }
    }
    Ok(())
}

struct TreeMerger<'g, G> {
    tree: Tree,
    index: IdentityIndex,
    used_ids: HashSet<NodeId>,
    default_container: Option<NodePath>,
    report: MergeReport,
    next_id: &'g mut G,
}

impl<'g, G> TreeMerger<'g, G>
where
    G: FnMut() -> NodeId,
{
    /// `parent` is the base folder the incoming node sits under; `None` means
    /// the incoming node is top level.
    fn merge_node(&mut self, node: &Node, parent: Option<&NodePath>) -> Result<(), SyncError> {
        match node {
            Node::Component(component) => self.merge_component(component, parent),
            Node::Folder(folder) => {
                let folder_path = self.resolve_folder(folder, parent)?;
                for child in &folder.children {
                    self.merge_node(child, Some(&folder_path))?;
                }
                Ok(())
            }
        }
    }

    fn merge_component(
        &mut self,
        incoming: &Component,
        parent: Option<&NodePath>,
    ) -> Result<(), SyncError> {
        let key = IdentityKey::new(incoming.name.clone(), incoming.component_type);

        if let Some(path) = self.index.get(&key) {
            let Some(Node::Component(existing)) = node_at_mut(&mut self.tree.roots, path) else {
                return Err(SyncError::Validation(format!(
                    "Identity index points at a non-component for '{}'",
                    incoming.name
                )));
            };
            if existing.content == incoming.content
                && existing.component_type == incoming.component_type
            {
                self.report.unchanged += 1;
            } else {
                existing.content = incoming.content.clone();
                existing.component_type = incoming.component_type;
                self.report.updated += 1;
            }
            return Ok(());
        }

        let id = self.mint_id()?;
        let container = match parent {
            Some(path) => path.clone(),
            None => self.default_container()?,
        };
        let path = self.append_child(
            Some(&container),
            Node::Component(Component {
                id,
                name: incoming.name.clone(),
                content: incoming.content.clone(),
                component_type: incoming.component_type,
            }),
        )?;
        self.index.insert(key, path);
        self.report.inserted += 1;
        Ok(())
    }

    /// Find the base folder matching `incoming` by name at the parent level,
    /// creating it when absent.
    fn resolve_folder(
        &mut self,
        incoming: &Folder,
        parent: Option<&NodePath>,
    ) -> Result<NodePath, SyncError> {
        if let Some(path) = self.find_folder(parent, &incoming.name)? {
            return Ok(path);
        }
        let id = self.mint_id()?;
        self.report.folders_created += 1;
        self.append_child(
            parent,
            Node::Folder(Folder {
                id,
                name: incoming.name.clone(),
                children: Vec::new(),
            }),
        )
    }

    fn default_container(&mut self) -> Result<NodePath, SyncError> {
        if let Some(path) = &self.default_container {
            return Ok(path.clone());
        }
        let path = match self.find_folder(None, DEFAULT_CONTAINER_NAME)? {
            Some(path) => path,
            None => {
                let id = if self.used_ids.insert(DEFAULT_CONTAINER_ID.to_string()) {
                    DEFAULT_CONTAINER_ID.to_string()
                } else {
                    self.mint_id()?
                };
                self.report.folders_created += 1;
                self.append_child(
                    None,
                    Node::Folder(Folder {
                        id,
                        name: DEFAULT_CONTAINER_NAME.to_string(),
                        children: Vec::new(),
                    }),
                )?
            }
        };
        self.default_container = Some(path.clone());
        Ok(path)
    }

    fn find_folder(
        &mut self,
        parent: Option<&NodePath>,
        name: &str,
    ) -> Result<Option<NodePath>, SyncError> {
        let siblings = self.children_mut(parent)?;
        let position = siblings
            .iter()
            .position(|node| matches!(node, Node::Folder(folder) if folder.name == name));
        Ok(position.map(|position| child_path(parent, position)))
    }

    fn append_child(&mut self, parent: Option<&NodePath>, node: Node) -> Result<NodePath, SyncError> {
        let siblings = self.children_mut(parent)?;
        siblings.push(node);
        let position = siblings.len() - 1;
        Ok(child_path(parent, position))
    }

    fn children_mut(&mut self, parent: Option<&NodePath>) -> Result<&mut Vec<Node>, SyncError> {
        match parent {
            None => Ok(&mut self.tree.roots),
            Some(path) => match node_at_mut(&mut self.tree.roots, path) {
                Some(Node::Folder(folder)) => Ok(&mut folder.children),
                _ => Err(SyncError::Validation(format!(
                    "Merge target {:?} is not a folder",
                    path
                ))),
            },
        }
    }

    fn mint_id(&mut self) -> Result<NodeId, SyncError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = (self.next_id)();
            if !id.trim().is_empty() && self.used_ids.insert(id.clone()) {
                return Ok(id);
            }
        }
        Err(SyncError::Validation(
            "Id generator did not produce a fresh unique id".to_string(),
        ))
    }
}

fn child_path(parent: Option<&NodePath>, position: usize) -> NodePath {
    let mut path = parent.cloned().unwrap_or_default();
    path.push(position);
    path
}
