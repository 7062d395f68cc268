//! The hierarchy store - canonical in-memory representation of the tree.
//!
//! Nodes live in a flat id-indexed arena: each record holds the entity plus
//! an ordered list of child ids, and the store keeps an ordered root list.
//! Mutation by id is an indexed lookup instead of a tree walk, and "children
//! of X" is O(1).
//!
//! Local mutations are optimistic and never fail: when the target id is
//! absent they are no-ops and report `false`, so callers can decide whether
//! a missed patch warrants a refetch. Only [`HierarchyStore::replace_tree`]
//! can reject input - a fetched page with colliding ids is refused wholesale
//! and the previous tree retained.

use std::collections::HashMap;

use tracing::debug;

use crate::error::StoreError;
use crate::types::{HierarchyPage, Node, NodeId, NodePatch, NodeTree};

/// A node plus its ordered child ids.
#[derive(Debug, Clone)]
struct NodeRecord {
    node: Node,
    children: Vec<NodeId>,
}

/// Canonical in-memory tree, indexed by id.
#[derive(Debug, Default)]
pub struct HierarchyStore {
    /// Root ids in backend order
    roots: Vec<NodeId>,
    /// Flat arena: id → record
    nodes: HashMap<NodeId, NodeRecord>,
}

impl HierarchyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire tree atomically from a fetched hierarchy page.
    ///
    /// The new index is built completely before it is swapped in: on error
    /// (duplicate id, child at the wrong level) the previous contents are
    /// retained untouched.
    pub fn replace_tree(&mut self, page: HierarchyPage) -> Result<(), StoreError> {
        let mut roots = Vec::with_capacity(page.roots.len());
        let mut nodes = HashMap::new();

        for tree in page.roots {
            roots.push(tree.node.id.clone());
            Self::index_tree(tree, None, &mut nodes)?;
        }

        debug!(roots = roots.len(), nodes = nodes.len(), "replaced tree");
        self.roots = roots;
        self.nodes = nodes;
        Ok(())
    }

    /// Recursively index a subtree into `nodes`, normalizing `parent_id`
    /// from the nesting position.
    fn index_tree(
        tree: NodeTree,
        parent: Option<&Node>,
        nodes: &mut HashMap<NodeId, NodeRecord>,
    ) -> Result<(), StoreError> {
        let NodeTree { mut node, children } = tree;

        if let Some(parent) = parent {
            if parent.level.child() != Some(node.level) {
                return Err(StoreError::InvalidChildLevel {
                    parent: parent.id.clone(),
                    child: node.id,
                });
            }
            node.parent_id = Some(parent.id.clone());
        } else {
            node.parent_id = None;
        }

        let id = node.id.clone();
        let this = node.clone();
        let child_ids: Vec<NodeId> = children.iter().map(|c| c.node.id.clone()).collect();

        if nodes
            .insert(
                id.clone(),
                NodeRecord {
                    node,
                    children: child_ids,
                },
            )
            .is_some()
        {
            return Err(StoreError::DuplicateId(id));
        }

        for child in children {
            Self::index_tree(child, Some(&this), nodes)?;
        }
        Ok(())
    }

    /// Insert a gateway-assigned node.
    ///
    /// With `parent_id = None` the node is appended as a new root (it must
    /// be at the root level); otherwise it is appended at the end of the
    /// named parent's child list. Returns `false` and leaves the tree
    /// unchanged when the parent is absent, the node's level does not
    /// follow the parent's, or the id already exists. The store never
    /// mints ids - the caller must supply an entity the gateway returned.
    pub fn insert(&mut self, parent_id: Option<&NodeId>, mut node: Node) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }

        match parent_id {
            None => {
                if node.level.parent().is_some() {
                    return false;
                }
                node.parent_id = None;
                let id = node.id.clone();
                self.nodes.insert(
                    id.clone(),
                    NodeRecord {
                        node,
                        children: Vec::new(),
                    },
                );
                self.roots.push(id);
            }
            Some(parent_id) => {
                match self.nodes.get(parent_id) {
                    Some(parent) if parent.node.level.child() == Some(node.level) => {}
                    _ => return false,
                }
                node.parent_id = Some(parent_id.clone());
                let id = node.id.clone();
                self.nodes.insert(
                    id.clone(),
                    NodeRecord {
                        node,
                        children: Vec::new(),
                    },
                );
                if let Some(parent) = self.nodes.get_mut(parent_id) {
                    parent.children.push(id);
                }
            }
        }

        debug!(parent = ?parent_id, "inserted node");
        true
    }

    /// Merge a partial patch into the node with the given id.
    ///
    /// Returns `false` if the id is not in the tree. All other nodes are
    /// untouched - ids are unique across the forest, so the patch lands on
    /// at most one node.
    pub fn update(&mut self, id: &NodeId, patch: &NodePatch) -> bool {
        match self.nodes.get_mut(id) {
            Some(record) => {
                patch.apply(&mut record.node);
                debug!(%id, "patched node");
                true
            }
            None => false,
        }
    }

    /// Replace a stored node's entity fields from a gateway-returned copy.
    ///
    /// Structural fields (parent, children) are kept; the entity data
    /// including `updated_at` comes from the returned copy. Returns `false`
    /// if the id is not in the tree.
    pub fn replace_entity(&mut self, node: &Node) -> bool {
        match self.nodes.get_mut(&node.id) {
            Some(record) => {
                record.node.titulo = node.titulo.clone();
                record.node.descripcion = node.descripcion.clone();
                record.node.is_done = node.is_done;
                record.node.usuario_id = node.usuario_id.clone();
                record.node.updated_at = node.updated_at;
                true
            }
            None => false,
        }
    }

    /// Remove the node with the given id and discard its entire subtree.
    ///
    /// Returns `false` if the id is absent, so deletion is idempotent.
    /// Descendants are dropped from the index along with the node - the
    /// store never keeps orphaned records.
    pub fn remove(&mut self, id: &NodeId) -> bool {
        let Some(record) = self.nodes.get(id) else {
            return false;
        };

        let parent_id = record.node.parent_id.clone();
        match parent_id {
            Some(parent_id) => {
                if let Some(parent) = self.nodes.get_mut(&parent_id) {
                    parent.children.retain(|c| c != id);
                }
            }
            None => self.roots.retain(|r| r != id),
        }

        // Drop the whole subtree from the index
        let mut pending = vec![id.clone()];
        let mut dropped = 0usize;
        while let Some(next) = pending.pop() {
            if let Some(record) = self.nodes.remove(&next) {
                pending.extend(record.children);
                dropped += 1;
            }
        }

        debug!(%id, dropped, "removed subtree");
        true
    }

    /// Get a node by id.
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id).map(|r| &r.node)
    }

    /// Whether the id is present in the tree.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Direct children of a node, in insertion order.
    ///
    /// Empty for leaves and for ids not in the tree.
    pub fn children(&self, id: &NodeId) -> Vec<&Node> {
        self.nodes
            .get(id)
            .map(|record| {
                record
                    .children
                    .iter()
                    .filter_map(|c| self.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of direct children, or `None` if the id is not in the tree.
    pub fn child_count(&self, id: &NodeId) -> Option<usize> {
        self.nodes.get(id).map(|r| r.children.len())
    }

    /// Root nodes in backend order.
    pub fn roots(&self) -> Vec<&Node> {
        self.roots.iter().filter_map(|id| self.get(id)).collect()
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop the entire tree.
    pub fn clear(&mut self) {
        self.roots.clear();
        self.nodes.clear();
    }

    /// Export the tree back into nested form, in stored order.
    pub fn export_trees(&self) -> Vec<NodeTree> {
        self.roots
            .iter()
            .filter_map(|id| self.export_subtree(id))
            .collect()
    }

    fn export_subtree(&self, id: &NodeId) -> Option<NodeTree> {
        let record = self.nodes.get(id)?;
        Some(NodeTree {
            node: record.node.clone(),
            children: record
                .children
                .iter()
                .filter_map(|c| self.export_subtree(c))
                .collect(),
        })
    }
}
