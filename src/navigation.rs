//! Drill-down navigation over the hierarchy.
//!
//! The stack models "where the user currently is" as a linear path from the
//! root: each entry is a snapshot of a visited node, root-to-current. An
//! empty stack means the user is viewing the root level.
//!
//! Entries are clones taken from the tree of an earlier fetch, so after a
//! refresh the path must be re-pointed at the live tree by id -
//! [`NavigationStack::reconcile`]. Without that, the breadcrumbs silently
//! serve stale titles and counts after an edit elsewhere invalidates them.

use tracing::{debug, warn};

use crate::store::HierarchyStore;
use crate::types::{Node, NodeId};

/// A snapshot of a visited node.
///
/// `child_count` is captured at snapshot time; reconciliation compares it
/// against the live tree to detect children added or removed under an
/// entry the user drilled through.
#[derive(Debug, Clone, PartialEq)]
pub struct Breadcrumb {
    /// The visited node as it looked when visited
    pub node: Node,
    /// Number of direct children it had then
    pub child_count: usize,
}

/// Result of reconciling the stack against a freshly fetched tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every entry resolved and nothing differed; the stack was untouched
    Unchanged,
    /// Every entry resolved and at least one differed; the whole stack was
    /// replaced with fresh snapshots (same length and order)
    Refreshed,
    /// At least one entry's id is gone from the new tree; the stack was
    /// left as-is rather than guessing a fallback
    Stale { missing: Vec<NodeId> },
}

/// Ordered stack of visited nodes, root-to-current.
#[derive(Debug, Default)]
pub struct NavigationStack {
    entries: Vec<Breadcrumb>,
}

impl NavigationStack {
    /// Create an empty stack (at the root level).
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigate forward: append a snapshot of `node` to the path.
    ///
    /// Always succeeds; there is no validation that `node` is a child of
    /// the current top - that is the caller's responsibility. Callers must
    /// not navigate forward from a leaf, since leaves offer no children to
    /// select from.
    pub fn push(&mut self, node: Node, child_count: usize) {
        debug!(id = %node.id, depth = self.entries.len() + 1, "navigate forward");
        self.entries.push(Breadcrumb { node, child_count });
    }

    /// Navigate back: drop the last entry.
    ///
    /// No-op on an empty stack - never underflows.
    pub fn pop(&mut self) -> Option<Breadcrumb> {
        self.entries.pop()
    }

    /// Jump to a breadcrumb: keep entries `[0, index]` inclusive.
    ///
    /// `index = -1` is a defined input meaning "back to the root" (empty
    /// stack). An index at or beyond the current depth leaves the stack
    /// unchanged.
    pub fn truncate_to(&mut self, index: isize) {
        if index < 0 {
            self.entries.clear();
        } else {
            self.entries.truncate(index as usize + 1);
        }
    }

    /// Clear the path unconditionally.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// The node the user is currently viewing, or `None` at the root level.
    pub fn current(&self) -> Option<&Node> {
        self.entries.last().map(|e| &e.node)
    }

    /// Current depth; 0 means at the root.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    /// Whether the user is at the root level.
    pub fn is_at_root(&self) -> bool {
        self.entries.is_empty()
    }

    /// The full path for breadcrumb rendering, root-to-current.
    pub fn entries(&self) -> &[Breadcrumb] {
        &self.entries
    }

    /// Children of the current node from the live tree, or the root list
    /// when at the root level.
    ///
    /// If the current node is no longer in the tree (stale path), this is
    /// empty until the user navigates back or the stack reconciles.
    pub fn current_children<'a>(&self, store: &'a HierarchyStore) -> Vec<&'a Node> {
        match self.current() {
            Some(node) => store.children(&node.id),
            None => store.roots(),
        }
    }

    /// Re-resolve every entry against a freshly fetched tree.
    ///
    /// Policy, applied in order:
    /// 1. every entry is looked up by id in the new tree;
    /// 2. if all resolve and at least one differs (titulo, descripcion, or
    ///    direct child count), the whole stack is replaced with fresh
    ///    snapshots, preserving length and order;
    /// 3. if any id is missing, the stack is left untouched and the missing
    ///    ids are reported - the caller decides whether to force the user
    ///    back rather than this layer guessing a fallback;
    /// 4. if nothing changed the stack reference is untouched, so callers
    ///    can skip redundant re-renders.
    pub fn reconcile(&mut self, store: &HierarchyStore) -> ReconcileOutcome {
        if self.entries.is_empty() {
            return ReconcileOutcome::Unchanged;
        }

        let mut resolved = Vec::with_capacity(self.entries.len());
        let mut missing = Vec::new();

        for entry in &self.entries {
            match store.get(&entry.node.id) {
                Some(node) => {
                    let child_count = store.child_count(&node.id).unwrap_or(0);
                    resolved.push(Breadcrumb {
                        node: node.clone(),
                        child_count,
                    });
                }
                None => missing.push(entry.node.id.clone()),
            }
        }

        if !missing.is_empty() {
            warn!(?missing, "navigation stack references deleted nodes");
            return ReconcileOutcome::Stale { missing };
        }

        let changed = self.entries.iter().zip(&resolved).any(|(old, new)| {
            old.node.titulo != new.node.titulo
                || old.node.descripcion != new.node.descripcion
                || old.child_count != new.child_count
        });

        if changed {
            debug!(depth = resolved.len(), "navigation stack refreshed");
            self.entries = resolved;
            ReconcileOutcome::Refreshed
        } else {
            ReconcileOutcome::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{HierarchyPage, Level, NodePatch, NodeTree, PageInfo};
    use chrono::Utc;

    fn node(id: &str, level: Level, titulo: &str) -> Node {
        Node {
            id: NodeId::from(id),
            level,
            titulo: titulo.to_string(),
            descripcion: None,
            is_done: false,
            usuario_id: None,
            parent_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn sample_store() -> HierarchyStore {
        let page = HierarchyPage {
            roots: vec![NodeTree {
                node: node("o1", Level::Organizacion, "Personal"),
                children: vec![NodeTree {
                    node: node("v1", Level::Vision, "Salud"),
                    children: vec![NodeTree::leaf(node("m1", Level::Meta, "Correr 10k"))],
                }],
            }],
            pagination: PageInfo::single_page(1),
        };
        let mut store = HierarchyStore::new();
        store.replace_tree(page).unwrap();
        store
    }

    fn enter(stack: &mut NavigationStack, store: &HierarchyStore, id: &str) {
        let id = NodeId::from(id);
        let node = store.get(&id).unwrap().clone();
        let count = store.child_count(&id).unwrap();
        stack.push(node, count);
    }

    #[test]
    fn test_pop_on_empty_never_underflows() {
        let mut stack = NavigationStack::new();
        assert!(stack.pop().is_none());
        assert!(stack.is_at_root());
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_truncate_to_minus_one_empties() {
        let store = sample_store();
        let mut stack = NavigationStack::new();
        enter(&mut stack, &store, "o1");
        enter(&mut stack, &store, "v1");

        stack.truncate_to(-1);
        assert!(stack.is_at_root());

        // And on an already-empty stack it stays empty
        stack.truncate_to(-1);
        assert!(stack.is_at_root());
    }

    #[test]
    fn test_truncate_to_ancestor() {
        let store = sample_store();
        let mut stack = NavigationStack::new();
        enter(&mut stack, &store, "o1");
        enter(&mut stack, &store, "v1");
        enter(&mut stack, &store, "m1");

        stack.truncate_to(0);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current().unwrap().id, NodeId::from("o1"));

        // Truncating beyond the depth is a no-op
        stack.truncate_to(5);
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn test_current_children_follows_the_stack() {
        let store = sample_store();
        let mut stack = NavigationStack::new();

        // At root: the root list
        let roots = stack.current_children(&store);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].id, NodeId::from("o1"));

        enter(&mut stack, &store, "o1");
        let children = stack.current_children(&store);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, NodeId::from("v1"));

        // Leaf-ish node with no children: empty list
        enter(&mut stack, &store, "v1");
        enter(&mut stack, &store, "m1");
        assert!(stack.current_children(&store).is_empty());
    }

    #[test]
    fn test_reconcile_refreshes_stale_titles() {
        let mut store = sample_store();
        let mut stack = NavigationStack::new();
        enter(&mut stack, &store, "o1");
        enter(&mut stack, &store, "v1");

        // Tree refreshes with a renamed vision
        store.update(
            &NodeId::from("v1"),
            &NodePatch::new().with_titulo("Salud integral"),
        );

        let outcome = stack.reconcile(&store);
        assert_eq!(outcome, ReconcileOutcome::Refreshed);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.entries()[1].node.titulo, "Salud integral");
    }

    #[test]
    fn test_reconcile_detects_child_count_changes() {
        let mut store = sample_store();
        let mut stack = NavigationStack::new();
        enter(&mut stack, &store, "o1");
        enter(&mut stack, &store, "v1");

        store.insert(
            Some(&NodeId::from("v1")),
            node("m2", Level::Meta, "Dormir mejor"),
        );

        let outcome = stack.reconcile(&store);
        assert_eq!(outcome, ReconcileOutcome::Refreshed);
        assert_eq!(stack.entries()[1].child_count, 2);
    }

    #[test]
    fn test_reconcile_unchanged_when_nothing_differs() {
        let store = sample_store();
        let mut stack = NavigationStack::new();
        enter(&mut stack, &store, "o1");

        assert_eq!(stack.reconcile(&store), ReconcileOutcome::Unchanged);
    }

    #[test]
    fn test_reconcile_conservative_on_missing_entry() {
        let mut store = sample_store();
        let mut stack = NavigationStack::new();
        enter(&mut stack, &store, "o1");
        enter(&mut stack, &store, "v1");
        enter(&mut stack, &store, "m1");

        // m1 deleted upstream; also rename v1 so a non-conservative
        // implementation would be tempted to refresh
        store.remove(&NodeId::from("m1"));
        store.update(
            &NodeId::from("v1"),
            &NodePatch::new().with_titulo("Salud integral"),
        );

        let outcome = stack.reconcile(&store);
        assert_eq!(
            outcome,
            ReconcileOutcome::Stale {
                missing: vec![NodeId::from("m1")]
            }
        );
        // Stack untouched, stale title included
        assert_eq!(stack.depth(), 3);
        assert_eq!(stack.entries()[1].node.titulo, "Salud");
    }

    #[test]
    fn test_reconcile_empty_stack_is_unchanged() {
        let store = sample_store();
        let mut stack = NavigationStack::new();
        assert_eq!(stack.reconcile(&store), ReconcileOutcome::Unchanged);
    }
}
