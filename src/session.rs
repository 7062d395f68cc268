//! Session - owns the tree, the navigation path, and the gateway handle.
//!
//! A session is created after successful authentication and dropped on
//! logout; tree and stack never outlive it. All state mutation flows
//! through here, so the write discipline lives here too: every successful
//! create/update/delete applies an optimistic local patch from the single
//! returned entity, and [`Session::refresh`] (a full hierarchy refetch) is
//! the manual or periodic reconciliation backstop rather than an automatic
//! follow-up to every write.
//!
//! Error policy (never swallowed, never auto-retried):
//! - `Network`/`Server`/`Validation`: state untouched, error surfaced;
//! - `NotFound` on a write: the target vanished server-side, so the
//!   session refetches the whole tree before surfacing the error;
//! - `Auth`: fatal for the session - tree and stack are cleared, since the
//!   next successful fetch could belong to a different user.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{GatewayError, SessionError};
use crate::gateway::{CreateRequest, Gateway, UpdateRequest};
use crate::navigation::{Breadcrumb, NavigationStack, ReconcileOutcome};
use crate::store::HierarchyStore;
use crate::types::{HierarchyQuery, ItemDraft, Level, Node, NodeId, NodePatch};

/// A signed-in user's view of their hierarchy.
pub struct Session {
    gateway: Arc<dyn Gateway>,
    store: HierarchyStore,
    nav: NavigationStack,
    query: HierarchyQuery,
}

impl Session {
    /// Create a session over the given gateway. The tree starts empty;
    /// call [`Session::refresh`] to load it.
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        info!("session created");
        Self {
            gateway,
            store: HierarchyStore::new(),
            nav: NavigationStack::new(),
            query: HierarchyQuery::default(),
        }
    }

    /// Builder: set the hierarchy query used by every refresh.
    pub fn with_query(mut self, query: HierarchyQuery) -> Self {
        self.query = query;
        self
    }

    /// Change the hierarchy query for subsequent refreshes.
    pub fn set_query(&mut self, query: HierarchyQuery) {
        self.query = query;
    }

    /// The live tree.
    pub fn store(&self) -> &HierarchyStore {
        &self.store
    }

    /// The navigation path.
    pub fn navigation(&self) -> &NavigationStack {
        &self.nav
    }

    /// Refetch the whole hierarchy and reconcile the navigation path.
    ///
    /// On gateway failure the previous tree and stack are retained.
    /// Concurrent refreshes are not coalesced - whichever response is
    /// applied last wins the whole tree.
    pub async fn refresh(&mut self) -> Result<ReconcileOutcome, SessionError> {
        debug!("refreshing hierarchy");
        let page = match self.gateway.fetch_hierarchy(&self.query).await {
            Ok(page) => page,
            Err(err) => return Err(self.fail(err)),
        };

        self.store.replace_tree(page)?;
        let outcome = self.nav.reconcile(&self.store);
        info!(nodes = self.store.len(), "hierarchy refreshed");
        Ok(outcome)
    }

    /// Create a new item under `parent_id`, or a new root when `None`.
    ///
    /// The child's level is derived from the parent's; creating under a
    /// Tarea fails before any network call. On success the returned entity
    /// is appended into the local tree.
    pub async fn create_child(
        &mut self,
        parent_id: Option<&NodeId>,
        draft: ItemDraft,
    ) -> Result<Node, SessionError> {
        let level = match parent_id {
            None => Level::Organizacion,
            Some(parent_id) => {
                let parent = self
                    .store
                    .get(parent_id)
                    .ok_or_else(|| SessionError::UnknownNode(parent_id.clone()))?;
                parent
                    .level
                    .child()
                    .ok_or_else(|| SessionError::LeafCannotHaveChildren(parent_id.clone()))?
            }
        };

        let req = CreateRequest::from_draft(draft, parent_id.cloned());
        let node = match self.gateway.create(level, &req).await {
            Ok(node) => node,
            Err(err) => return Err(self.fail_write(err).await),
        };

        self.store.insert(parent_id, node.clone());
        self.nav.reconcile(&self.store);
        debug!(id = %node.id, level = level.as_str(), "created item");
        Ok(node)
    }

    /// Partially update an item; only supplied fields change.
    ///
    /// On success the returned entity is merged into the local tree and
    /// the navigation path refreshed if it references the item.
    pub async fn update_item(
        &mut self,
        id: &NodeId,
        patch: NodePatch,
    ) -> Result<Node, SessionError> {
        let level = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownNode(id.clone()))?
            .level;

        let req = UpdateRequest {
            id: id.clone(),
            patch,
        };
        let node = match self.gateway.update(level, &req).await {
            Ok(node) => node,
            Err(err) => return Err(self.fail_write(err).await),
        };

        self.store.replace_entity(&node);
        self.nav.reconcile(&self.store);
        debug!(id = %node.id, "updated item");
        Ok(node)
    }

    /// Flip the done flag of exactly this item - completion never cascades
    /// to ancestors or descendants.
    pub async fn toggle_done(&mut self, id: &NodeId) -> Result<Node, SessionError> {
        let is_done = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownNode(id.clone()))?
            .is_done;
        self.update_item(id, NodePatch::new().with_is_done(!is_done))
            .await
    }

    /// Delete an item.
    ///
    /// Locally the item's whole subtree is discarded; the backend cascades
    /// the deletion server-side, and the next refresh is the final source
    /// of truth.
    pub async fn delete_item(&mut self, id: &NodeId) -> Result<(), SessionError> {
        let level = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownNode(id.clone()))?
            .level;

        if let Err(err) = self.gateway.delete(level, id).await {
            return Err(self.fail_write(err).await);
        }

        self.store.remove(id);
        self.nav.reconcile(&self.store);
        debug!(%id, "deleted item");
        Ok(())
    }

    /// Drill into a node. Unlike the raw stack push, this validates that
    /// the node exists in the live tree.
    pub fn enter(&mut self, id: &NodeId) -> Result<(), SessionError> {
        let node = self
            .store
            .get(id)
            .ok_or_else(|| SessionError::UnknownNode(id.clone()))?
            .clone();
        let child_count = self.store.child_count(id).unwrap_or(0);
        self.nav.push(node, child_count);
        Ok(())
    }

    /// Navigate back one level; no-op at the root.
    pub fn back(&mut self) {
        self.nav.pop();
    }

    /// Jump to a breadcrumb index; `-1` returns to the root.
    pub fn jump_to(&mut self, index: isize) {
        self.nav.truncate_to(index);
    }

    /// Return to the root level.
    pub fn reset_navigation(&mut self) {
        self.nav.reset();
    }

    /// The node currently being viewed, or `None` at the root level.
    pub fn current(&self) -> Option<&Node> {
        self.nav.current()
    }

    /// Children of the current node, or the root list at the root level.
    pub fn current_children(&self) -> Vec<&Node> {
        self.nav.current_children(&self.store)
    }

    /// The full path for breadcrumb rendering.
    pub fn breadcrumbs(&self) -> &[Breadcrumb] {
        self.nav.entries()
    }

    /// Drop all local state (tree and navigation path).
    pub fn clear(&mut self) {
        self.store.clear();
        self.nav.reset();
    }

    /// Handle a failed read: `Auth` clears the session, everything else
    /// leaves state intact for a caller-driven retry.
    fn fail(&mut self, err: GatewayError) -> SessionError {
        if err.is_fatal() {
            warn!("authentication rejected, clearing session state");
            self.clear();
        }
        SessionError::Gateway(err)
    }

    /// Handle a failed write: on `NotFound` the target vanished
    /// server-side, so resynchronize with a full refetch before surfacing
    /// the error.
    async fn fail_write(&mut self, err: GatewayError) -> SessionError {
        if matches!(err, GatewayError::NotFound(_)) {
            if let Err(refresh_err) = self.refresh().await {
                warn!(error = %refresh_err, "resync after NotFound failed");
            }
            return SessionError::Gateway(err);
        }
        self.fail(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockGateway;
    use crate::types::NodeTree;
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

    fn seeded_session() -> Session {
        let seed = vec![NodeTree {
            node: node("o1", Level::Organizacion, "Personal"),
            children: vec![NodeTree {
                node: node("v1", Level::Vision, "Salud"),
                children: vec![NodeTree {
                    node: node("m1", Level::Meta, "Correr 10k"),
                    children: vec![NodeTree {
                        node: node("ob1", Level::Objetivo, "Base aerobica"),
                        children: vec![NodeTree {
                            node: node("mi1", Level::Mision, "Semana 1"),
                            children: vec![NodeTree::leaf(node(
                                "t1",
                                Level::Tarea,
                                "Trotar 20 min",
                            ))],
                        }],
                    }],
                }],
            }],
        }];
        Session::new(Arc::new(MockGateway::with_seed(seed)))
    }

    #[tokio::test]
    async fn test_refresh_loads_tree() {
        let mut session = seeded_session();
        assert!(session.store().is_empty());

        session.refresh().await.unwrap();
        assert_eq!(session.store().len(), 6);
        assert_eq!(session.current_children().len(), 1);
    }

    #[tokio::test]
    async fn test_create_guards_run_before_any_network_call() {
        let mut session = seeded_session();
        session.refresh().await.unwrap();

        // Unknown parent
        let result = session
            .create_child(Some(&NodeId::from("nope")), ItemDraft::new("Sin padre"))
            .await;
        assert!(matches!(result, Err(SessionError::UnknownNode(_))));

        // Tarea is a leaf - nothing can be created under it
        let result = session
            .create_child(Some(&NodeId::from("t1")), ItemDraft::new("Subtarea"))
            .await;
        assert!(matches!(
            result,
            Err(SessionError::LeafCannotHaveChildren(_))
        ));
    }

    #[tokio::test]
    async fn test_toggle_done_flips_only_target() {
        let mut session = seeded_session();
        session.refresh().await.unwrap();

        let m1 = NodeId::from("m1");
        let updated = session.toggle_done(&m1).await.unwrap();
        assert!(updated.is_done);

        // Ancestors untouched
        assert!(!session.store().get(&NodeId::from("v1")).unwrap().is_done);
        assert!(!session.store().get(&NodeId::from("o1")).unwrap().is_done);

        let updated = session.toggle_done(&m1).await.unwrap();
        assert!(!updated.is_done);
    }
}
