//! Mock gateway for tests and offline development.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Mutex;

use super::traits::{CreateRequest, Gateway, UpdateRequest};
use crate::error::GatewayError;
use crate::store::HierarchyStore;
use crate::types::{
    HierarchyPage, HierarchyQuery, Level, Node, NodeId, NodeTree, PageInfo,
};

/// In-memory gateway backed by its own hierarchy store.
///
/// Mints uuid ids and timestamps the way the backend would, enforces the
/// backend's basic validation (non-empty titles, known parents), and
/// supports one-shot failure injection plus call counting for tests.
pub struct MockGateway {
    state: Mutex<HierarchyStore>,
    fail_next: Mutex<Option<GatewayError>>,
    call_count: AtomicU32,
}

impl MockGateway {
    /// Create an empty mock backend.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(HierarchyStore::new()),
            fail_next: Mutex::new(None),
            call_count: AtomicU32::new(0),
        }
    }

    /// Create a mock backend pre-seeded with the given root trees.
    pub fn with_seed(roots: Vec<NodeTree>) -> Self {
        let mut state = HierarchyStore::new();
        let total = roots.len() as u64;
        state
            .replace_tree(HierarchyPage {
                roots,
                pagination: PageInfo::single_page(total),
            })
            .expect("valid seed hierarchy");

        Self {
            state: Mutex::new(state),
            fail_next: Mutex::new(None),
            call_count: AtomicU32::new(0),
        }
    }

    /// Fail the next gateway call with `err`, then resume normal behavior.
    pub async fn inject_failure(&self, err: GatewayError) {
        *self.fail_next.lock().await = Some(err);
    }

    /// Number of gateway calls made so far.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Reset the call counter.
    pub fn reset_call_count(&self) {
        self.call_count.store(0, Ordering::SeqCst);
    }

    /// Whether the backing state contains the id (for test assertions).
    pub async fn contains(&self, id: &NodeId) -> bool {
        self.state.lock().await.contains(id)
    }

    /// Snapshot of the backing state as nested trees.
    pub async fn export(&self) -> Vec<NodeTree> {
        self.state.lock().await.export_trees()
    }

    /// Count the call and pop any injected failure.
    async fn begin_call(&self) -> Result<(), GatewayError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.fail_next.lock().await.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn mint_node(level: Level, req: &CreateRequest) -> Node {
        let now = Utc::now();
        Node {
            id: NodeId::from(uuid::Uuid::new_v4().to_string()),
            level,
            titulo: req.titulo.clone(),
            descripcion: req.descripcion.clone(),
            is_done: false,
            usuario_id: None,
            parent_id: req.parent_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn fetch_hierarchy(
        &self,
        query: &HierarchyQuery,
    ) -> Result<HierarchyPage, GatewayError> {
        self.begin_call().await?;
        let state = self.state.lock().await;

        let mut roots = state.export_trees();
        if let Some(search) = &query.search {
            let needle = search.to_lowercase();
            roots.retain(|tree| tree.node.titulo.to_lowercase().contains(&needle));
        }

        let total = roots.len() as u64;
        Ok(HierarchyPage {
            roots,
            pagination: PageInfo::single_page(total),
        })
    }

    async fn create(&self, level: Level, req: &CreateRequest) -> Result<Node, GatewayError> {
        self.begin_call().await?;

        if req.titulo.trim().is_empty() {
            return Err(GatewayError::Validation("titulo must not be empty".into()));
        }

        let mut state = self.state.lock().await;
        if let Some(parent_id) = &req.parent_id {
            if !state.contains(parent_id) {
                return Err(GatewayError::NotFound(format!(
                    "parent {} not found",
                    parent_id
                )));
            }
        }

        let node = Self::mint_node(level, req);
        if !state.insert(req.parent_id.as_ref(), node.clone()) {
            return Err(GatewayError::Validation(format!(
                "cannot create {} under that parent",
                level.as_str()
            )));
        }
        Ok(node)
    }

    async fn update(&self, level: Level, req: &UpdateRequest) -> Result<Node, GatewayError> {
        self.begin_call().await?;

        let mut state = self.state.lock().await;
        let Some(existing) = state.get(&req.id) else {
            return Err(GatewayError::NotFound(format!(
                "{} {} not found",
                level.as_str(),
                req.id
            )));
        };

        let mut node = existing.clone();
        req.patch.apply(&mut node);
        node.updated_at = Utc::now();
        state.replace_entity(&node);
        Ok(node)
    }

    async fn delete(&self, level: Level, id: &NodeId) -> Result<(), GatewayError> {
        self.begin_call().await?;

        let mut state = self.state.lock().await;
        if !state.remove(id) {
            return Err(GatewayError::NotFound(format!(
                "{} {} not found",
                level.as_str(),
                id
            )));
        }
        Ok(())
    }

    async fn list(&self, level: Level) -> Result<Vec<Node>, GatewayError> {
        self.begin_call().await?;

        let state = self.state.lock().await;
        let mut nodes = Vec::new();
        let mut pending = state.export_trees();
        while let Some(tree) = pending.pop() {
            if tree.node.level == level {
                nodes.push(tree.node);
            }
            pending.extend(tree.children);
        }
        Ok(nodes)
    }

    async fn fetch_one(&self, level: Level, id: &NodeId) -> Result<Node, GatewayError> {
        self.begin_call().await?;

        let state = self.state.lock().await;
        state.get(id).cloned().ok_or_else(|| {
            GatewayError::NotFound(format!("{} {} not found", level.as_str(), id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Vec<NodeTree> {
        let now = Utc::now();
        let node = |id: &str, level: Level, titulo: &str| Node {
            id: NodeId::from(id),
            level,
            titulo: titulo.to_string(),
            descripcion: None,
            is_done: false,
            usuario_id: None,
            parent_id: None,
            created_at: now,
            updated_at: now,
        };
        vec![NodeTree {
            node: node("o1", Level::Organizacion, "Personal"),
            children: vec![NodeTree::leaf(node("v1", Level::Vision, "Salud"))],
        }]
    }

    #[tokio::test]
    async fn test_create_mints_id_and_timestamps() {
        let mock = MockGateway::with_seed(seed());
        let req = CreateRequest {
            titulo: "Correr 10k".into(),
            descripcion: None,
            parent_id: Some(NodeId::from("v1")),
        };

        let node = mock.create(Level::Meta, &req).await.unwrap();
        assert!(!node.id.as_str().is_empty());
        assert_eq!(node.level, Level::Meta);
        assert_eq!(node.parent_id, Some(NodeId::from("v1")));
        assert!(mock.contains(&node.id).await);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_titulo() {
        let mock = MockGateway::with_seed(seed());
        let req = CreateRequest {
            titulo: "  ".into(),
            descripcion: None,
            parent_id: Some(NodeId::from("v1")),
        };
        let err = mock.create(Level::Meta, &req).await.unwrap_err();
        assert!(matches!(err, GatewayError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let mock = MockGateway::with_seed(seed());
        let req = UpdateRequest {
            id: NodeId::from("nope"),
            patch: crate::types::NodePatch::new().with_is_done(true),
        };
        let err = mock.update(Level::Meta, &req).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_injected_failure_fires_once() {
        let mock = MockGateway::with_seed(seed());
        mock.inject_failure(GatewayError::Network("connection reset".into()))
            .await;

        let err = mock
            .fetch_hierarchy(&HierarchyQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)));

        // Next call succeeds again
        let page = mock.fetch_hierarchy(&HierarchyQuery::default()).await.unwrap();
        assert_eq!(page.roots.len(), 1);
    }

    #[tokio::test]
    async fn test_hierarchy_search_filters_roots() {
        let mock = MockGateway::with_seed(seed());
        let query = HierarchyQuery::default().with_search("per");
        let page = mock.fetch_hierarchy(&query).await.unwrap();
        assert_eq!(page.roots.len(), 1);

        let query = HierarchyQuery::default().with_search("trabajo");
        let page = mock.fetch_hierarchy(&query).await.unwrap();
        assert!(page.roots.is_empty());
    }

    #[tokio::test]
    async fn test_list_by_level() {
        let mock = MockGateway::with_seed(seed());
        let visiones = mock.list(Level::Vision).await.unwrap();
        assert_eq!(visiones.len(), 1);
        assert_eq!(visiones[0].titulo, "Salud");
        assert!(mock.list(Level::Tarea).await.unwrap().is_empty());
    }
}
