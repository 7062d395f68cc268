//! The gateway trait - async CRUD per hierarchy level.
//!
//! Level dispatch is explicit: every operation takes a [`Level`] and the
//! implementation maps it to the right route and wire shape. That collapses
//! the per-entity service sprawl into one interface the session can hold as
//! a trait object.

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{HierarchyPage, HierarchyQuery, ItemDraft, Level, Node, NodeId, NodePatch};

/// Payload for creating an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    /// Title, must be non-empty
    pub titulo: String,
    /// Optional description
    pub descripcion: Option<String>,
    /// Parent id; `None` only for the root level (Organización)
    pub parent_id: Option<NodeId>,
}

impl CreateRequest {
    /// Build a create request from a form draft and its parent.
    pub fn from_draft(draft: ItemDraft, parent_id: Option<NodeId>) -> Self {
        Self {
            titulo: draft.titulo,
            descripcion: draft.descripcion,
            parent_id,
        }
    }
}

/// Payload for a partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    /// Target entity id
    pub id: NodeId,
    /// Fields to change; unset fields keep their server-side value
    pub patch: NodePatch,
}

/// Async CRUD boundary against the remote backend.
///
/// Every call is implicitly authenticated by the transport; a 401/403 is
/// surfaced as [`GatewayError::Auth`] and never handled here. Calls are not
/// serialized or cancelled by this layer - if two mutations are in flight,
/// the order of their completions determines the final observed state.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch one page of the fully nested hierarchy.
    ///
    /// Pagination applies at the root level only; children are always
    /// fully included.
    async fn fetch_hierarchy(
        &self,
        query: &HierarchyQuery,
    ) -> Result<HierarchyPage, GatewayError>;

    /// Create an entity at the given level.
    ///
    /// The backend assigns the id and timestamps; fails with
    /// [`GatewayError::Validation`] when the title is empty.
    async fn create(&self, level: Level, req: &CreateRequest) -> Result<Node, GatewayError>;

    /// Partially update an entity; only supplied fields change.
    ///
    /// Fails with [`GatewayError::NotFound`] when the id is unknown
    /// server-side.
    async fn update(&self, level: Level, req: &UpdateRequest) -> Result<Node, GatewayError>;

    /// Delete an entity. The backend cascades to descendants.
    ///
    /// Fails with [`GatewayError::NotFound`] when the id is unknown.
    async fn delete(&self, level: Level, id: &NodeId) -> Result<(), GatewayError>;

    /// Flat listing of one level, without nested children.
    async fn list(&self, level: Level) -> Result<Vec<Node>, GatewayError>;

    /// Fetch a single entity, without nested children.
    async fn fetch_one(&self, level: Level, id: &NodeId) -> Result<Node, GatewayError>;
}
