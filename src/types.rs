//! Core types for the goal hierarchy.
//!
//! The hierarchy is a strict rooted forest:
//! Organización → Visión → Meta → Objetivo → Misión → Tarea.
//!
//! Every entity is normalized into a single [`Node`] struct carrying an
//! explicit [`Level`] tag assigned at ingest, so level dispatch is a single
//! `match` rather than structural probing of children keys.
//!
//! With the `typescript` feature enabled, these types can be exported to
//! TypeScript using ts-rs for consistency with the Expo frontend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "typescript")]
use ts_rs::TS;

/// Identifier of a node, unique across the entire forest (not just within
/// a level).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct NodeId(String);

impl NodeId {
    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hierarchy level, in root-to-leaf order.
///
/// Matches the TypeScript `CampamentoType` in the mobile frontend (minus
/// the virtual root, which is "no current node" here).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Root grouping of visions
    Organizacion,
    /// Long-term vision
    Vision,
    /// Goal under a vision
    Meta,
    /// Objective under a goal
    Objetivo,
    /// Mission under an objective
    Mision,
    /// Leaf task under a mission
    Tarea,
}

impl Level {
    /// All levels in root-to-leaf order.
    pub fn all() -> [Self; 6] {
        [
            Self::Organizacion,
            Self::Vision,
            Self::Meta,
            Self::Objetivo,
            Self::Mision,
            Self::Tarea,
        ]
    }

    /// Zero-based depth of this level in the hierarchy.
    pub fn depth(&self) -> usize {
        *self as usize
    }

    /// The level of this level's children, or `None` for the leaf.
    pub fn child(&self) -> Option<Self> {
        match self {
            Self::Organizacion => Some(Self::Vision),
            Self::Vision => Some(Self::Meta),
            Self::Meta => Some(Self::Objetivo),
            Self::Objetivo => Some(Self::Mision),
            Self::Mision => Some(Self::Tarea),
            Self::Tarea => None,
        }
    }

    /// The level of this level's parent, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        match self {
            Self::Organizacion => None,
            Self::Vision => Some(Self::Organizacion),
            Self::Meta => Some(Self::Vision),
            Self::Objetivo => Some(Self::Meta),
            Self::Mision => Some(Self::Objetivo),
            Self::Tarea => Some(Self::Mision),
        }
    }

    /// Whether nodes at this level can have children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Tarea)
    }

    /// JSON key of the children array on the wire, `None` for the leaf.
    pub fn children_key(&self) -> Option<&'static str> {
        match self {
            Self::Organizacion => Some("visiones"),
            Self::Vision => Some("metas"),
            Self::Meta => Some("objetivos"),
            Self::Objetivo => Some("misiones"),
            Self::Mision => Some("tareas"),
            Self::Tarea => None,
        }
    }

    /// JSON key of the parent foreign key on the wire, `None` for the root.
    pub fn parent_fk(&self) -> Option<&'static str> {
        match self {
            Self::Organizacion => None,
            Self::Vision => Some("organizacionId"),
            Self::Meta => Some("visionId"),
            Self::Objetivo => Some("metaId"),
            Self::Mision => Some("objetivoId"),
            Self::Tarea => Some("misionId"),
        }
    }

    /// Collection route on the REST backend.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Organizacion => "/api/organizaciones",
            Self::Vision => "/api/visiones",
            Self::Meta => "/api/metas",
            Self::Objetivo => "/api/objetivos",
            Self::Mision => "/api/misiones",
            Self::Tarea => "/api/tareas",
        }
    }

    /// Lowercase string form, matching the wire vocabulary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizacion => "organizacion",
            Self::Vision => "vision",
            Self::Meta => "meta",
            Self::Objetivo => "objetivo",
            Self::Mision => "mision",
            Self::Tarea => "tarea",
        }
    }
}

/// A normalized entity at any hierarchy level.
///
/// The backend sends slightly different shapes per level (Organización has
/// `nombre` instead of `titulo` and no done flag, Tarea has `completada`);
/// the gateway maps them all into this one struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier (gateway-assigned)
    pub id: NodeId,
    /// Hierarchy level, set at ingest
    pub level: Level,
    /// Title
    pub titulo: String,
    /// Optional description (nullable server-side)
    pub descripcion: Option<String>,
    /// Completion flag; toggles only the exact node, no cascade.
    /// Always `false` for Organización, which has no done state.
    pub is_done: bool,
    /// Owning user, present on Organización and Visión
    pub usuario_id: Option<String>,
    /// Parent node id, `None` for roots
    pub parent_id: Option<NodeId>,
    /// Creation timestamp (gateway-assigned)
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (gateway-assigned)
    pub updated_at: DateTime<Utc>,
}

/// A node plus its recursively populated children, as fetched from the
/// hierarchy endpoint. The store flattens this into its index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct NodeTree {
    /// The node itself
    pub node: Node,
    /// Direct children in gateway insertion order
    pub children: Vec<NodeTree>,
}

impl NodeTree {
    /// A tree with no children.
    pub fn leaf(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// Total number of nodes in this tree, including the root.
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(NodeTree::len).sum::<usize>()
    }

    /// Always false - a tree has at least its own node.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Partial patch for a node: only supplied fields change.
///
/// `descripcion` is doubly optional so it can be cleared (`Some(None)`)
/// as well as left untouched (`None`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    /// New title
    pub titulo: Option<String>,
    /// New description; `Some(None)` clears it
    pub descripcion: Option<Option<String>>,
    /// New completion flag
    pub is_done: Option<bool>,
}

impl NodePatch {
    /// An empty patch (applies nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the title.
    pub fn with_titulo(mut self, titulo: impl Into<String>) -> Self {
        self.titulo = Some(titulo.into());
        self
    }

    /// Builder: set the description.
    pub fn with_descripcion(mut self, descripcion: impl Into<String>) -> Self {
        self.descripcion = Some(Some(descripcion.into()));
        self
    }

    /// Builder: clear the description.
    pub fn clear_descripcion(mut self) -> Self {
        self.descripcion = Some(None);
        self
    }

    /// Builder: set the completion flag.
    pub fn with_is_done(mut self, is_done: bool) -> Self {
        self.is_done = Some(is_done);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.titulo.is_none() && self.descripcion.is_none() && self.is_done.is_none()
    }

    /// Merge the supplied fields into `node`.
    pub fn apply(&self, node: &mut Node) {
        if let Some(titulo) = &self.titulo {
            node.titulo = titulo.clone();
        }
        if let Some(descripcion) = &self.descripcion {
            node.descripcion = descripcion.clone();
        }
        if let Some(is_done) = self.is_done {
            node.is_done = is_done;
        }
    }
}

/// User-supplied fields for a new item (the create form's payload).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDraft {
    /// Title, must be non-empty (the backend rejects empty titles)
    pub titulo: String,
    /// Optional description
    pub descripcion: Option<String>,
}

impl ItemDraft {
    /// Create a draft with just a title.
    pub fn new(titulo: impl Into<String>) -> Self {
        Self {
            titulo: titulo.into(),
            descripcion: None,
        }
    }

    /// Builder: set the description.
    pub fn with_descripcion(mut self, descripcion: impl Into<String>) -> Self {
        self.descripcion = Some(descripcion.into());
        self
    }
}

/// Sort direction for hierarchy queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query parameters for the hierarchy fetch.
///
/// Pagination applies to roots only; children are always fully included.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyQuery {
    /// Page number (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Roots per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Field to sort roots by
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    /// Sort direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    /// Free-text search over roots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Filter by completion flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_done: Option<bool>,
}

impl HierarchyQuery {
    /// Builder: set the page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Builder: set the page size.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Builder: set the search term.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }
}

/// Root-level pagination metadata from the hierarchy endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Current page (1-based)
    pub page: u32,
    /// Roots per page
    pub limit: u32,
    /// Total roots across all pages
    pub total: u64,
    /// Total pages
    pub total_pages: u32,
    /// Whether more pages follow
    pub has_more: bool,
}

impl PageInfo {
    /// Pagination for a single complete page of `total` roots.
    pub fn single_page(total: u64) -> Self {
        Self {
            page: 1,
            limit: total.max(1) as u32,
            total,
            total_pages: 1,
            has_more: false,
        }
    }
}

/// One page of the full hierarchy, as returned by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyPage {
    /// Root trees in backend order
    pub roots: Vec<NodeTree>,
    /// Root-level pagination
    pub pagination: PageInfo,
}
