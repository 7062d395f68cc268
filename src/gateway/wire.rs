//! Wire model - the backend's JSON shapes, exactly as sent.
//!
//! Each level has its own shape: Organización carries `nombre` instead of
//! `titulo` and no done flag, Tarea carries `completada` instead of
//! `isDone`, and every non-leaf embeds its children under a level-specific
//! key. Everything is normalized into [`Node`]/[`NodeTree`] here so the
//! rest of the crate never sees the differences.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::GatewayError;
use crate::types::{Level, Node, NodeId, NodeTree, PageInfo};

/// Standard response envelope: `{ "data": ..., "message"? }`.
#[derive(Debug, Deserialize)]
pub(super) struct ApiEnvelope<T> {
    pub data: T,
    #[serde(default)]
    #[allow(dead_code)]
    pub message: Option<String>,
}

/// List envelope: `{ "data": [...], "total"? }`.
#[derive(Debug, Deserialize)]
pub(super) struct ApiListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    #[allow(dead_code)]
    pub total: Option<u64>,
}

/// Error body the backend sends on failures: `{ "error"? , "message"? }`.
#[derive(Debug, Deserialize, Default)]
pub(super) struct ApiErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// Best error message available, mirroring the frontend's extraction
    /// order (`error`, then `message`).
    pub fn into_message(self, fallback: &str) -> String {
        self.error
            .or(self.message)
            .unwrap_or_else(|| fallback.to_string())
    }
}

/// Payload of the hierarchy endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct HierarchyData {
    pub organizaciones: Vec<OrganizacionWire>,
    pub pagination: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OrganizacionWire {
    pub id: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub usuario_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub visiones: Vec<VisionWire>,
}

impl OrganizacionWire {
    /// `nombre` maps to `titulo`; organizations have no done state, so
    /// `is_done` is normalized to `false`.
    pub fn into_node(self) -> Node {
        Node {
            id: NodeId::from(self.id),
            level: Level::Organizacion,
            titulo: self.nombre,
            descripcion: self.descripcion,
            is_done: false,
            usuario_id: Some(self.usuario_id),
            parent_id: None,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_tree(mut self) -> NodeTree {
        let visiones = std::mem::take(&mut self.visiones);
        NodeTree {
            node: self.into_node(),
            children: visiones.into_iter().map(VisionWire::into_tree).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct VisionWire {
    pub id: String,
    pub titulo: String,
    pub descripcion: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    pub usuario_id: String,
    #[serde(default)]
    pub organizacion_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub metas: Vec<MetaWire>,
}

impl VisionWire {
    pub fn into_node(self) -> Node {
        Node {
            id: NodeId::from(self.id),
            level: Level::Vision,
            titulo: self.titulo,
            descripcion: self.descripcion,
            is_done: self.is_done,
            usuario_id: Some(self.usuario_id),
            parent_id: self.organizacion_id.map(NodeId::from),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_tree(mut self) -> NodeTree {
        let metas = std::mem::take(&mut self.metas);
        NodeTree {
            node: self.into_node(),
            children: metas.into_iter().map(MetaWire::into_tree).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MetaWire {
    pub id: String,
    pub titulo: String,
    pub descripcion: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    pub vision_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub objetivos: Vec<ObjetivoWire>,
}

impl MetaWire {
    pub fn into_node(self) -> Node {
        Node {
            id: NodeId::from(self.id),
            level: Level::Meta,
            titulo: self.titulo,
            descripcion: self.descripcion,
            is_done: self.is_done,
            usuario_id: None,
            parent_id: Some(NodeId::from(self.vision_id)),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_tree(mut self) -> NodeTree {
        let objetivos = std::mem::take(&mut self.objetivos);
        NodeTree {
            node: self.into_node(),
            children: objetivos.into_iter().map(ObjetivoWire::into_tree).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ObjetivoWire {
    pub id: String,
    pub titulo: String,
    pub descripcion: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    pub meta_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub misiones: Vec<MisionWire>,
}

impl ObjetivoWire {
    pub fn into_node(self) -> Node {
        Node {
            id: NodeId::from(self.id),
            level: Level::Objetivo,
            titulo: self.titulo,
            descripcion: self.descripcion,
            is_done: self.is_done,
            usuario_id: None,
            parent_id: Some(NodeId::from(self.meta_id)),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_tree(mut self) -> NodeTree {
        let misiones = std::mem::take(&mut self.misiones);
        NodeTree {
            node: self.into_node(),
            children: misiones.into_iter().map(MisionWire::into_tree).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct MisionWire {
    pub id: String,
    pub titulo: String,
    pub descripcion: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    pub objetivo_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tareas: Vec<TareaWire>,
}

impl MisionWire {
    pub fn into_node(self) -> Node {
        Node {
            id: NodeId::from(self.id),
            level: Level::Mision,
            titulo: self.titulo,
            descripcion: self.descripcion,
            is_done: self.is_done,
            usuario_id: None,
            parent_id: Some(NodeId::from(self.objetivo_id)),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn into_tree(mut self) -> NodeTree {
        let tareas = std::mem::take(&mut self.tareas);
        NodeTree {
            node: self.into_node(),
            children: tareas
                .into_iter()
                .map(|t| NodeTree::leaf(t.into_node()))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TareaWire {
    pub id: String,
    pub titulo: String,
    pub descripcion: Option<String>,
    /// The task model predates the shared done flag and kept its own name
    #[serde(default)]
    pub completada: bool,
    pub mision_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TareaWire {
    pub fn into_node(self) -> Node {
        Node {
            id: NodeId::from(self.id),
            level: Level::Tarea,
            titulo: self.titulo,
            descripcion: self.descripcion,
            is_done: self.completada,
            usuario_id: None,
            parent_id: Some(NodeId::from(self.mision_id)),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Decode a single entity of the given level into a normalized node.
pub(super) fn decode_node(level: Level, value: serde_json::Value) -> Result<Node, GatewayError> {
    let parse = |e: serde_json::Error| GatewayError::Parse(e.to_string());
    Ok(match level {
        Level::Organizacion => {
            serde_json::from_value::<OrganizacionWire>(value).map_err(parse)?.into_node()
        }
        Level::Vision => serde_json::from_value::<VisionWire>(value).map_err(parse)?.into_node(),
        Level::Meta => serde_json::from_value::<MetaWire>(value).map_err(parse)?.into_node(),
        Level::Objetivo => {
            serde_json::from_value::<ObjetivoWire>(value).map_err(parse)?.into_node()
        }
        Level::Mision => serde_json::from_value::<MisionWire>(value).map_err(parse)?.into_node(),
        Level::Tarea => serde_json::from_value::<TareaWire>(value).map_err(parse)?.into_node(),
    })
}
