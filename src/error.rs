//! Error types for the Cumbre client core.

use thiserror::Error;

use crate::types::NodeId;

/// Errors surfaced by the CRUD gateway.
///
/// The taxonomy mirrors what the backend can actually send; the session
/// layer decides recovery per variant (retain state, refetch, or clear).
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport failure, no response received
    #[error("Network error: {0}")]
    Network(String),

    /// Backend returned a 5xx
    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// Backend rejected the input (4xx)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Target entity is unknown server-side
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credentials missing, expired, or rejected (401/403)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Whether this error invalidates the whole session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}

/// Errors from hierarchy store ingest.
///
/// Local mutations never fail - they are no-ops when the target is absent.
/// Only replacing the whole tree can reject input.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The same id appeared twice in a fetched hierarchy
    #[error("Duplicate id in hierarchy: {0}")]
    DuplicateId(NodeId),

    /// A child node's level does not follow its parent's level
    #[error("Invalid child level under {parent}: {child}")]
    InvalidChildLevel { parent: NodeId, child: NodeId },
}

/// Errors from session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Gateway call failed
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Store rejected a fetched tree
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Referenced node is not in the local tree
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    /// Tried to create a child under a leaf (Tarea) node
    #[error("Node {0} is a leaf and cannot have children")]
    LeafCannotHaveChildren(NodeId),
}
