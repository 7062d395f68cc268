#![recursion_limit = "256"]
//! Cumbre client core - hierarchy state and navigation for the goal tracker.
//!
//! The domain is a strict rooted forest of goals:
//! Organización → Visión → Meta → Objetivo → Misión → Tarea. This crate
//! owns the client-side state over that forest:
//! - an id-indexed tree store with optimistic insert/update/delete
//! - a drill-down navigation stack with breadcrumb reconciliation
//! - a trait-abstracted REST gateway (HTTP and mock implementations)
//! - a session tying the three together with one write discipline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │                Session                  │
//! │  (lifecycle, write discipline, errors)  │
//! └───────┬───────────┬─────────────┬───────┘
//!         │           │             │
//!         ▼           ▼             ▼
//! ┌──────────────┐ ┌──────────┐ ┌─────────────┐
//! │ Hierarchy    │ │Navigation│ │  Gateway    │
//! │ Store        │ │Stack     │ │ (HTTP/Mock) │
//! └──────────────┘ └──────────┘ └─────────────┘
//! ```
//!
//! Rendering, sign-in, and token storage live in the app layer; the core
//! only sees an opaque bearer token on its gateway config.

pub mod config;
pub mod error;
pub mod gateway;
pub mod navigation;
pub mod session;
pub mod store;
pub mod types;

// Re-export main types for convenience
pub use config::GatewayConfig;
pub use error::{GatewayError, SessionError, StoreError};
pub use gateway::{CreateRequest, Gateway, HttpGateway, MockGateway, UpdateRequest};
pub use navigation::{Breadcrumb, NavigationStack, ReconcileOutcome};
pub use session::Session;
pub use store::HierarchyStore;
pub use types::{
    HierarchyPage, HierarchyQuery, ItemDraft, Level, Node, NodeId, NodePatch, NodeTree, PageInfo,
    SortOrder,
};
