//! The CRUD gateway - the crate's only boundary with the REST backend.
//!
//! [`Gateway`] is the trait the session talks to; [`HttpGateway`] is the
//! production implementation over reqwest, and [`MockGateway`] is an
//! in-memory implementation for tests and offline development.

pub mod http;
pub mod mock;
pub mod traits;
mod wire;

pub use http::HttpGateway;
pub use mock::MockGateway;
pub use traits::{CreateRequest, Gateway, UpdateRequest};
