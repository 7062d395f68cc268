//! REST gateway over reqwest.
//!
//! Routes follow the backend's per-level collections (`/api/visiones`,
//! `/api/metas`, ...) with the full hierarchy served from
//! `/api/organizaciones/hierarchy`. The bearer token from the config is
//! attached to every request; credentials themselves never reach this crate.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::traits::{CreateRequest, Gateway, UpdateRequest};
use super::wire::{decode_node, ApiEnvelope, ApiErrorBody, ApiListEnvelope, HierarchyData};
use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::types::{HierarchyPage, HierarchyQuery, Level, Node, NodeId};

/// Route of the single call that returns the fully nested tree.
const HIERARCHY_ROUTE: &str = "/api/organizaciones/hierarchy";

/// Production gateway over the REST backend.
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    /// Create a gateway for the given config.
    pub fn new(config: GatewayConfig) -> Self {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// Create a gateway against a local development backend.
    pub fn localhost() -> Self {
        Self::new(GatewayConfig::default())
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    fn item_url(&self, level: Level, id: &NodeId) -> String {
        format!("{}{}/{}", self.config.base_url, level.endpoint(), id)
    }

    /// Build authorization header if a bearer token is configured.
    fn auth_header(&self) -> Option<String> {
        self.config
            .bearer_token
            .as_ref()
            .map(|t| format!("Bearer {}", t))
    }

    /// Send a request, mapping transport failures and non-success statuses
    /// into the error taxonomy.
    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut request = request;
        if let Some(auth) = self.auth_header() {
            request = request.header(header::AUTHORIZATION, auth);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let fallback = format!("HTTP {}", status);
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        Err(classify(status.as_u16(), body.into_message(&fallback)))
    }

    async fn decode_entity(
        &self,
        level: Level,
        response: reqwest::Response,
    ) -> Result<Node, GatewayError> {
        let envelope: ApiEnvelope<Value> = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;
        decode_node(level, envelope.data)
    }
}

/// Map a non-success HTTP status to the error taxonomy.
fn classify(status: u16, message: String) -> GatewayError {
    match status {
        401 | 403 => GatewayError::Auth(message),
        404 => GatewayError::NotFound(message),
        s if s >= 500 => GatewayError::Server { status: s, message },
        _ => GatewayError::Validation(message),
    }
}

/// Build the JSON body for a create call.
///
/// Organización writes its title to `nombre`; every other level uses
/// `titulo` plus its parent foreign key.
fn create_body(level: Level, req: &CreateRequest) -> serde_json::Map<String, Value> {
    let mut body = serde_json::Map::new();
    let title_key = match level {
        Level::Organizacion => "nombre",
        _ => "titulo",
    };
    body.insert(title_key.to_string(), json!(req.titulo));
    if let Some(descripcion) = &req.descripcion {
        body.insert("descripcion".to_string(), json!(descripcion));
    }
    if let (Some(fk), Some(parent_id)) = (level.parent_fk(), &req.parent_id) {
        body.insert(fk.to_string(), json!(parent_id.as_str()));
    }
    body
}

/// Build the JSON body for an update call; only supplied fields are sent.
///
/// Tarea's done flag travels as `completada`; Organización has no done
/// flag and renames `titulo` back to `nombre`.
fn update_body(level: Level, req: &UpdateRequest) -> serde_json::Map<String, Value> {
    let mut body = serde_json::Map::new();
    body.insert("id".to_string(), json!(req.id.as_str()));
    if let Some(titulo) = &req.patch.titulo {
        let title_key = match level {
            Level::Organizacion => "nombre",
            _ => "titulo",
        };
        body.insert(title_key.to_string(), json!(titulo));
    }
    if let Some(descripcion) = &req.patch.descripcion {
        // `null` clears the description server-side
        body.insert("descripcion".to_string(), json!(descripcion));
    }
    if let Some(is_done) = req.patch.is_done {
        match level {
            Level::Organizacion => {}
            Level::Tarea => {
                body.insert("completada".to_string(), json!(is_done));
            }
            _ => {
                body.insert("isDone".to_string(), json!(is_done));
            }
        }
    }
    body
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_hierarchy(
        &self,
        query: &HierarchyQuery,
    ) -> Result<HierarchyPage, GatewayError> {
        debug!(url = HIERARCHY_ROUTE, "fetching hierarchy");
        let request = self.client.get(self.url(HIERARCHY_ROUTE)).query(query);
        let response = self.execute(request).await?;

        let envelope: ApiEnvelope<HierarchyData> = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        Ok(HierarchyPage {
            roots: envelope
                .data
                .organizaciones
                .into_iter()
                .map(|o| o.into_tree())
                .collect(),
            pagination: envelope.data.pagination,
        })
    }

    async fn create(&self, level: Level, req: &CreateRequest) -> Result<Node, GatewayError> {
        if level.parent_fk().is_some() && req.parent_id.is_none() {
            return Err(GatewayError::Validation(format!(
                "missing parent id for new {}",
                level.as_str()
            )));
        }

        let body = create_body(level, req);
        let request = self.client.post(self.url(level.endpoint())).json(&body);
        let response = self.execute(request).await?;
        self.decode_entity(level, response).await
    }

    async fn update(&self, level: Level, req: &UpdateRequest) -> Result<Node, GatewayError> {
        let body = update_body(level, req);
        // The backend updates organizations via PUT; every other level is a
        // POST upsert to the collection route.
        let request = match level {
            Level::Organizacion => self.client.put(self.url(level.endpoint())),
            _ => self.client.post(self.url(level.endpoint())),
        }
        .json(&body);
        let response = self.execute(request).await?;
        self.decode_entity(level, response).await
    }

    async fn delete(&self, level: Level, id: &NodeId) -> Result<(), GatewayError> {
        let request = self.client.delete(self.item_url(level, id));
        self.execute(request).await?;
        Ok(())
    }

    async fn list(&self, level: Level) -> Result<Vec<Node>, GatewayError> {
        let request = self.client.get(self.url(level.endpoint()));
        let response = self.execute(request).await?;

        let envelope: ApiListEnvelope<Value> = response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))?;

        envelope
            .data
            .into_iter()
            .map(|value| decode_node(level, value))
            .collect()
    }

    async fn fetch_one(&self, level: Level, id: &NodeId) -> Result<Node, GatewayError> {
        let request = self.client.get(self.item_url(level, id));
        let response = self.execute(request).await?;
        self.decode_entity(level, response).await
    }
}
