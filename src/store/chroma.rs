//! ChromaDB HTTP [`VectorStore`].
//!
//! Talks to a Chroma server through its v2 REST API:
//!
//! | Operation | Route |
//! |-----------|-------|
//! | heartbeat | `GET /api/v2/heartbeat` |
//! | reset | `POST /api/v2/reset` (server needs `ALLOW_RESET=TRUE`) |
//! | get or create | `POST /api/v2/tenants/{t}/databases/{d}/collections` |
//! | upsert | `POST .../collections/{id}/upsert` |
//! | query | `POST .../collections/{id}/query` |
//! | count | `GET .../collections/{id}/count` |
//!
//! Documents and query texts are embedded on the client with the configured
//! [`EmbeddingProvider`] before being sent.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{CollectionHandle, UpsertBatch, VectorStore};
use crate::config::Config;
use crate::embedding::{create_provider, EmbeddingProvider};
use crate::error::{StoreError, StoreResult};
use crate::models::QueryResponse;

/// Fields requested from `query`; embeddings are never fetched back.
const QUERY_INCLUDE: [&str; 3] = ["documents", "metadatas", "distances"];

/// Collection as returned by the create endpoint. Other fields are ignored.
#[derive(Debug, Deserialize)]
struct CollectionModel {
    id: String,
    name: String,
}

/// HTTP client for one Chroma tenant/database.
pub struct ChromaStore {
    base_url: String,
    tenant: String,
    database: String,
    client: reqwest::Client,
    embedder: Box<dyn EmbeddingProvider>,
}

impl ChromaStore {
    /// Build a store from the resolved configuration, creating the embedding
    /// provider it names.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let embedder = create_provider(&config.embedding)?;
        Self::with_embedder(config, embedder)
    }

    /// Build a store with an explicit embedding provider.
    pub fn with_embedder(
        config: &Config,
        embedder: Box<dyn EmbeddingProvider>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.base_url(),
            tenant: config.tenant.clone(),
            database: config.database.clone(),
            client,
            embedder,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    fn collection_url(&self, collection: &CollectionHandle, action: &str) -> String {
        format!("{}/{}/{}", self.collections_url(), collection.id, action)
    }

    /// Send a request and return the response if its status is a success.
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        route: &str,
    ) -> StoreResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Api {
            route: route.to_string(),
            status: status.as_u16(),
            body,
        })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        route: &str,
    ) -> StoreResult<T> {
        let response = self.send(request, route).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            StoreError::InvalidResponse(format!("{}: {}", route, e))
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> StoreError {
        if e.is_connect() || e.is_timeout() {
            StoreError::Connect {
                url: self.base_url.clone(),
                source: e,
            }
        } else {
            StoreError::Http(e)
        }
    }

    async fn embed(&self, texts: &[String]) -> StoreResult<Vec<Vec<f32>>> {
        let vectors = self
            .embedder
            .embed(texts)
            .await
            .map_err(|e| StoreError::Embedding(format!("{:#}", e)))?;
        if vectors.len() != texts.len() {
            return Err(StoreError::Embedding(format!(
                "{} returned {} vectors for {} texts",
                self.embedder.model_name(),
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }
}

/// Request body for `upsert`: the batch's parallel arrays plus embeddings.
fn upsert_body(batch: &UpsertBatch, embeddings: &[Vec<f32>]) -> Value {
    json!({
        "ids": batch.ids(),
        "embeddings": embeddings,
        "documents": batch.documents(),
        "metadatas": batch.metadatas(),
    })
}

/// Request body for `query`.
fn query_body(embeddings: &[Vec<f32>], n_results: usize) -> Value {
    json!({
        "query_embeddings": embeddings,
        "n_results": n_results,
        "include": QUERY_INCLUDE,
    })
}

#[async_trait]
impl VectorStore for ChromaStore {
    fn describe(&self) -> String {
        format!("chroma {} (embeddings: {})", self.base_url, self.embedder.model_name())
    }

    async fn heartbeat(&self) -> StoreResult<()> {
        let url = format!("{}/api/v2/heartbeat", self.base_url);
        self.send(self.client.get(&url), "heartbeat").await?;
        Ok(())
    }

    async fn reset(&self) -> StoreResult<()> {
        let url = format!("{}/api/v2/reset", self.base_url);
        self.send(self.client.post(&url), "reset").await?;
        Ok(())
    }

    async fn get_or_create_collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        let body = json!({ "name": name, "get_or_create": true });
        let model: CollectionModel = self
            .send_json(
                self.client.post(self.collections_url()).json(&body),
                "get_or_create_collection",
            )
            .await?;
        Ok(CollectionHandle {
            id: model.id,
            name: model.name,
        })
    }

    async fn upsert(&self, collection: &CollectionHandle, batch: &UpsertBatch) -> StoreResult<()> {
        batch.validate()?;
        if batch.is_empty() {
            return Ok(());
        }
        let embeddings = self.embed(batch.documents()).await?;
        let body = upsert_body(batch, &embeddings);
        self.send(
            self.client
                .post(self.collection_url(collection, "upsert"))
                .json(&body),
            "upsert",
        )
        .await?;
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        query_texts: &[String],
        n_results: usize,
    ) -> StoreResult<QueryResponse> {
        let embeddings = self.embed(query_texts).await?;
        let body = query_body(&embeddings, n_results);
        self.send_json(
            self.client
                .post(self.collection_url(collection, "query"))
                .json(&body),
            "query",
        )
        .await
    }

    async fn count(&self, collection: &CollectionHandle) -> StoreResult<usize> {
        self.send_json(
            self.client.get(self.collection_url(collection, "count")),
            "count",
        )
        .await
    }
}
