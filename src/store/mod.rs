//! Vector store abstraction.
//!
//! The [`VectorStore`] trait is the whole contract the harness consumes from
//! the external vector database: health check, reset, collection lookup,
//! batch upsert and text query. Embedding, similarity search and persistence
//! all live behind it.
//!
//! | Backend | Purpose |
//! |---------|---------|
//! | [`chroma::ChromaStore`] | ChromaDB over its HTTP API |
//! | [`memory::InMemoryStore`] | Offline runs and tests |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod chroma;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::models::{QueryResponse, SeedDocument};

/// A collection resolved by [`VectorStore::get_or_create_collection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionHandle {
    /// Server-side identifier (a UUID for Chroma).
    pub id: String,
    pub name: String,
}

/// A batch of records to upsert, as the three parallel sequences the wire
/// format expects.
///
/// Only constructible from whole records, so position `i` of `ids`,
/// `documents` and `metadatas` always describes the same record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpsertBatch {
    ids: Vec<String>,
    documents: Vec<String>,
    metadatas: Vec<Value>,
}

impl UpsertBatch {
    /// Project an ordered sequence of records into parallel sequences.
    pub fn from_documents(docs: &[SeedDocument]) -> Self {
        let mut batch = Self {
            ids: Vec::with_capacity(docs.len()),
            documents: Vec::with_capacity(docs.len()),
            metadatas: Vec::with_capacity(docs.len()),
        };
        for doc in docs {
            batch.ids.push(doc.id.clone());
            batch.documents.push(doc.text.clone());
            batch.metadatas.push(doc.metadata_value());
        }
        batch
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn documents(&self) -> &[String] {
        &self.documents
    }

    pub fn metadatas(&self) -> &[Value] {
        &self.metadatas
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate records back out of the parallel sequences.
    pub fn records(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.ids
            .iter()
            .zip(&self.documents)
            .zip(&self.metadatas)
            .map(|((id, doc), meta)| (id.as_str(), doc.as_str(), meta))
    }

    /// Check the positional invariant before anything is sent.
    pub fn validate(&self) -> StoreResult<()> {
        if self.ids.len() != self.documents.len() || self.ids.len() != self.metadatas.len() {
            return Err(StoreError::InvalidBatch(format!(
                "{} ids, {} documents, {} metadatas",
                self.ids.len(),
                self.documents.len(),
                self.metadatas.len()
            )));
        }
        Ok(())
    }
}

/// Abstract vector database used by the runner.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`heartbeat`](VectorStore::heartbeat) | Verify the store is reachable |
/// | [`reset`](VectorStore::reset) | Drop all data (destructive) |
/// | [`get_or_create_collection`](VectorStore::get_or_create_collection) | Resolve a collection by name |
/// | [`upsert`](VectorStore::upsert) | Insert or overwrite records by id |
/// | [`query`](VectorStore::query) | Nearest documents per query text |
/// | [`count`](VectorStore::count) | Number of records in a collection |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short label for logs (e.g. `"chroma http://localhost:8000"`).
    fn describe(&self) -> String;

    /// Check that the store answers.
    async fn heartbeat(&self) -> StoreResult<()>;

    /// Delete every collection and record.
    async fn reset(&self) -> StoreResult<()>;

    /// Return the named collection, creating it if absent.
    async fn get_or_create_collection(&self, name: &str) -> StoreResult<CollectionHandle>;

    /// Insert absent ids and overwrite present ones.
    async fn upsert(&self, collection: &CollectionHandle, batch: &UpsertBatch)
        -> StoreResult<()>;

    /// Return up to `n_results` hits for each query text, one outer list entry
    /// per text.
    async fn query(
        &self,
        collection: &CollectionHandle,
        query_texts: &[String],
        n_results: usize,
    ) -> StoreResult<QueryResponse>;

    /// Number of records stored in the collection.
    async fn count(&self, collection: &CollectionHandle) -> StoreResult<usize>;
}
