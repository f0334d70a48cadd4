//! In-memory [`VectorStore`] for tests and offline runs.
//!
//! Collections live in a `HashMap` behind `std::sync::RwLock`. Records keep
//! insertion order; upserting an existing id overwrites it in place. Queries
//! embed texts with the feature-hashing embedder and rank by brute-force
//! cosine similarity, reporting `1 - similarity` as the distance.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::{CollectionHandle, UpsertBatch, VectorStore};
use crate::embedding::{cosine_similarity, hash_embed, HASH_EMBED_DIMS};
use crate::error::{StoreError, StoreResult};
use crate::models::QueryResponse;

struct StoredRecord {
    id: String,
    document: String,
    metadata: Value,
    vector: Vec<f32>,
}

struct StoredCollection {
    id: String,
    records: Vec<StoredRecord>,
}

/// In-memory store keyed by collection name.
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, StoredCollection>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

#[cfg(test)]
impl InMemoryStore {
    /// Stored document text for `id`, if present.
    pub fn document(&self, collection: &str, id: &str) -> Option<String> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .get(collection)?
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.document.clone())
    }

    /// Stored metadata for `id`, if present.
    pub fn metadata(&self, collection: &str, id: &str) -> Option<Value> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .get(collection)?
            .records
            .iter()
            .find(|r| r.id == id)
            .map(|r| r.metadata.clone())
    }

    /// Names of all collections.
    pub fn collection_names(&self) -> Vec<String> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    fn describe(&self) -> String {
        "in-memory".to_string()
    }

    async fn heartbeat(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn reset(&self) -> StoreResult<()> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }

    async fn get_or_create_collection(&self, name: &str) -> StoreResult<CollectionHandle> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = collections.get(name) {
            return Ok(CollectionHandle {
                id: existing.id.clone(),
                name: name.to_string(),
            });
        }

        let id = format!("mem-{}", self.next_id.fetch_add(1, Ordering::Relaxed));

        collections.insert(
            name.to_string(),
            StoredCollection {
                id: id.clone(),
                records: Vec::new(),
            },
        );
        Ok(CollectionHandle {
            id,
            name: name.to_string(),
        })
    }

    async fn upsert(&self, collection: &CollectionHandle, batch: &UpsertBatch) -> StoreResult<()> {
        batch.validate()?;
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let stored = collections
            .get_mut(&collection.name)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.name.clone()))?;

        for (id, document, metadata) in batch.records() {
            let record = StoredRecord {
                id: id.to_string(),
                document: document.to_string(),
                metadata: metadata.clone(),
                vector: hash_embed(document, HASH_EMBED_DIMS),
            };
            match stored.records.iter_mut().find(|r| r.id == id) {
                Some(existing) => *existing = record,
                None => stored.records.push(record),
            }
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        query_texts: &[String],
        n_results: usize,
    ) -> StoreResult<QueryResponse> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let stored = collections
            .get(&collection.name)
            .ok_or_else(|| StoreError::CollectionNotFound(collection.name.clone()))?;

        let mut response = QueryResponse {
            ids: Vec::with_capacity(query_texts.len()),
            documents: Some(Vec::with_capacity(query_texts.len())),
            metadatas: Some(Vec::with_capacity(query_texts.len())),
            distances: Some(Vec::with_capacity(query_texts.len())),
        };

        for text in query_texts {
            let query_vec = hash_embed(text, HASH_EMBED_DIMS);
            let mut scored: Vec<(f32, &StoredRecord)> = stored
                .records
                .iter()
                .map(|r| (cosine_similarity(&query_vec, &r.vector), r))
                .collect();
            // Stable sort: ties keep insertion order.
            scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
            scored.truncate(n_results);

            response.ids.push(scored.iter().map(|(_, r)| r.id.clone()).collect());
            if let Some(docs) = response.documents.as_mut() {
                docs.push(scored.iter().map(|(_, r)| Some(r.document.clone())).collect());
            }
            if let Some(metas) = response.metadatas.as_mut() {
                metas.push(scored.iter().map(|(_, r)| r.metadata.clone()).collect());
            }
            if let Some(dists) = response.distances.as_mut() {
                dists.push(scored.iter().map(|(s, _)| Some(1.0 - s)).collect());
            }
        }

        Ok(response)
    }

    async fn count(&self, collection: &CollectionHandle) -> StoreResult<usize> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .get(&collection.name)
            .map(|c| c.records.len())
            .ok_or_else(|| StoreError::CollectionNotFound(collection.name.clone()))
    }
}
