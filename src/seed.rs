//! Idempotent seeding of the demo collection.

use anyhow::{Context, Result};

use crate::models::SeedDocument;
use crate::store::{CollectionHandle, UpsertBatch, VectorStore};

/// Upsert every corpus document into `collection` in a single batch.
///
/// Ids already in the store are overwritten with the current text and
/// metadata; absent ids are inserted. Running this twice leaves exactly one
/// record per id. Returns the number of records sent.
pub async fn ensure_seeded(
    store: &dyn VectorStore,
    collection: &CollectionHandle,
    documents: &[SeedDocument],
) -> Result<usize> {
    let batch = UpsertBatch::from_documents(documents);
    store
        .upsert(collection, &batch)
        .await
        .with_context(|| format!("Failed to seed collection '{}'", collection.name))?;
    tracing::debug!(
        collection = %collection.name,
        records = batch.len(),
        "upserted seed documents"
    );
    Ok(batch.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Corpus;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_seed_twice_no_duplicates() {
        let corpus = Corpus::builtin().unwrap();
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("articulos").await.unwrap();

        let n = ensure_seeded(&store, &col, &corpus.documents).await.unwrap();
        assert_eq!(n, 10);
        assert_eq!(store.count(&col).await.unwrap(), 10);

        ensure_seeded(&store, &col, &corpus.documents).await.unwrap();
        assert_eq!(store.count(&col).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_seed_updates_changed_record_only() {
        let corpus = Corpus::builtin().unwrap();
        let store = InMemoryStore::new();
        let col = store.get_or_create_collection("articulos").await.unwrap();
        ensure_seeded(&store, &col, &corpus.documents).await.unwrap();

        let mut changed = corpus.documents.clone();
        changed[4].text = "Texto revisado sobre economía.".to_string();
        ensure_seeded(&store, &col, &changed).await.unwrap();

        assert_eq!(store.count(&col).await.unwrap(), 10);
        assert_eq!(
            store.document("articulos", "economia-01").as_deref(),
            Some("Texto revisado sobre economía.")
        );
        for doc in corpus.documents.iter().filter(|d| d.id != "economia-01") {
            assert_eq!(store.document("articulos", &doc.id), Some(doc.text.clone()));
            assert_eq!(
                store.metadata("articulos", &doc.id),
                Some(doc.metadata_value())
            );
        }
    }

    #[tokio::test]
    async fn test_seed_into_missing_collection_fails() {
        let store = InMemoryStore::new();
        let ghost = CollectionHandle {
            id: "x".to_string(),
            name: "ghost".to_string(),
        };
        let docs = vec![SeedDocument::new("a", "b", "c")];
        let err = ensure_seeded(&store, &ghost, &docs).await.unwrap_err();
        assert!(format!("{:#}", err).contains("collection not found"));
    }
}
