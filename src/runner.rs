//! End-to-end run: connect, optionally reset, seed, then query and evaluate.
//!
//! ```text
//! CONNECT ─▶ [RESET] ─▶ COLLECTION ─▶ SEED ─▶ (QUERY ─▶ EVALUATE) × n ─▶ DONE
//! ```
//!
//! Every step is awaited before the next starts. The first store failure
//! aborts the run; there is no per-query recovery and no retry.

use anyhow::{Context, Result};

use crate::corpus::Corpus;
use crate::evaluate::{evaluate, EvaluationReport};
use crate::seed::ensure_seeded;
use crate::store::{CollectionHandle, VectorStore};

/// Hits requested per query.
pub const DEFAULT_N_RESULTS: usize = 3;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub collection: String,
    /// Wipe the store before seeding. Destructive.
    pub reset: bool,
    pub n_results: usize,
}

impl RunOptions {
    pub fn new(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            reset: false,
            n_results: DEFAULT_N_RESULTS,
        }
    }
}

/// What a completed run did.
#[derive(Debug)]
pub struct RunSummary {
    pub collection: CollectionHandle,
    pub seeded: usize,
    pub reports: Vec<EvaluationReport>,
}

/// Drive one run against `store`.
///
/// `on_report` is called with each report as soon as its query has been
/// evaluated, so output already produced survives a later failure.
pub async fn run<F>(
    store: &dyn VectorStore,
    corpus: &Corpus,
    options: &RunOptions,
    mut on_report: F,
) -> Result<RunSummary>
where
    F: FnMut(&EvaluationReport) -> Result<()>,
{
    store
        .heartbeat()
        .await
        .with_context(|| format!("Failed to connect to {}", store.describe()))?;
    tracing::debug!("connected to {}", store.describe());

    if options.reset {
        tracing::info!("--reset given. Clearing remote data...");
        store.reset().await.context("Failed to reset the vector store")?;
    }

    let collection = store
        .get_or_create_collection(&options.collection)
        .await
        .with_context(|| format!("Failed to open collection '{}'", options.collection))?;

    let seeded = ensure_seeded(store, &collection, &corpus.documents).await?;
    tracing::info!(
        "Documents inserted/updated successfully ({} in '{}').",
        seeded,
        collection.name
    );

    let mut reports = Vec::with_capacity(corpus.queries.len());
    for request in &corpus.queries {
        let response = store
            .query(
                &collection,
                std::slice::from_ref(&request.text),
                options.n_results,
            )
            .await
            .with_context(|| format!("Query failed: {}", request.text))?;

        let report = evaluate(&request.text, &response, &request.keywords);
        on_report(&report)?;
        reports.push(report);
    }

    Ok(RunSummary {
        collection,
        seeded,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::evaluate::Note;
    use crate::models::QueryResponse;
    use crate::store::memory::InMemoryStore;
    use crate::store::UpsertBatch;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Wraps the in-memory store, records calls and fails one operation on
    /// demand.
    struct RecordingStore {
        inner: InMemoryStore,
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl RecordingStore {
        fn new(fail_on: Option<&'static str>) -> Self {
            Self {
                inner: InMemoryStore::new(),
                calls: Mutex::new(Vec::new()),
                fail_on,
            }
        }

        fn record(&self, op: &'static str) -> StoreResult<()> {
            self.calls.lock().unwrap().push(op.to_string());
            if self.fail_on == Some(op) {
                return Err(StoreError::Api {
                    route: op.to_string(),
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        fn describe(&self) -> String {
            "recording".to_string()
        }

        async fn heartbeat(&self) -> StoreResult<()> {
            self.record("heartbeat")
        }

        async fn reset(&self) -> StoreResult<()> {
            self.record("reset")?;
            self.inner.reset().await
        }

        async fn get_or_create_collection(&self, name: &str) -> StoreResult<CollectionHandle> {
            self.record("collection")?;
            self.inner.get_or_create_collection(name).await
        }

        async fn upsert(&self, c: &CollectionHandle, batch: &UpsertBatch) -> StoreResult<()> {
            self.record("upsert")?;
            self.inner.upsert(c, batch).await
        }

        async fn query(
            &self,
            c: &CollectionHandle,
            texts: &[String],
            n: usize,
        ) -> StoreResult<QueryResponse> {
            self.record("query")?;
            self.inner.query(c, texts, n).await
        }

        async fn count(&self, c: &CollectionHandle) -> StoreResult<usize> {
            self.inner.count(c).await
        }
    }

    #[tokio::test]
    async fn test_full_run_in_memory() {
        let corpus = Corpus::builtin().unwrap();
        let store = InMemoryStore::new();
        let mut printed = 0;

        let summary = run(&store, &corpus, &RunOptions::new("articulos"), |_| {
            printed += 1;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(summary.seeded, 10);
        assert_eq!(summary.reports.len(), 3);
        assert_eq!(printed, 3);
        assert_eq!(store.count(&summary.collection).await.unwrap(), 10);
        for report in &summary.reports {
            assert!(report.entries.len() <= DEFAULT_N_RESULTS);
            assert!(!report.entries.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ecology_query_end_to_end() {
        // Two documents and three hits requested: both come back whatever the
        // similarity order.
        let mut corpus = Corpus::builtin().unwrap();
        corpus
            .documents
            .retain(|d| d.id == "ecologia-01" || d.id == "musica-01");
        corpus.queries.truncate(1);
        let store = InMemoryStore::new();
        let summary = run(&store, &corpus, &RunOptions::new("articulos"), |_| Ok(()))
            .await
            .unwrap();

        let first = &summary.reports[0];
        assert_eq!(first.query, "¿Cómo reducir el impacto ambiental de una ciudad?");
        let ecology = first
            .entries
            .iter()
            .find(|e| e.id == "ecologia-01")
            .expect("ecology document among the hits");
        assert_eq!(ecology.score, 4);
        assert_eq!(ecology.topic, "ecologia");
        assert_eq!(first.note, Note::ExactKeywordMatch);
    }

    #[tokio::test]
    async fn test_reset_runs_before_seed() {
        let corpus = Corpus::builtin().unwrap();
        let store = RecordingStore::new(None);
        let mut options = RunOptions::new("articulos");
        options.reset = true;

        run(&store, &corpus, &options, |_| Ok(())).await.unwrap();
        assert_eq!(
            store.calls(),
            vec!["heartbeat", "reset", "collection", "upsert", "query", "query", "query"]
        );
    }

    #[tokio::test]
    async fn test_no_reset_unless_requested() {
        let corpus = Corpus::builtin().unwrap();
        let store = RecordingStore::new(None);
        run(&store, &corpus, &RunOptions::new("articulos"), |_| Ok(()))
            .await
            .unwrap();
        assert!(!store.calls().iter().any(|c| c == "reset"));
    }

    #[tokio::test]
    async fn test_connect_failure_aborts_before_anything_else() {
        let corpus = Corpus::builtin().unwrap();
        let store = RecordingStore::new(Some("heartbeat"));
        let mut options = RunOptions::new("articulos");
        options.reset = true;

        let err = run(&store, &corpus, &options, |_| Ok(())).await.unwrap_err();
        assert!(err.to_string().contains("Failed to connect"));
        assert_eq!(store.calls(), vec!["heartbeat"]);
    }

    #[tokio::test]
    async fn test_reset_failure_aborts_before_seed() {
        let corpus = Corpus::builtin().unwrap();
        let store = RecordingStore::new(Some("reset"));
        let mut options = RunOptions::new("articulos");
        options.reset = true;

        let err = run(&store, &corpus, &options, |_| Ok(())).await.unwrap_err();
        assert!(err.to_string().contains("reset"));
        assert!(!store.calls().iter().any(|c| c == "upsert"));
    }

    #[tokio::test]
    async fn test_query_failure_is_fatal() {
        let corpus = Corpus::builtin().unwrap();
        let store = RecordingStore::new(Some("query"));
        let mut printed = 0;

        let err = run(&store, &corpus, &RunOptions::new("articulos"), |_| {
            printed += 1;
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(err.to_string().starts_with("Query failed"));
        assert_eq!(printed, 0);
        assert_eq!(
            store.calls().iter().filter(|c| *c == "query").count(),
            1,
            "no further queries after the first failure"
        );
    }
}
