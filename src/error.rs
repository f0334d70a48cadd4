//! Error types for vector store operations.

use thiserror::Error;

/// Failure talking to the vector store.
///
/// Store errors are never recovered inside the harness: the runner attaches
/// context and propagates them to `main`, which reports and exits non-zero.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The server could not be reached (DNS, refused connection, timeout).
    #[error("cannot reach vector store at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("vector store returned {status} for {route}: {body}")]
    Api {
        route: String,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("invalid response from vector store: {0}")]
    InvalidResponse(String),

    /// Client-side embedding of documents or query texts failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// A batch whose parallel sequences disagree in length.
    #[error("batch is inconsistent: {0}")]
    InvalidBatch(String),

    /// The named collection does not exist in this store.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// Transport-level failure after the connection was established.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
