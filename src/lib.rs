//! # Chroma Harness
//!
//! A demo client that exercises a ChromaDB server: it resolves connection
//! settings, idempotently seeds a fixed collection of topic-tagged articles,
//! runs a battery of semantic queries and scores what comes back with a
//! keyword heuristic.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────────┐
//! │  config  │──▶│  runner  │──▶│ VectorStore  │
//! │ env/.env │   │          │   │ Chroma / mem │
//! └──────────┘   └────┬─────┘   └──────────────┘
//!                     │
//!          ┌──────────┼───────────┐
//!          ▼          ▼           ▼
//!     ┌────────┐ ┌──────────┐ ┌───────────┐
//!     │  seed  │ │ evaluate │─▶│ relevance │
//!     └────────┘ └──────────┘ └───────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! docker run -p 8000:8000 -e ALLOW_RESET=TRUE chromadb/chroma
//! chroma-harness --reset
//! chroma-harness --in-memory --format json
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Environment / `.env` / default resolution |
//! | [`corpus`] | Seed documents and query battery (TOML data) |
//! | [`models`] | Core data types |
//! | [`store`] | Vector store trait, Chroma HTTP and in-memory backends |
//! | [`embedding`] | Client-side embedding providers |
//! | [`seed`] | Idempotent collection seeding |
//! | [`relevance`] | Keyword relevance heuristic |
//! | [`evaluate`] | Result evaluation and report rendering |
//! | [`runner`] | End-to-end orchestration |
//! | [`error`] | Store error types |

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod evaluate;
pub mod models;
pub mod relevance;
pub mod runner;
pub mod seed;
pub mod store;
