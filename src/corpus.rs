//! Seed corpus and query battery.
//!
//! The demo collection content and the queries run against it are static,
//! versioned data in `data/corpus.toml`, compiled into the binary. A different
//! corpus file can be supplied with `--corpus` (or [`Corpus::load`] in tests)
//! as long as it passes the same validation.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::models::{QueryRequest, SeedDocument};

const BUILTIN_CORPUS: &str = include_str!("../data/corpus.toml");

/// Corpus format version this build reads.
pub const CORPUS_VERSION: u32 = 1;

/// Documents to seed plus the queries to evaluate against them.
#[derive(Debug, Clone, Deserialize)]
pub struct Corpus {
    #[serde(default = "default_version")]
    pub version: u32,
    pub documents: Vec<SeedDocument>,
    #[serde(default)]
    pub queries: Vec<QueryRequest>,
}

fn default_version() -> u32 {
    CORPUS_VERSION
}

impl Corpus {
    /// The corpus compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CORPUS).context("Built-in corpus is invalid")
    }

    /// Read and validate a corpus from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid corpus file: {}", path.display()))
    }

    /// Parse and validate corpus TOML.
    pub fn parse(content: &str) -> Result<Self> {
        let corpus: Corpus = toml::from_str(content).context("Failed to parse corpus TOML")?;
        corpus.validate()?;
        Ok(corpus)
    }

    fn validate(&self) -> Result<()> {
        if self.version != CORPUS_VERSION {
            bail!(
                "unsupported corpus version {} (expected {})",
                self.version,
                CORPUS_VERSION
            );
        }
        if self.documents.is_empty() {
            bail!("corpus must contain at least one document");
        }

        let mut seen = HashSet::new();
        for doc in &self.documents {
            if doc.id.trim().is_empty() {
                bail!("document id must not be empty");
            }
            if !seen.insert(doc.id.as_str()) {
                bail!("duplicate document id: '{}'", doc.id);
            }
            match doc.topic() {
                Some(t) if !t.trim().is_empty() => {}
                _ => bail!("document '{}' has no topic in its metadata", doc.id),
            }
        }

        if self.queries.is_empty() {
            bail!("corpus must contain at least one query");
        }
        for query in &self.queries {
            if query.text.trim().is_empty() {
                bail!("query text must not be empty");
            }
        }

        Ok(())
    }

    /// Distinct topics covered by the seeded documents.
    pub fn topics(&self) -> Vec<&str> {
        let mut topics: Vec<&str> = self.documents.iter().filter_map(|d| d.topic()).collect();
        topics.sort_unstable();
        topics.dedup();
        topics
    }
}
