//! Heuristic evaluation of query results.
//!
//! Turns a raw [`QueryResponse`] into an [`EvaluationReport`]: each returned
//! document annotated with its topic and keyword relevance score, the set of
//! topics the hits cover, and a note saying whether any hit matched a keyword
//! literally or the ranking relied on semantic similarity alone.
//!
//! Evaluation only reads the response. An empty response yields an empty
//! report rather than an error.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::models::{KeywordSet, Metadata, QueryResponse};
use crate::relevance;

/// Shown for a mapping without a topic key.
pub const UNKNOWN_TOPIC: &str = "unknown";
/// Shown when no hit carries a topic.
pub const NO_COVERAGE: &str = "no data";

const SEPARATOR: &str = "==============================";

/// Whether any returned document contains a keyword verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Note {
    /// At least one hit contains at least one keyword.
    ExactKeywordMatch,
    /// No hit contains a keyword; the ranking is purely semantic.
    SemanticOnly,
}

impl Note {
    pub fn message(self) -> &'static str {
        match self {
            Note::ExactKeywordMatch => "Results contain clear matches with the keywords.",
            Note::SemanticOnly => {
                "Matches rely on semantic similarity; no exact keywords were found."
            }
        }
    }
}

/// One ranked hit with its heuristic annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    /// 1-based position in the result list.
    pub rank: usize,
    pub id: String,
    pub topic: String,
    pub text: String,
    pub score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// Evaluation of a single query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub query: String,
    pub keywords: KeywordSet,
    pub entries: Vec<RankedEntry>,
    pub topic_coverage: BTreeSet<String>,
    pub note: Note,
}

/// Evaluate the hits of the first query text in `response`.
pub fn evaluate(query: &str, response: &QueryResponse, keywords: &KeywordSet) -> EvaluationReport {
    let ranked = response.first_ranked();

    let entries: Vec<RankedEntry> = ranked
        .iter()
        .enumerate()
        .map(|(i, hit)| RankedEntry {
            rank: i + 1,
            id: hit.id.clone(),
            topic: topic_label(&hit.metadata),
            text: hit.text.clone(),
            score: relevance::score(&hit.text, keywords),
            distance: hit.distance,
        })
        .collect();

    let topic_coverage: BTreeSet<String> = ranked
        .iter()
        .filter_map(|hit| hit.metadata.topic())
        .filter(|topic| !is_falsy(topic))
        .map(value_label)
        .collect();

    let note = if ranked
        .iter()
        .any(|hit| relevance::mentions_any(&hit.text, keywords))
    {
        Note::ExactKeywordMatch
    } else {
        Note::SemanticOnly
    };

    EvaluationReport {
        query: query.to_string(),
        keywords: keywords.clone(),
        entries,
        topic_coverage,
        note,
    }
}

impl EvaluationReport {
    /// Coverage line content: sorted topics, or [`NO_COVERAGE`].
    pub fn coverage_label(&self) -> String {
        if self.topic_coverage.is_empty() {
            NO_COVERAGE.to_string()
        } else {
            self.topic_coverage
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SEPARATOR)?;
        writeln!(f, "Query: {}", self.query)?;
        writeln!(f, "Results (top {}):", self.entries.len())?;
        for entry in &self.entries {
            writeln!(f, "#{} -> ID: {}", entry.rank, entry.id)?;
            writeln!(f, "       Topic: {}", entry.topic)?;
            writeln!(f, "       Text: {}", entry.text)?;
            writeln!(
                f,
                "       Apparent relevance (0-{}): {}",
                relevance::MAX_SCORE,
                entry.score
            )?;
            if let Some(distance) = entry.distance {
                writeln!(f, "       Distance: {:.4}", distance)?;
            }
        }
        writeln!(f, "Topic coverage: {}", self.coverage_label())?;
        write!(f, "Notes: {}", self.note.message())
    }
}

/// Topic shown for one hit.
///
/// Mappings report their topic value or [`UNKNOWN_TOPIC`]; any other metadata
/// is reported as-is.
fn topic_label(metadata: &Metadata) -> String {
    match metadata {
        Metadata::Mapping(_) => metadata
            .topic()
            .map(value_label)
            .unwrap_or_else(|| UNKNOWN_TOPIC.to_string()),
        Metadata::Opaque(value) => value_label(value),
    }
}

/// Strings print bare; everything else prints as JSON.
fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
