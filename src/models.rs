//! Core data models shared by the seeder, the stores and the evaluator.
//!
//! These types describe the seed corpus that is written to the vector store,
//! the query battery issued against it, and the raw query response that comes
//! back before evaluation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata keys that carry a document's topic, in lookup order.
pub const TOPIC_KEYS: [&str; 2] = ["topic", "tema"];

/// A record of the fixed seed corpus.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SeedDocument {
    /// Stable identifier, unique within the corpus.
    pub id: String,
    pub text: String,
    /// Flat string metadata. Must contain a topic key.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl SeedDocument {
    pub fn new(id: &str, text: &str, topic: &str) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("topic".to_string(), topic.to_string());
        Self {
            id: id.to_string(),
            text: text.to_string(),
            metadata,
        }
    }

    /// The document's topic label, if one of [`TOPIC_KEYS`] is present.
    pub fn topic(&self) -> Option<&str> {
        TOPIC_KEYS
            .iter()
            .find_map(|key| self.metadata.get(*key))
            .map(String::as_str)
    }

    /// Metadata as the JSON object sent over the wire.
    pub fn metadata_value(&self) -> Value {
        let map: Map<String, Value> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        Value::Object(map)
    }
}

/// A set of lower-cased keywords.
///
/// Keywords are normalised on construction, so `"IA"` and `"ia"` collapse
/// into one entry and matching is case-insensitive on both sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct KeywordSet(BTreeSet<String>);

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl From<Vec<String>> for KeywordSet {
    fn from(v: Vec<String>) -> Self {
        Self::new(v)
    }
}

impl From<KeywordSet> for Vec<String> {
    fn from(k: KeywordSet) -> Self {
        k.0.into_iter().collect()
    }
}

/// One query of the battery: the text sent to the store and the keywords
/// used to judge what comes back.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct QueryRequest {
    pub text: String,
    pub keywords: KeywordSet,
}

/// Per-document metadata as returned by the store.
///
/// Stores may hand back anything for metadata: usually an object, but `null`
/// or a scalar are possible. The evaluator branches on this variant instead
/// of probing attributes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Metadata {
    /// A structured key/value mapping.
    Mapping(Map<String, Value>),
    /// Anything else, reported verbatim.
    Opaque(Value),
}

impl Metadata {
    /// Topic value of a mapping; `None` for opaque metadata or a missing key.
    pub fn topic(&self) -> Option<&Value> {
        match self {
            Metadata::Mapping(map) => TOPIC_KEYS.iter().find_map(|key| map.get(*key)),
            Metadata::Opaque(_) => None,
        }
    }
}

impl From<Value> for Metadata {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Metadata::Mapping(map),
            other => Metadata::Opaque(other),
        }
    }
}

/// Raw query response, one outer list entry per submitted query text.
///
/// Mirrors the Chroma wire shape. Fields the server was not asked to include
/// come back as `null` and deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,
    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Value>>>,
    #[serde(default)]
    pub distances: Option<Vec<Vec<Option<f32>>>>,
}

/// A single hit of the first (and only) query text of a response.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedDocument {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
    pub distance: Option<f32>,
}

impl QueryResponse {
    /// Unwrap the hits for the first query text, in rank order.
    ///
    /// Entries are zipped positionally and truncated to the shortest of ids,
    /// documents and metadatas. A `null` document becomes the empty string.
    pub fn first_ranked(&self) -> Vec<RankedDocument> {
        let ids = self.ids.first().map(Vec::as_slice).unwrap_or_default();
        let documents = self
            .documents
            .as_ref()
            .and_then(|d| d.first())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let metadatas = self
            .metadatas
            .as_ref()
            .and_then(|m| m.first())
            .map(Vec::as_slice)
            .unwrap_or_default();
        let distances = self
            .distances
            .as_ref()
            .and_then(|d| d.first())
            .map(Vec::as_slice)
            .unwrap_or_default();

        ids.iter()
            .zip(documents)
            .zip(metadatas)
            .enumerate()
            .map(|(i, ((id, text), metadata))| RankedDocument {
                id: id.clone(),
                text: text.clone().unwrap_or_default(),
                metadata: Metadata::from(metadata.clone()),
                distance: distances.get(i).copied().flatten(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keyword_set_normalises_case() {
        let set = KeywordSet::new(["IA", "ia", " NLP ", ""]);
        let words: Vec<&str> = set.iter().collect();
        assert_eq!(words, vec!["ia", "nlp"]);
    }

    #[test]
    fn test_metadata_variant() {
        let m = Metadata::from(json!({"tema": "ia"}));
        assert_eq!(m.topic(), Some(&json!("ia")));

        let m = Metadata::from(json!({"topic": "a", "tema": "b"}));
        assert_eq!(m.topic(), Some(&json!("a")));

        let m = Metadata::from(json!("plain"));
        assert_eq!(m, Metadata::Opaque(json!("plain")));
        assert_eq!(m.topic(), None);
    }

    #[test]
    fn test_seed_document_topic() {
        let doc = SeedDocument::new("ia-01", "texto", "ia");
        assert_eq!(doc.topic(), Some("ia"));
        assert_eq!(doc.metadata_value(), json!({"topic": "ia"}));
    }

    #[test]
    fn test_first_ranked_unwraps_and_truncates() {
        let response: QueryResponse = serde_json::from_value(json!({
            "ids": [["a", "b", "c"]],
            "documents": [["text a", null]],
            "metadatas": [[{"topic": "x"}, null, {"topic": "z"}]],
            "distances": [[0.1, 0.2, 0.3]],
            "embeddings": null
        }))
        .unwrap();

        let ranked = response.first_ranked();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id, "a");
        assert_eq!(ranked[0].distance, Some(0.1));
        assert_eq!(ranked[1].text, "");
        assert_eq!(ranked[1].metadata, Metadata::Opaque(Value::Null));
    }

    #[test]
    fn test_first_ranked_missing_fields() {
        let response: QueryResponse =
            serde_json::from_value(json!({"ids": [["a"]], "documents": null})).unwrap();
        assert!(response.first_ranked().is_empty());
        assert!(QueryResponse::default().first_ranked().is_empty());
    }
}
