//! Core data models used throughout FAQ Harness.
//!
//! These types represent the FAQ entries, the loaded corpus, and the match
//! results that flow from the corpus loader through the matcher.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// One question/answer pair plus its provenance.
///
/// The serialized form is also the Cache Snapshot record shape:
/// `{ "id", "question", "answer", "url" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqEntry {
    pub id: usize,
    pub question: String,
    pub answer: String,
    #[serde(rename = "url")]
    pub source_url: String,
}

/// The ordered, immutable set of entries available for matching.
///
/// Ids are dense and follow extraction order. A populated index is never
/// mutated; the store swaps in a whole new one on refresh.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    entries: Vec<FaqEntry>,
    loaded_at: Instant,
}

impl CorpusIndex {
    /// Build an index, renumbering ids densely in the given order.
    pub fn new(entries: Vec<FaqEntry>) -> Self {
        Self::with_age(entries, Duration::ZERO)
    }

    /// Build an index whose content is already `age` old, e.g. adopted
    /// from a snapshot written earlier.
    pub fn with_age(entries: Vec<FaqEntry>, age: Duration) -> Self {
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(id, entry)| FaqEntry { id, ..entry })
            .collect();
        Self {
            entries,
            loaded_at: Instant::now().checked_sub(age).unwrap_or_else(Instant::now),
        }
    }

    pub fn entries(&self) -> &[FaqEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Time since this index was built in memory.
    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }
}

/// A single ranked match, matching the `search_faq` result item shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// Relevance score in `[0.0, 1.0]`.
    pub score: f64,
    pub question: String,
    pub answer: String,
    #[serde(rename = "url")]
    pub source_url: String,
}

/// Response of the public `search_faq` contract.
///
/// An empty `results` list is a valid answer, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<MatchResult>,
}

impl SearchResponse {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            results: Vec::new(),
        }
    }
}
