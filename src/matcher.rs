//! Ranking of corpus entries against a free-text query.
//!
//! # Ranking Algorithm
//!
//! 1. Empty or whitespace-only query → no results, nothing is scored.
//! 2. Normalize the query and each candidate text per the [`MatchProfile`]
//!    (lower-case, optionally strip punctuation; candidate is the question or
//!    `question + " " + answer`).
//! 3. Score every entry with [`composite_score`] (linear scan).
//! 4. Keep entries above the floor (`>=` or `>` per profile), entries whose
//!    normalized question equals the query, and entries whose text contains
//!    the whole query when `substring_boost` is on.
//! 5. Sort: exact question matches first, then substring hits, then score
//!    (desc); stable so ties keep corpus order.
//! 6. Truncate to `top_k`.

use crate::config::{MatchFields, MatchProfile, RetrievalConfig};
use crate::models::{FaqEntry, MatchResult};
use crate::similarity::{composite_score, normalize};

/// Blend weights for the two similarity signals.
#[derive(Debug, Clone, Copy)]
pub struct Matcher {
    sequence_weight: f64,
    overlap_weight: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            sequence_weight: 0.6,
            overlap_weight: 0.4,
        }
    }
}

impl Matcher {
    pub fn new(sequence_weight: f64, overlap_weight: f64) -> Self {
        Self {
            sequence_weight,
            overlap_weight,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(config.sequence_weight, config.overlap_weight)
    }

    /// Score a single normalized query against one entry.
    ///
    /// Returns the score, whether the candidate literally contains the query,
    /// and whether the entry's question is the query itself.
    fn score_entry(
        &self,
        query: &str,
        entry: &FaqEntry,
        profile: &MatchProfile,
    ) -> (f64, bool, bool) {
        let question = normalize(&entry.question, profile.strip_punctuation);
        let exact = question.split_whitespace().eq(query.split_whitespace());
        let raw = match profile.fields {
            MatchFields::Question => entry.question.clone(),
            MatchFields::QuestionAndAnswer => format!("{} {}", entry.question, entry.answer),
        };
        let candidate = normalize(&raw, profile.strip_punctuation);
        let score = composite_score(
            query,
            &candidate,
            self.sequence_weight,
            self.overlap_weight,
        );
        (score, candidate.contains(query), exact)
    }

    /// Rank `entries` against `query` and return at most `profile.top_k` matches.
    pub fn rank(&self, entries: &[FaqEntry], query: &str, profile: &MatchProfile) -> Vec<MatchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let normalized = normalize(query.trim(), profile.strip_punctuation);
        let normalized = normalized.trim();
        if normalized.is_empty() {
            return Vec::new();
        }

        struct Scored<'a> {
            entry: &'a FaqEntry,
            score: f64,
            boosted: bool,
            exact: bool,
        }

        let mut scored: Vec<Scored<'_>> = entries
            .iter()
            .filter_map(|entry| {
                let (score, contains, exact) = self.score_entry(normalized, entry, profile);
                let above = if profile.exclusive_floor {
                    score > profile.min_score
                } else {
                    score >= profile.min_score
                };
                let boosted = profile.substring_boost && contains;
                (above || boosted || exact).then_some(Scored {
                    entry,
                    score,
                    boosted,
                    exact,
                })
            })
            .collect();

        // sort_by is stable: equal keys keep corpus order
        scored.sort_by(|a, b| {
            b.exact
                .cmp(&a.exact)
                .then(b.boosted.cmp(&a.boosted))
                .then(
                    b.score
                        .partial_cmp(&a.score)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        scored.truncate(profile.top_k);

        scored
            .into_iter()
            .map(|s| MatchResult {
                score: s.score,
                question: s.entry.question.clone(),
                answer: s.entry.answer.clone(),
                source_url: s.entry.source_url.clone(),
            })
            .collect()
    }
}
