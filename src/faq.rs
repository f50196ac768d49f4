//! The public FAQ query boundary.
//!
//! [`FaqService`] ties the [`CorpusStore`] to the [`Matcher`] and enforces the
//! fail-soft contract: for any string input, `search` returns a
//! [`SearchResponse`] echoing the (trimmed) query. Load failures are logged
//! and collapse to an empty result list.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{Config, MatchMode, MatchProfile, RetrievalConfig};
use crate::matcher::Matcher;
use crate::models::SearchResponse;
use crate::store::CorpusStore;

/// Queries are scored on at most this many characters.
pub const MAX_QUERY_CHARS: usize = 512;

/// Reply used by [`FaqService::answer_text`] when nothing matches.
pub const NO_MATCH_REPLY: &str = "The information about your query could not be found directly in our FAQ. \
Please contact support for help.";

pub struct FaqService {
    store: Arc<CorpusStore>,
    matcher: Matcher,
    retrieval: RetrievalConfig,
}

impl FaqService {
    pub fn new(store: Arc<CorpusStore>, retrieval: &RetrievalConfig) -> Self {
        Self {
            store,
            matcher: Matcher::from_config(retrieval),
            retrieval: retrieval.clone(),
        }
    }

    /// Build a service with an HTTP-backed store.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store = CorpusStore::from_config(config)?;
        Ok(Self::new(Arc::new(store), &config.retrieval))
    }

    pub fn store(&self) -> &Arc<CorpusStore> {
        &self.store
    }

    /// `search_faq` contract: citation mode.
    pub async fn search_faq(&self, query: &str) -> SearchResponse {
        self.search(query, MatchMode::Citation).await
    }

    /// Rank the corpus for `query` using the configured profile for `mode`.
    pub async fn search(&self, query: &str, mode: MatchMode) -> SearchResponse {
        let profile = self.retrieval.profile(mode).clone();
        self.search_with(query, &profile).await
    }

    /// Rank the corpus with an explicit profile. Never fails.
    pub async fn search_with(&self, query: &str, profile: &MatchProfile) -> SearchResponse {
        let query = query.trim();
        if query.is_empty() {
            return SearchResponse::empty(query);
        }

        let index = match self.store.load().await {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "FAQ corpus unavailable, returning no results");
                return SearchResponse::empty(query);
            }
        };

        // LCS scoring is CPU-bound; keep it off the async workers.
        let scored: String = query.chars().take(MAX_QUERY_CHARS).collect();
        let matcher = self.matcher;
        let profile = profile.clone();
        let ranked = tokio::task::spawn_blocking(move || {
            matcher.rank(index.entries(), &scored, &profile)
        })
        .await;
        let results = match ranked {
            Ok(results) => results,
            Err(e) => {
                warn!(error = %e, "FAQ ranking task failed, returning no results");
                return SearchResponse::empty(query);
            }
        };
        debug!(query, matches = results.len(), "FAQ search");
        SearchResponse {
            query: query.to_string(),
            results,
        }
    }

    /// Render matches as `Question/Answer/Source` blocks for an LLM agent.
    pub async fn answer_text(&self, query: &str, mode: MatchMode) -> String {
        let response = self.search(query, mode).await;
        if response.results.is_empty() {
            return NO_MATCH_REPLY.to_string();
        }
        response
            .results
            .iter()
            .map(|r| {
                format!(
                    "Question: {}\nAnswer: {}\nSource: {}",
                    r.question.trim(),
                    r.answer.trim(),
                    r.source_url
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
