//! # FAQ Harness
//!
//! A cached FAQ retrieval core for grounded customer-support assistants.
//!
//! FAQ Harness fetches a company's public FAQ page once, extracts
//! question/answer pairs from its HTML, persists them as a JSON snapshot, and
//! answers free-text questions by fuzzy-matching against the cached corpus.
//! An agent layer reaches it through the `search_faq` tool, either over the
//! MCP-compatible HTTP server or in-process.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │  FAQ page   │──▶│  Extractor  │──▶│  Snapshot   │
//! │  (HTTP)     │   │  headings / │   │  JSON file  │
//! └─────────────┘   │  accordion  │   └──────┬──────┘
//!                   └─────────────┘          │
//!                                            ▼
//!                                     ┌─────────────┐
//!                                     │ CorpusStore │
//!                                     │ (in-memory) │
//!                                     └──────┬──────┘
//!                                            ▼
//!                                     ┌─────────────┐
//!                                     │   Matcher   │
//!                                     └──────┬──────┘
//!                       ┌────────────────────┤
//!                       ▼                    ▼
//!                  ┌──────────┐        ┌──────────┐
//!                  │   CLI    │        │   HTTP   │
//!                  │  (faq)   │        │  (MCP)   │
//!                  └──────────┘        └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! faq search "how do I collect my sample"
//! faq search "contact support" --mode strict
//! faq list                       # dump the cached corpus
//! faq refresh                    # re-fetch the source page
//! faq serve                      # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Fetch and cache error types |
//! | [`fetch`] | Source page retrieval |
//! | [`retry`] | Backoff policy for transient failures |
//! | [`extract`] | HTML → question/answer extraction |
//! | [`cache`] | JSON snapshot persistence |
//! | [`store`] | Single-flight corpus loading |
//! | [`similarity`] | String similarity primitives |
//! | [`matcher`] | Corpus ranking |
//! | [`faq`] | Fail-soft query boundary |
//! | [`tools`] | Agent-callable tools |
//! | [`server`] | MCP HTTP server |
//! | [`logging`] | Tracing subscriber setup |

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod faq;
pub mod fetch;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod retry;
pub mod server;
pub mod similarity;
pub mod store;
pub mod tools;
