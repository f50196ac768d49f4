//! # FAQ Harness CLI (`faq`)
//!
//! Command-line front end for the cached FAQ corpus.
//!
//! ## Usage
//!
//! ```bash
//! faq --config ./config/faq.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `faq search "<query>"` | Rank FAQ entries against a question |
//! | `faq list` | Print every cached entry |
//! | `faq refresh` | Re-fetch the source page and rewrite the snapshot |
//! | `faq serve` | Start the MCP-compatible HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Citation mode: up to three candidates
//! faq search "how do I collect my sample"
//!
//! # Strict mode: single best answer, as JSON
//! faq search "contact support" --mode strict --json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use faq_harness::cache;
use faq_harness::config::{self, Config, MatchMode};
use faq_harness::faq::FaqService;
use faq_harness::logging;
use faq_harness::server;

/// FAQ Harness: fetch, cache and fuzzy-search a company FAQ page.
#[derive(Parser)]
#[command(
    name = "faq",
    about = "FAQ Harness: a cached FAQ retrieval core for customer-support assistants",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Built-in defaults are used when the file does not exist.
    #[arg(long, global = true, default_value = "./config/faq.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the FAQ corpus.
    ///
    /// Loads the corpus (memory, then snapshot, then network) and prints
    /// ranked matches with their scores.
    Search {
        /// The customer question.
        query: String,

        /// `citation` (up to top-K candidates) or `strict` (single best answer).
        #[arg(long, default_value = "citation")]
        mode: String,

        /// Override the mode's top-K.
        #[arg(long)]
        limit: Option<usize>,

        /// Print the `{ query, results }` response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print every entry in the corpus.
    List,

    /// Re-fetch the source page and rewrite the cache snapshot.
    Refresh,

    /// Start the MCP-compatible HTTP server.
    Serve,
}

fn load_or_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        info!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::default())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = load_or_default(&cli.config)?;

    match cli.command {
        Commands::Search {
            query,
            mode,
            limit,
            json,
        } => {
            let mode: MatchMode = mode.parse()?;
            run_search(&cfg, &query, mode, limit, json).await?;
        }
        Commands::List => {
            run_list(&cfg).await?;
        }
        Commands::Refresh => {
            let service = FaqService::from_config(&cfg)?;
            let index = service
                .store()
                .refresh()
                .await
                .with_context(|| format!("Failed to refresh from {}", cfg.source.url))?;
            println!(
                "Refreshed {} entries from {} into {}",
                index.len(),
                cfg.source.url,
                cfg.cache.path.display()
            );
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

async fn run_search(
    cfg: &Config,
    query: &str,
    mode: MatchMode,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let service = FaqService::from_config(cfg)?;
    let mut profile = cfg.retrieval.profile(mode).clone();
    if let Some(limit) = limit {
        if limit == 0 {
            anyhow::bail!("--limit must be >= 1");
        }
        profile.top_k = limit;
    }

    let response = service.search_with(query, &profile).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    if response.results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, result) in response.results.iter().enumerate() {
        println!("{}. [{:.2}] {}", i + 1, result.score, result.question.trim());
        println!("    answer: \"{}\"", result.answer.replace('\n', " ").trim());
        println!("    url: {}", result.source_url);
        println!();
    }
    Ok(())
}

async fn run_list(cfg: &Config) -> anyhow::Result<()> {
    let service = FaqService::from_config(cfg)?;
    let index = service
        .store()
        .load()
        .await
        .with_context(|| format!("Failed to load FAQ corpus from {}", cfg.source.url))?;

    let updated = cache::snapshot_modified(service.store().cache_path())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("{} entries", index.len());
    println!("    cache: {}", service.store().cache_path().display());
    println!("    updated: {}", updated);
    println!();

    for entry in index.entries() {
        println!("{}. {}", entry.id, entry.question.trim());
        println!("    url: {}", entry.source_url);
    }
    Ok(())
}
