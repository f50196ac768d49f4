use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub extra_entries: Vec<ExtraEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_source_url")]
    pub url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_source_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl SourceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_source_url() -> String {
    "https://www.nugenomics.in/faqs/".to_string()
}
fn default_user_agent() -> String {
    concat!("faq-harness/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_max_retries() -> usize {
    1
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
    /// Zero keeps a snapshot forever.
    #[serde(default)]
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: default_cache_path(),
            max_age_secs: 0,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Option<Duration> {
        (self.max_age_secs > 0).then(|| Duration::from_secs(self.max_age_secs))
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("./data/faqs_cache.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    #[serde(default = "default_strategies")]
    pub strategies: Vec<String>,
    #[serde(default = "default_raw_text_limit")]
    pub raw_text_limit: usize,
    #[serde(default = "default_fallback_question")]
    pub fallback_question: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            raw_text_limit: default_raw_text_limit(),
            fallback_question: default_fallback_question(),
        }
    }
}

fn default_strategies() -> Vec<String> {
    vec!["headings".to_string(), "accordion".to_string()]
}
fn default_raw_text_limit() -> usize {
    15_000
}
fn default_fallback_question() -> String {
    "Frequently Asked Questions".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_sequence_weight")]
    pub sequence_weight: f64,
    #[serde(default = "default_overlap_weight")]
    pub overlap_weight: f64,
    #[serde(default = "MatchProfile::strict", deserialize_with = "strict_profile")]
    pub strict: MatchProfile,
    #[serde(default = "MatchProfile::citation", deserialize_with = "citation_profile")]
    pub citation: MatchProfile,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            sequence_weight: default_sequence_weight(),
            overlap_weight: default_overlap_weight(),
            strict: MatchProfile::strict(),
            citation: MatchProfile::citation(),
        }
    }
}

impl RetrievalConfig {
    pub fn profile(&self, mode: MatchMode) -> &MatchProfile {
        match mode {
            MatchMode::Strict => &self.strict,
            MatchMode::Citation => &self.citation,
        }
    }
}

fn default_sequence_weight() -> f64 {
    0.6
}
fn default_overlap_weight() -> f64 {
    0.4
}

/// Which assistant the caller is serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Single best answer above a high floor.
    Strict,
    /// Up to K candidates above a low floor, for citation-style answers.
    #[default]
    Citation,
}

impl std::str::FromStr for MatchMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(MatchMode::Strict),
            "citation" => Ok(MatchMode::Citation),
            other => anyhow::bail!("Unknown match mode: {}. Use strict or citation.", other),
        }
    }
}

/// Which part of an entry is compared against the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFields {
    Question,
    QuestionAndAnswer,
}

/// Thresholds and normalization for one [`MatchMode`].
#[derive(Debug, Clone, PartialEq)]
pub struct MatchProfile {
    pub min_score: f64,
    pub top_k: usize,
    pub fields: MatchFields,
    pub strip_punctuation: bool,
    /// Require `score > min_score` instead of `>=`.
    pub exclusive_floor: bool,
    /// Admit candidates that literally contain the query.
    pub substring_boost: bool,
}

/// A `[retrieval.<mode>]` table as written; absent keys keep the mode default.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProfileOverride {
    min_score: Option<f64>,
    top_k: Option<usize>,
    fields: Option<MatchFields>,
    strip_punctuation: Option<bool>,
    exclusive_floor: Option<bool>,
    substring_boost: Option<bool>,
}

impl ProfileOverride {
    fn apply(self, base: MatchProfile) -> MatchProfile {
        MatchProfile {
            min_score: self.min_score.unwrap_or(base.min_score),
            top_k: self.top_k.unwrap_or(base.top_k),
            fields: self.fields.unwrap_or(base.fields),
            strip_punctuation: self.strip_punctuation.unwrap_or(base.strip_punctuation),
            exclusive_floor: self.exclusive_floor.unwrap_or(base.exclusive_floor),
            substring_boost: self.substring_boost.unwrap_or(base.substring_boost),
        }
    }
}

fn strict_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MatchProfile, D::Error> {
    Ok(ProfileOverride::deserialize(deserializer)?.apply(MatchProfile::strict()))
}

fn citation_profile<'de, D: Deserializer<'de>>(deserializer: D) -> Result<MatchProfile, D::Error> {
    Ok(ProfileOverride::deserialize(deserializer)?.apply(MatchProfile::citation()))
}

impl MatchProfile {
    pub fn strict() -> Self {
        Self {
            min_score: 0.35,
            top_k: 1,
            fields: MatchFields::Question,
            strip_punctuation: true,
            exclusive_floor: true,
            substring_boost: false,
        }
    }

    pub fn citation() -> Self {
        Self {
            min_score: 0.20,
            top_k: 3,
            fields: MatchFields::QuestionAndAnswer,
            strip_punctuation: false,
            exclusive_floor: false,
            substring_boost: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}

/// A hand-curated entry appended after extraction.
#[derive(Debug, Deserialize, Clone)]
pub struct ExtraEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub url: Option<String>,
}

const KNOWN_STRATEGIES: &[&str] = &["headings", "accordion"];

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.source.url.trim().is_empty() {
        anyhow::bail!("source.url must not be empty");
    }
    if config.source.timeout_secs == 0 {
        anyhow::bail!("source.timeout_secs must be > 0");
    }

    // Extraction
    if config.extraction.raw_text_limit == 0 {
        anyhow::bail!("extraction.raw_text_limit must be > 0");
    }
    for name in &config.extraction.strategies {
        if !KNOWN_STRATEGIES.contains(&name.as_str()) {
            anyhow::bail!(
                "Unknown extraction strategy: '{}'. Must be headings or accordion.",
                name
            );
        }
    }
    if config.extraction.strategies.first().map(String::as_str) == Some("accordion") {
        anyhow::bail!("extraction.strategies must not start with 'accordion' (fallback only)");
    }

    // Retrieval
    let r = &config.retrieval;
    for (name, w) in [
        ("sequence_weight", r.sequence_weight),
        ("overlap_weight", r.overlap_weight),
    ] {
        if !(0.0..=1.0).contains(&w) {
            anyhow::bail!("retrieval.{} must be in [0.0, 1.0]", name);
        }
    }
    if (r.sequence_weight + r.overlap_weight - 1.0).abs() > 1e-6 {
        anyhow::bail!("retrieval.sequence_weight + retrieval.overlap_weight must equal 1.0");
    }
    for (name, profile) in [("strict", &r.strict), ("citation", &r.citation)] {
        if profile.top_k < 1 {
            anyhow::bail!("retrieval.{}.top_k must be >= 1", name);
        }
        if !(0.0..=1.0).contains(&profile.min_score) {
            anyhow::bail!("retrieval.{}.min_score must be in [0.0, 1.0]", name);
        }
    }

    for (i, extra) in config.extra_entries.iter().enumerate() {
        if extra.question.trim().is_empty() || extra.answer.trim().is_empty() {
            anyhow::bail!("extra_entries[{}] needs a non-empty question and answer", i);
        }
    }

    Ok(())
}
