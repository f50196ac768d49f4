//! Outbound HTTP capability for the corpus loader.
//!
//! [`PageFetcher`] is the seam the store depends on; [`HttpFetcher`] is the
//! production implementation (single GET, bounded timeout, custom
//! user-agent, retry on transient failures). Tests substitute their own
//! implementation to count or fake fetches.

use async_trait::async_trait;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::FetchError;
use crate::retry::RetryPolicy;

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub status: u16,
    pub body: String,
}

/// Retrieves the raw FAQ source page.
///
/// Implementations must fail with [`FetchError`] on transport errors and
/// on non-2xx responses, and must not block indefinitely.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// [`PageFetcher`] backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            retry: RetryPolicy::with_max_retries(config.max_retries),
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        debug!(url, bytes = body.len(), "fetched FAQ page");

        Ok(FetchedPage {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.retry
            .run(|| self.fetch_once(url), FetchError::is_transient)
            .await
    }
}
