//! Bounded exponential backoff for calls to flaky upstreams.
//!
//! Used around the FAQ page fetch, and the contract any caller wrapping an
//! external generative service is expected to follow: retry only errors the
//! caller classifies as transient (overload, rate limit, timeout), back off
//! exponentially with jitter, and give up after a fixed number of retries.
//!
//! # Schedule
//!
//! With `base_delay = 500ms`: 500ms, 1s, 2s, 4s, … capped at `max_delay`,
//! each scaled by a random jitter factor.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; `0` disables retrying.
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Run `action`, retrying while `retryable` says the error is transient.
    pub async fn run<T, E, A, Fut, C>(&self, action: A, mut retryable: C) -> Result<T, E>
    where
        A: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        C: FnMut(&E) -> bool,
        E: Display,
    {
        // from_millis(2).factor(f) yields 2f, 4f, 8f, ...
        let factor = (self.base_delay.as_millis() as u64 / 2).max(1);
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(factor)
            .max_delay(self.max_delay)
            .map(jitter)
            .take(self.max_retries);

        RetryIf::spawn(strategy, action, |err: &E| {
            let retry = retryable(err);
            if retry {
                warn!(error = %err, "transient failure, retrying");
            }
            retry
        })
        .await
    }
}
