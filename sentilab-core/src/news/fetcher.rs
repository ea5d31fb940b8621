//! Retrying feed fetcher.
//!
//! Each attempt consults the connectivity probe, then the feed source.
//! Transient failures sleep for the policy's next delay and try again;
//! parse failures, exhaustion, and cancellation are returned to the caller.

use chrono::NaiveDate;
use std::sync::Arc;

use super::connectivity::ConnectivityProbe;
use super::error::FetchError;
use super::source::{FeedQuery, FeedSource};
use crate::domain::Article;
use crate::retry::{CancelToken, RetryPolicy, Sleeper, ThreadSleeper};

/// Retrieve the articles for one query over one lookback window.
pub trait NewsFetcher: Send + Sync {
    fn fetch(&self, query: &str, window_end: NaiveDate, lookback_days: u32) -> Result<Vec<Article>, FetchError>;
}

pub struct FeedFetcher {
    source: Arc<dyn FeedSource>,
    probe: Arc<dyn ConnectivityProbe>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
}

impl FeedFetcher {
    pub fn new(source: Arc<dyn FeedSource>, probe: Arc<dyn ConnectivityProbe>, policy: RetryPolicy) -> Self {
        Self {
            source,
            probe,
            policy,
            sleeper: Arc::new(ThreadSleeper::default()),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    fn attempt(&self, query: &FeedQuery) -> Result<Vec<Article>, FetchError> {
        if !self.probe.is_reachable() {
            return Err(FetchError::ConnectivityUnavailable);
        }
        self.source.fetch(query)
    }

    /// Run the retry loop for an already-built query.
    pub fn fetch_query(&self, query: &FeedQuery) -> Result<Vec<Article>, FetchError> {
        let mut attempts: u32 = 0;
        loop {
            if self.cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            attempts += 1;
            let err = match self.attempt(query) {
                Ok(articles) => return Ok(articles),
                Err(e) if e.is_retryable() => e,
                Err(e) => return Err(e),
            };

            if !self.policy.allows_attempt(attempts) {
                tracing::error!(
                    query = %query.query,
                    date = %query.window_end,
                    attempts,
                    error = %err,
                    "giving up on feed query"
                );
                return Err(FetchError::RetriesExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }

            let delay = self.policy.delay(attempts);
            match &err {
                FetchError::ConnectivityUnavailable | FetchError::FetchTimeout => tracing::warn!(
                    query = %query.query,
                    attempt = attempts,
                    delay_secs = delay.as_secs_f64(),
                    "{err}, retrying"
                ),
                _ => tracing::error!(
                    query = %query.query,
                    attempt = attempts,
                    delay_secs = delay.as_secs_f64(),
                    "{err}, retrying"
                ),
            }

            if self.sleeper.sleep(delay, &self.cancel).is_err() {
                return Err(FetchError::Cancelled);
            }
        }
    }
}

impl NewsFetcher for FeedFetcher {
    fn fetch(&self, query: &str, window_end: NaiveDate, lookback_days: u32) -> Result<Vec<Article>, FetchError> {
        self.fetch_query(&FeedQuery::new(query, window_end, lookback_days))
    }
}
