//! Listing pagination with throttling backoff and transient retries.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::api::{ListingQuery, ListingSource};
use crate::config::NetworkConfig;
use crate::error::{Error, Result};
use crate::media::Post;

/// Timing and retry limits for one pagination run.
#[derive(Debug, Clone)]
pub struct PaginatorSettings {
    /// Wait after a throttled (HTTP 429) request before retrying the page.
    pub cooldown: Duration,
    /// Wait before retrying after a transient network error.
    pub retry_delay: Duration,
    /// Pause between successful page requests.
    pub page_delay: Duration,
    /// Transient retries per page before pagination is aborted.
    pub max_retries: u32,
    /// Hard ceiling on listing requests, throttled retries included.
    pub max_requests: u32,
}

impl PaginatorSettings {
    pub fn from_config(network: &NetworkConfig) -> Self {
        Self {
            cooldown: Duration::from_secs(network.cooldown_secs),
            retry_delay: Duration::from_millis(network.retry_delay_ms),
            page_delay: Duration::from_millis(network.page_delay_ms),
            max_retries: network.max_retries,
            max_requests: network.max_pages,
        }
    }
}

impl Default for PaginatorSettings {
    fn default() -> Self {
        Self::from_config(&NetworkConfig::default())
    }
}

/// Why pagination stopped producing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The listing returned an empty page.
    EmptyPage,
    /// The last page carried no continuation cursor.
    NoCursor,
    /// The body could not be mapped onto the listing schema.
    Malformed,
    /// The request ceiling was reached.
    PageCeiling,
    /// Transient failures exhausted the retry budget.
    Aborted,
}

/// Walks a listing page by page.
///
/// Call [`Paginator::next_page`] until it returns `Ok(None)`. The caller
/// stops early simply by not asking for another page.
pub struct Paginator {
    source: Arc<dyn ListingSource>,
    query: ListingQuery,
    settings: PaginatorSettings,
    cursor: Option<String>,
    requests: u32,
    pages: u32,
    throttle_waits: u32,
    ended: Option<EndReason>,
}

impl Paginator {
    pub fn new(source: Arc<dyn ListingSource>, query: ListingQuery, settings: PaginatorSettings) -> Self {
        Self {
            source,
            query,
            settings,
            cursor: None,
            requests: 0,
            pages: 0,
            throttle_waits: 0,
            ended: None,
        }
    }

    /// Cursor that the next request will send.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    /// Pages successfully fetched so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages
    }

    /// Cooldown waits caused by throttling so far.
    pub fn throttle_waits(&self) -> u32 {
        self.throttle_waits
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.ended
    }

    /// Fetch the next non-empty page.
    ///
    /// Returns `Ok(None)` once the listing is exhausted, malformed, or the
    /// request ceiling is hit. Returns [`Error::PaginationAborted`] when a
    /// page keeps failing with transient errors.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Post>>> {
        if self.ended.is_some() {
            return Ok(None);
        }

        if self.pages > 0 && !self.settings.page_delay.is_zero() {
            sleep(self.settings.page_delay).await;
        }

        let mut transient_failures = 0u32;

        loop {
            if self.requests >= self.settings.max_requests {
                tracing::warn!(
                    "Stopping after {} listing requests (page ceiling)",
                    self.requests
                );
                return Ok(self.finish(EndReason::PageCeiling));
            }
            self.requests += 1;

            match self
                .source
                .fetch_page(&self.query, self.cursor.as_deref())
                .await
            {
                Ok(page) => {
                    if page.posts.is_empty() {
                        tracing::debug!("Listing returned an empty page");
                        return Ok(self.finish(EndReason::EmptyPage));
                    }

                    self.pages += 1;
                    match page.after {
                        Some(after) => self.cursor = Some(after),
                        None => self.ended = Some(EndReason::NoCursor),
                    }

                    return Ok(Some(page.posts));
                }
                Err(Error::RateLimited(_)) => {
                    self.throttle_waits += 1;
                    tracing::warn!(
                        "Rate limited, waiting {} seconds before retrying",
                        self.settings.cooldown.as_secs()
                    );
                    sleep(self.settings.cooldown).await;
                }
                Err(e) if e.is_transient() => {
                    transient_failures += 1;
                    if transient_failures > self.settings.max_retries {
                        self.ended = Some(EndReason::Aborted);
                        return Err(Error::PaginationAborted {
                            attempts: transient_failures,
                            message: e.to_string(),
                        });
                    }

                    tracing::warn!(
                        "Listing request failed ({}), retry {}/{}",
                        e,
                        transient_failures,
                        self.settings.max_retries
                    );
                    sleep(self.settings.retry_delay).await;
                }
                Err(e) => {
                    tracing::warn!("Unusable listing response, ending pagination: {}", e);
                    return Ok(self.finish(EndReason::Malformed));
                }
            }
        }
    }

    fn finish(&mut self, reason: EndReason) -> Option<Vec<Post>> {
        self.ended = Some(reason);
        None
    }
}
