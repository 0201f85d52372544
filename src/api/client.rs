//! Listing and image HTTP client.

use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use url::Url;

use crate::api::types::Listing;
use crate::config::{Config, NetworkConfig, SortMode, TimeRange};
use crate::error::{Error, Result};
use crate::media::Post;

/// Maximum page size accepted by the listing endpoint.
pub const PAGE_SIZE: u32 = 100;

/// Referer sent with image requests; some CDNs refuse hotlinks without one.
const IMAGE_REFERER: &str = "https://www.reddit.com/";

/// Which listing to page through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub subreddit: String,
    pub sort: SortMode,
    pub time_range: TimeRange,
}

impl ListingQuery {
    pub fn from_config(config: &Config) -> Self {
        Self {
            subreddit: config.target.subreddit.clone(),
            sort: config.target.sort,
            time_range: config.target.time_range,
        }
    }
}

/// One page of a listing, already mapped onto [`Post`] values.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    pub posts: Vec<Post>,
    /// Cursor for the next page. `None` on the last page.
    pub after: Option<String>,
}

/// Source of listing pages.
///
/// Implementations report throttling as [`Error::RateLimited`], retryable
/// transport failures as [`Error::TransientNetwork`] (or a transient
/// [`Error::Http`]), and unusable bodies as [`Error::MalformedResponse`].
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch_page(&self, query: &ListingQuery, after: Option<&str>) -> Result<ListingPage>;
}

/// HTTP client for the public listing API and image hosts.
pub struct RedditClient {
    client: Client,
    api_base: Url,
    cooldown_secs: u64,
}

impl RedditClient {
    /// Build a client from network settings.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        if network.accept_invalid_certs {
            tracing::warn!(
                "TLS certificate validation is disabled for listing and image requests"
            );
        }

        let client = Client::builder()
            .user_agent(&network.user_agent)
            .timeout(network.request_timeout())
            .danger_accept_invalid_certs(network.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        // `join` replaces the last path segment unless the base ends in '/'
        let mut api_base = Url::parse(&network.api_base)?;
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        Ok(Self {
            client,
            api_base,
            cooldown_secs: network.cooldown_secs,
        })
    }

    /// Build the listing URL for a query and cursor.
    pub fn listing_url(&self, query: &ListingQuery, after: Option<&str>) -> Result<Url> {
        let mut url = self.api_base.join(&format!(
            "r/{}/{}.json",
            query.subreddit,
            query.sort.as_str()
        ))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("limit", &PAGE_SIZE.to_string());
            pairs.append_pair("raw_json", "1");
            if query.sort == SortMode::Top {
                pairs.append_pair("t", query.time_range.as_str());
            }
            if let Some(after) = after {
                pairs.append_pair("after", after);
            }
        }

        Ok(url)
    }

    /// Fetch one listing page.
    pub async fn get_listing(&self, query: &ListingQuery, after: Option<&str>) -> Result<ListingPage> {
        let url = self.listing_url(query, after)?;
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(self.cooldown_secs));
        }

        if status.is_server_error() {
            return Err(Error::TransientNetwork(format!("HTTP {} from {}", status, url)));
        }

        if !status.is_success() {
            return Err(Error::MalformedResponse(format!("HTTP {} from {}", status, url)));
        }

        let text = response.text().await.map_err(|e| {
            Error::TransientNetwork(format!("Listing body from {} cut short: {}", url, e))
        })?;
        let listing = Listing::parse(&text).map_err(|e| {
            Error::MalformedResponse(format!(
                "{} - Response: {}",
                e,
                excerpt(&text, 200)
            ))
        })?;

        Ok(ListingPage {
            after: listing.data.after.filter(|cursor| !cursor.is_empty()),
            posts: listing
                .data
                .children
                .into_iter()
                .map(|child| child.data.into_post())
                .collect(),
        })
    }

    /// Start an image download. Non-2xx responses are reported as
    /// [`Error::HttpStatus`].
    pub async fn download_file(&self, url: &str) -> Result<Response> {
        let response = self
            .client
            .get(url)
            .header(header::REFERER, IMAGE_REFERER)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::HttpStatus(response.status().as_u16()));
        }

        Ok(response)
    }
}

#[async_trait]
impl ListingSource for RedditClient {
    async fn fetch_page(&self, query: &ListingQuery, after: Option<&str>) -> Result<ListingPage> {
        self.get_listing(query, after).await
    }
}

/// Leading part of a response body for error messages.
fn excerpt(text: &str, max: usize) -> &str {
    let mut end = max.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
