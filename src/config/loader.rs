//! Configuration structures and loading logic.

use crate::config::modes::{SortMode, TimeRange};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

/// Which listing to scrape and how many images to take from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Subreddit name, without the `r/` prefix.
    #[serde(default)]
    pub subreddit: String,

    #[serde(default)]
    pub sort: SortMode,

    /// Only sent when `sort` is `top`.
    #[serde(default)]
    pub time_range: TimeRange,

    /// Number of accepted images to collect.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            subreddit: String::new(),
            sort: SortMode::default(),
            time_range: TimeRange::default(),
            limit: default_limit(),
        }
    }
}

/// Post acceptance thresholds. Zero means "no threshold".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub min_score: i64,

    #[serde(default)]
    pub min_width: u32,

    #[serde(default)]
    pub min_height: u32,

    #[serde(default)]
    pub include_nsfw: bool,
}

/// Download options configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads. Images land in `{output_dir}/{subreddit}/`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Skip posts whose id already has a file on disk.
    #[serde(default = "default_true")]
    pub skip_existing: bool,

    /// Number of concurrent download workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Suppress per-item progress output.
    #[serde(default)]
    pub quiet: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            skip_existing: true,
            workers: default_workers(),
            quiet: false,
        }
    }
}

/// HTTP behaviour for listing and image requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Listing host, e.g. `https://www.reddit.com`.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Browser user agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Skip TLS certificate validation on all requests.
    ///
    /// Image CDNs linked from listings regularly present chains the bundled
    /// roots reject. Turning validation off trades transport authenticity for
    /// fewer spurious failures; the fetched bytes are public images only.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,

    /// Wait applied after an HTTP 429 before the same page is retried.
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Pause between successful listing pages.
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,

    /// Pause before retrying a page after a transient network error.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// Transient retries per page before pagination is aborted.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Hard ceiling on listing requests in one run.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            accept_invalid_certs: true,
            cooldown_secs: default_cooldown(),
            page_delay_ms: default_page_delay(),
            retry_delay_ms: default_retry_delay(),
            max_retries: default_max_retries(),
            max_pages: default_max_pages(),
        }
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_limit() -> u32 {
    25
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_workers() -> usize {
    5
}

fn default_api_base() -> String {
    "https://www.reddit.com".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_cooldown() -> u64 {
    60
}

fn default_page_delay() -> u64 {
    1000
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_pages() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Build a configuration for a subreddit with every other value defaulted.
    pub fn for_subreddit(subreddit: impl Into<String>) -> Self {
        let mut config = Config::default();
        config.target.subreddit = subreddit.into();
        config
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Configuration file not found: {}",
                    path.display()
                ))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
