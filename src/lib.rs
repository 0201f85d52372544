//! Subreddit image downloader.
//!
//! This library walks a subreddit's public JSON listing and downloads the
//! images its posts point to.
//!
//! # Features
//!
//! - Hot, new, top and rising listings, with a time range for top
//! - Direct links, native and third-party image hosts, previews and galleries
//! - Score, size and NSFW filtering
//! - Skips posts whose image is already on disk
//! - Concurrent downloads with atomic writes
//! - Throttling cooldown and transient retry handling
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use subreddit_downloader::{Config, RedditClient, Scraper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::for_subreddit("wallpapers");
//!     config.target.limit = 50;
//!
//!     let client = Arc::new(RedditClient::new(&config.network)?);
//!     let state = Scraper::new(config, client).run().await?;
//!     println!("saved {} images", state.saved);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod dedup;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::{ListingSource, RedditClient};
pub use config::{Config, SortMode, TimeRange};
pub use dedup::DedupIndex;
pub use download::{CancelHandle, DownloadWorkerPool, Paginator, RunState, Scraper};
pub use error::{Error, Result};
pub use media::{Post, ResolvedImage};
