//! Download pipeline.
//!
//! This module provides:
//! - Listing pagination with throttling and retry handling
//! - The concurrent download worker pool
//! - Single image fetch and atomic write
//! - Run state, outcomes and progress events
//! - The scrape run that ties them together

pub mod events;
pub mod media;
pub mod paginator;
pub mod pool;
pub mod scrape;
pub mod state;

pub use events::{CollectingSink, EventSink, ScrapeEvent, TracingSink};
pub use media::ImageDownloader;
pub use paginator::{EndReason, Paginator, PaginatorSettings};
pub use pool::DownloadWorkerPool;
pub use scrape::{CancelHandle, Scraper};
pub use state::{DownloadOutcome, DownloadResult, FailureKind, RunPhase, RunState, SkipReason};
