//! Listing API module.
//!
//! This module provides:
//! - HTTP client for the public JSON listing endpoints and image hosts
//! - The `ListingSource` seam used by the paginator
//! - Listing response types and their mapping onto posts

pub mod client;
pub mod types;

pub use client::{ListingPage, ListingQuery, ListingSource, RedditClient, PAGE_SIZE};
pub use types::Listing;
