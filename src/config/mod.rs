//! Configuration module for the subreddit downloader.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Listing sort modes and time ranges
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{Config, FilterConfig, NetworkConfig, OptionsConfig, TargetConfig};
pub use modes::{SortMode, TimeRange};
pub use validation::{normalize_subreddit, validate_config, validate_subreddit};
