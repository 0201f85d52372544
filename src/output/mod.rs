//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - A progress bar driven by scrape events
//! - The end-of-run summary

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{print_banner, print_config_summary, print_error, print_info, print_success, print_warning};
pub use progress::{create_item_bar, ConsoleSink};
pub use stats::{format_bytes, print_run_summary};
