//! Deduplication module.
//!
//! Provides:
//! - Directory scan for previously saved post ids
//! - Thread-safe membership set shared by download workers

pub mod index;

pub use index::DedupIndex;
