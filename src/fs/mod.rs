//! Filesystem module.
//!
//! Provides:
//! - Path and directory management
//! - Filename generation and post id extraction

pub mod naming;
pub mod paths;

pub use naming::{
    image_filename, partial_filename, post_id_from_filename, sanitize_filename, sanitize_title,
    PARTIAL_SUFFIX,
};
pub use paths::{ensure_dir, get_subreddit_folder, sanitize_path_component};
