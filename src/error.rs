//! Error types for the subreddit downloader.

use thiserror::Error;

/// Main error type for the application.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Listing errors
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    #[error("Malformed listing response: {0}")]
    MalformedResponse(String),

    #[error("Pagination aborted after {attempts} attempts: {message}")]
    PaginationAborted { attempts: u32, message: String },

    // Download errors
    #[error("Image host returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    // File system errors
    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl Error {
    /// Whether a listing request that failed with this error may be retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::TransientNetwork(_) => true,
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request() || e.is_body(),
            _ => false,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
