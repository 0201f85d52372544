//! Configuration validation logic.

use std::sync::OnceLock;

use crate::config::loader::Config;
use crate::error::{Error, Result};
use regex::Regex;

/// Maximum number of concurrent download workers.
const MAX_WORKERS: usize = 32;

/// Subreddit names: 2-21 chars, alphanumeric and underscores.
fn subreddit_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_]{2,21}$").expect("valid regex"))
}

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_subreddit(&config.target.subreddit)?;

    if config.target.limit == 0 {
        return Err(Error::ConfigValidation {
            field: "limit".to_string(),
            message: "Limit must be at least 1".to_string(),
        });
    }

    if config.options.workers == 0 || config.options.workers > MAX_WORKERS {
        return Err(Error::ConfigValidation {
            field: "workers".to_string(),
            message: format!(
                "Worker count must be between 1 and {} (got {})",
                MAX_WORKERS, config.options.workers
            ),
        });
    }

    if config.network.max_pages == 0 {
        return Err(Error::ConfigValidation {
            field: "max_pages".to_string(),
            message: "Page ceiling must be at least 1".to_string(),
        });
    }

    url::Url::parse(&config.network.api_base)?;

    Ok(())
}

/// Validate a subreddit name.
pub fn validate_subreddit(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::MissingConfig("subreddit".to_string()));
    }

    if !subreddit_pattern().is_match(name) {
        return Err(Error::ConfigValidation {
            field: "subreddit".to_string(),
            message: format!(
                "Subreddit '{}' is invalid. Use 2-21 letters, digits or underscores.",
                name
            ),
        });
    }

    Ok(())
}

/// Strip an `r/` or `/r/` prefix and surrounding whitespace.
pub fn normalize_subreddit(input: &str) -> String {
    let trimmed = input.trim().trim_start_matches('/');
    trimmed
        .strip_prefix("r/")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}
