//! Download path management.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Error, Result};

/// Sanitize a path component (folder name) with less strict validation.
///
/// Separators and reserved characters are replaced rather than rejected;
/// traversal and empty names are still errors.
pub fn sanitize_path_component(name: &str) -> Result<String> {
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed: '{}'",
            name
        )));
    }

    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Path component cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(sanitized)
}

/// `{output_dir}/{subreddit}`, with the subreddit name sanitized.
pub fn get_subreddit_folder(config: &Config) -> Result<PathBuf> {
    let folder = sanitize_path_component(&config.target.subreddit)?;
    Ok(config.options.output_dir.join(folder))
}

/// Ensure a directory exists, creating it if necessary.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_subreddit_folder() {
        let mut config = Config::for_subreddit("wallpapers");
        config.options.output_dir = PathBuf::from("/downloads");

        let path = get_subreddit_folder(&config).unwrap();
        assert_eq!(path, PathBuf::from("/downloads/wallpapers"));
    }

    #[test]
    fn test_sanitize_path_component() {
        assert_eq!(sanitize_path_component("cats").unwrap(), "cats");
        assert_eq!(sanitize_path_component("a/b").unwrap(), "a_b");
        assert!(sanitize_path_component("../evil").is_err());
        assert!(sanitize_path_component("").is_err());
    }

    #[test]
    fn test_ensure_dir_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        tokio_test::block_on(ensure_dir(&nested)).unwrap();
        assert!(nested.is_dir());
        // Idempotent
        tokio_test::block_on(ensure_dir(&nested)).unwrap();
    }
}
