//! Filename generation and manipulation.
//!
//! Saved images are named `{post_id}_{title}.{ext}`. The post id prefix is
//! what the dedup index reads back; everything after the first `_` is
//! cosmetic.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::media::ResolvedImage;

/// Maximum number of title characters kept in a filename.
const MAX_TITLE_CHARS: usize = 80;

/// Byte cap on the title part. Keeps `{id}_{title}.{ext}` under the common
/// 255-byte filename limit for multi-byte titles.
const MAX_TITLE_BYTES: usize = 200;

/// Suffix of in-progress downloads.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Validate a filename, rejecting path traversal and separators.
pub fn sanitize_filename(name: &str) -> Result<String> {
    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    if name.trim().is_empty() {
        return Err(Error::InvalidFilename(
            "Filename cannot be empty or whitespace-only".to_string(),
        ));
    }

    Ok(name.to_string())
}

/// Strip characters that are invalid in filenames on common platforms and
/// truncate to a readable length.
///
/// Runs of dots collapse to one, so an ellipsis never reads as `..`.
pub fn sanitize_title(title: &str) -> String {
    let mut cleaned = String::new();
    let mut kept = 0;

    for c in title
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
    {
        if c == '.' && cleaned.ends_with('.') {
            continue;
        }
        if kept == MAX_TITLE_CHARS || cleaned.len() + c.len_utf8() > MAX_TITLE_BYTES {
            break;
        }
        cleaned.push(c);
        kept += 1;
    }

    // A title of dots would otherwise read as a relative path component.
    cleaned.trim().trim_matches('.').trim().to_string()
}

/// Final filename for a resolved image.
pub fn image_filename(image: &ResolvedImage) -> Result<String> {
    if image.post_id.contains('_') {
        return Err(Error::InvalidFilename(format!(
            "Post id must not contain '_': '{}'",
            image.post_id
        )));
    }

    let title = sanitize_title(&image.title);
    let name = if title.is_empty() {
        format!("{}.{}", image.post_id, image.extension)
    } else {
        format!("{}_{}.{}", image.post_id, title, image.extension)
    };

    sanitize_filename(&name)
}

/// Hidden temporary filename used while a download is in flight.
pub fn partial_filename(post_id: &str) -> String {
    format!(".{}.{}{}", post_id, Uuid::new_v4().simple(), PARTIAL_SUFFIX)
}

/// Post id encoded in a saved filename, if it is one of ours.
pub fn post_id_from_filename(filename: &str) -> Option<&str> {
    if filename.starts_with('.') || filename.ends_with(PARTIAL_SUFFIX) {
        return None;
    }

    let stem = match filename.rfind('.') {
        Some(pos) => &filename[..pos],
        None => filename,
    };
    let id = stem.split('_').next()?;

    (!id.is_empty()).then_some(id)
}
