//! Post acceptance predicates.

use std::fmt;

use crate::config::FilterConfig;
use crate::media::item::{Post, ResolvedImage};

/// Why a post was turned away before download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// No resolution rule produced an image URL.
    NoImage,
    ScoreTooLow { score: i64, min: i64 },
    Nsfw,
    TooNarrow { width: u32, min: u32 },
    TooShort { height: u32, min: u32 },
    /// The same post id already appeared earlier in this run's listing.
    DuplicateInListing,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::NoImage => write!(f, "no resolvable image"),
            RejectReason::ScoreTooLow { score, min } => {
                write!(f, "score {} below minimum {}", score, min)
            }
            RejectReason::Nsfw => write!(f, "nsfw"),
            RejectReason::TooNarrow { width, min } => {
                write!(f, "width {}px below minimum {}px", width, min)
            }
            RejectReason::TooShort { height, min } => {
                write!(f, "height {}px below minimum {}px", height, min)
            }
            RejectReason::DuplicateInListing => write!(f, "already seen in this run"),
        }
    }
}

/// Check a resolved post against the configured thresholds.
///
/// Unknown dimensions never reject: most sources only report them after the
/// image has been fetched.
pub fn accept(
    post: &Post,
    image: &ResolvedImage,
    criteria: &FilterConfig,
) -> Result<(), RejectReason> {
    if post.score < criteria.min_score {
        return Err(RejectReason::ScoreTooLow {
            score: post.score,
            min: criteria.min_score,
        });
    }

    if post.is_nsfw && !criteria.include_nsfw {
        return Err(RejectReason::Nsfw);
    }

    if let Some(width) = image.width {
        if width < criteria.min_width {
            return Err(RejectReason::TooNarrow {
                width,
                min: criteria.min_width,
            });
        }
    }

    if let Some(height) = image.height {
        if height < criteria.min_height {
            return Err(RejectReason::TooShort {
                height,
                min: criteria.min_height,
            });
        }
    }

    Ok(())
}

/// Boolean view of [`accept`].
pub fn is_accepted(post: &Post, image: &ResolvedImage, criteria: &FilterConfig) -> bool {
    accept(post, image, criteria).is_ok()
}
