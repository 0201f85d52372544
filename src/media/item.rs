//! Post and resolved image representation.

use chrono::{DateTime, Utc};
use std::fmt;

/// A raw media hint taken from a listing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCandidate {
    /// The post's outbound link.
    Link { url: String },

    /// First preview image source generated by the listing host.
    Preview {
        url: String,
        width: Option<u32>,
        height: Option<u32>,
    },

    /// One gallery entry, in the gallery's declared order.
    GalleryItem {
        url: String,
        mime: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    },
}

/// A single listing entry.
#[derive(Debug, Clone)]
pub struct Post {
    /// Unique post ID (base36, without the `t3_` kind prefix).
    pub id: String,

    pub title: String,

    /// Net score. May be negative.
    pub score: i64,

    pub created_at: DateTime<Utc>,

    pub is_nsfw: bool,

    /// Ordered media hints: link first, then preview, then gallery items.
    pub media_candidates: Vec<MediaCandidate>,
}

impl Post {
    /// Dimensions of the first preview candidate, if the listing reported them.
    pub fn preview_dimensions(&self) -> (Option<u32>, Option<u32>) {
        self.media_candidates
            .iter()
            .find_map(|candidate| match candidate {
                MediaCandidate::Preview { width, height, .. } => Some((*width, *height)),
                _ => None,
            })
            .unwrap_or((None, None))
    }

    /// The outbound link, if any.
    pub fn link(&self) -> Option<&str> {
        self.media_candidates.iter().find_map(|candidate| match candidate {
            MediaCandidate::Link { url } => Some(url.as_str()),
            _ => None,
        })
    }
}

/// Which resolution rule produced a [`ResolvedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionRule {
    DirectExtension,
    NativeHost,
    ThirdPartyHost,
    Preview,
    Gallery,
    ImgurPage,
}

impl fmt::Display for ResolutionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionRule::DirectExtension => "direct",
            ResolutionRule::NativeHost => "native host",
            ResolutionRule::ThirdPartyHost => "third-party host",
            ResolutionRule::Preview => "preview",
            ResolutionRule::Gallery => "gallery",
            ResolutionRule::ImgurPage => "imgur page",
        };
        f.write_str(name)
    }
}

/// A post reduced to one concrete fetchable image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub post_id: String,

    /// Post title, used for the cosmetic part of the filename.
    pub title: String,

    /// Absolute URL to fetch.
    pub source_url: String,

    /// Width in pixels, when known before fetching.
    pub width: Option<u32>,

    /// Height in pixels, when known before fetching.
    pub height: Option<u32>,

    /// File extension (without dot, lowercase).
    pub extension: String,

    pub rule: ResolutionRule,
}
