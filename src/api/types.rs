//! Listing response schema and its mapping onto [`Post`].
//!
//! Only the fields the pipeline reads are declared. `id` and `title` are
//! required on every child; a listing that lacks them fails to deserialize and
//! is reported as a malformed response.

use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::media::{MediaCandidate, Post};

/// Top-level listing envelope: `{"kind": "Listing", "data": {...}}`.
#[derive(Debug, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    pub children: Vec<ListingChild>,
    /// Continuation cursor. `null` or absent on the last page.
    #[serde(default)]
    pub after: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListingChild {
    #[serde(default)]
    pub kind: Option<String>,
    pub data: PostData,
}

/// A `t3` (link) entry as it appears in the listing.
#[derive(Debug, Deserialize)]
pub struct PostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub preview: Option<Preview>,
    #[serde(default)]
    pub is_gallery: bool,
    #[serde(default)]
    pub gallery_data: Option<GalleryData>,
    /// Keyed by media id. Key order follows the document.
    #[serde(default)]
    pub media_metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewImage {
    pub source: PreviewSource,
}

#[derive(Debug, Deserialize)]
pub struct PreviewSource {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryData {
    #[serde(default)]
    pub items: Vec<GalleryItem>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryItem {
    pub media_id: String,
}

/// One entry of `media_metadata`.
#[derive(Debug, Deserialize)]
pub struct MediaMetadata {
    #[serde(default)]
    pub status: Option<String>,
    /// MIME type, e.g. `image/jpg`.
    #[serde(default)]
    pub m: Option<String>,
    /// Full-size source.
    #[serde(default)]
    pub s: Option<MediaSource>,
}

#[derive(Debug, Deserialize)]
pub struct MediaSource {
    #[serde(default)]
    pub u: Option<String>,
    #[serde(default)]
    pub gif: Option<String>,
    #[serde(default)]
    pub x: Option<u32>,
    #[serde(default)]
    pub y: Option<u32>,
}

impl PostData {
    /// Map the raw listing entry onto a [`Post`].
    ///
    /// Self posts and hosted videos keep no media candidates, so they never
    /// resolve to an image.
    pub fn into_post(self) -> Post {
        let created_at = Utc
            .timestamp_opt(self.created_utc as i64, 0)
            .single()
            .unwrap_or_default();

        let media_candidates = if self.is_self || self.is_video {
            Vec::new()
        } else {
            self.media_candidates()
        };

        Post {
            id: self.id,
            title: self.title,
            score: self.score,
            created_at,
            is_nsfw: self.over_18,
            media_candidates,
        }
    }

    fn media_candidates(&self) -> Vec<MediaCandidate> {
        let mut candidates = Vec::new();

        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            candidates.push(MediaCandidate::Link {
                url: url.to_string(),
            });
        }

        if let Some(source) = self
            .preview
            .as_ref()
            .and_then(|p| p.images.first())
            .map(|image| &image.source)
        {
            candidates.push(MediaCandidate::Preview {
                url: source.url.clone(),
                width: source.width,
                height: source.height,
            });
        }

        if self.is_gallery || self.gallery_data.is_some() {
            candidates.extend(self.gallery_candidate());
        }

        candidates
    }

    /// The first item of the gallery's declared order, if it is usable.
    ///
    /// `gallery_data.items` carries the order shown to readers; when it is
    /// missing, `media_metadata` document order is used instead. An unusable
    /// first item yields nothing rather than falling through to later ones.
    fn gallery_candidate(&self) -> Option<MediaCandidate> {
        let metadata = self.media_metadata.as_ref()?;

        let first_id = match &self.gallery_data {
            Some(data) if !data.items.is_empty() => data.items[0].media_id.as_str(),
            _ => metadata.keys().next()?.as_str(),
        };

        let meta = serde_json::from_value::<MediaMetadata>(metadata.get(first_id)?.clone()).ok()?;
        if meta.status.as_deref().is_some_and(|status| status != "valid") {
            return None;
        }

        let source = meta.s?;
        let url = source.u.or(source.gif)?;
        Some(MediaCandidate::GalleryItem {
            url,
            mime: meta.m,
            width: source.x,
            height: source.y,
        })
    }
}

impl Listing {
    /// Parse a listing body, reporting schema mismatches as a single error string.
    pub fn parse(body: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(body).map_err(|e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t3_next",
            "children": [
                {"kind": "t3", "data": {
                    "id": "abc", "title": "Mountains", "score": 42,
                    "created_utc": 1700000000.0, "over_18": false,
                    "is_self": false, "is_video": false,
                    "url": "https://i.redd.it/abc.jpg",
                    "preview": {"images": [{"source": {
                        "url": "https://preview.redd.it/abc.jpg?width=1920&amp;s=x",
                        "width": 1920, "height": 1080}}]}
                }},
                {"kind": "t3", "data": {
                    "id": "self1", "title": "Discussion", "is_self": true,
                    "url": "https://www.reddit.com/r/x/comments/self1/"
                }},
                {"kind": "t3", "data": {
                    "id": "gal", "title": "Album", "is_gallery": true,
                    "url": "https://www.reddit.com/gallery/gal",
                    "gallery_data": {"items": [{"media_id": "m2"}, {"media_id": "m1"}]},
                    "media_metadata": {
                        "m1": {"status": "valid", "m": "image/png", "s": {"u": "https://preview.redd.it/m1.png?a=1&amp;b=2", "x": 100, "y": 50}},
                        "m2": {"status": "valid", "m": "image/jpg", "s": {"u": "https://preview.redd.it/m2.jpg?a=1&amp;b=2", "x": 800, "y": 600}}
                    }
                }}
            ]
        }
    }"#;

    #[test]
    fn test_parse_listing() {
        let listing = Listing::parse(LISTING).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_next"));
        assert_eq!(listing.data.children.len(), 3);

        let posts: Vec<Post> = listing
            .data
            .children
            .into_iter()
            .map(|c| c.data.into_post())
            .collect();

        assert_eq!(posts[0].id, "abc");
        assert_eq!(posts[0].score, 42);
        assert_eq!(posts[0].created_at.timestamp(), 1_700_000_000);
        assert_eq!(posts[0].media_candidates.len(), 2);
        assert!(posts[1].media_candidates.is_empty());
    }

    #[test]
    fn test_gallery_follows_declared_order() {
        let listing = Listing::parse(LISTING).unwrap();
        let post = listing
            .data
            .children
            .into_iter()
            .nth(2)
            .unwrap()
            .data
            .into_post();

        let gallery: Vec<&str> = post
            .media_candidates
            .iter()
            .filter_map(|c| match c {
                MediaCandidate::GalleryItem { url, .. } => Some(url.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(gallery.len(), 1);
        assert!(gallery[0].contains("m2.jpg"));
    }

    fn gallery_post(metadata: &str) -> Post {
        let body = format!(
            r#"{{"data": {{"children": [{{"data": {{
                "id": "gal", "title": "Album", "is_gallery": true,
                "url": "https://www.reddit.com/gallery/gal",
                "gallery_data": {{"items": [{{"media_id": "m1"}}, {{"media_id": "m2"}}]}},
                "media_metadata": {}
            }}}}]}}}}"#,
            metadata
        );
        Listing::parse(&body)
            .unwrap()
            .data
            .children
            .into_iter()
            .next()
            .unwrap()
            .data
            .into_post()
    }

    #[test]
    fn test_unusable_first_gallery_item_is_not_skipped() {
        let post = gallery_post(
            r#"{
                "m1": {"status": "failed"},
                "m2": {"status": "valid", "m": "image/jpg", "s": {"u": "https://preview.redd.it/m2.jpg", "x": 10, "y": 10}}
            }"#,
        );

        assert!(!post
            .media_candidates
            .iter()
            .any(|c| matches!(c, MediaCandidate::GalleryItem { .. })));
        assert!(crate::media::resolve(&post).is_none());
    }

    #[test]
    fn test_first_gallery_item_without_source() {
        let post = gallery_post(
            r#"{
                "m1": {"status": "valid", "m": "image/png"},
                "m2": {"status": "valid", "m": "image/jpg", "s": {"u": "https://preview.redd.it/m2.jpg"}}
            }"#,
        );
        assert!(crate::media::resolve(&post).is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let body = r#"{"data": {"children": [{"data": {"title": "no id"}}], "after": null}}"#;
        assert!(Listing::parse(body).is_err());
        assert!(Listing::parse("<html>blocked</html>").is_err());
    }

    #[test]
    fn test_after_absent() {
        let listing = Listing::parse(r#"{"data": {"children": []}}"#).unwrap();
        assert!(listing.data.after.is_none());
        assert!(listing.data.children.is_empty());
    }
}
