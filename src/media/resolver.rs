//! Image source resolution.
//!
//! Reduces a [`Post`] to at most one fetchable image URL. Rules are tried in
//! order and the first match wins:
//!
//! 1. outbound link whose path ends in a known image extension
//! 2. link on the native image host (`i.redd.it`)
//! 3. link on a known third-party direct-image host (`i.imgur.com`)
//! 4. preview image generated by the listing host
//! 5. first gallery item, by the gallery's declared order
//! 6. imgur page link without extension (rewritten to the direct image)
//!
//! Resolution is pure and never touches the network.

use url::Url;

use crate::media::item::{MediaCandidate, Post, ResolutionRule, ResolvedImage};

/// Extensions accepted as direct image links.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Image hosts run by the listing site itself.
const NATIVE_IMAGE_HOSTS: &[&str] = &["i.redd.it"];

/// Third-party hosts that serve raw image bytes at the linked URL.
const THIRD_PARTY_IMAGE_HOSTS: &[&str] = &["i.imgur.com"];

/// Hosts that serve listing-generated previews.
const PREVIEW_HOSTS: &[&str] = &["preview.redd.it", "external-preview.redd.it"];

/// Imgur page hosts (HTML pages wrapping a single image).
const IMGUR_PAGE_HOSTS: &[&str] = &["imgur.com", "www.imgur.com", "m.imgur.com"];

/// Extension used when neither the URL nor a MIME type names one.
const DEFAULT_EXTENSION: &str = "jpg";

/// Resolve a post to a single image, or `None` if it carries no usable media.
pub fn resolve(post: &Post) -> Option<ResolvedImage> {
    let (preview_width, preview_height) = post.preview_dimensions();

    let build = |url: String, extension: String, width, height, rule| ResolvedImage {
        post_id: post.id.clone(),
        title: post.title.clone(),
        source_url: url,
        width,
        height,
        extension,
        rule,
    };

    let link = post.link().map(unescape_entities).and_then(parse_http_url);

    if let Some((url, parsed)) = &link {
        if let Some(extension) = path_extension(parsed) {
            return Some(build(
                url.clone(),
                extension,
                preview_width,
                preview_height,
                ResolutionRule::DirectExtension,
            ));
        }

        if host_matches(parsed, NATIVE_IMAGE_HOSTS) {
            return Some(build(
                url.clone(),
                DEFAULT_EXTENSION.to_string(),
                preview_width,
                preview_height,
                ResolutionRule::NativeHost,
            ));
        }

        if host_matches(parsed, THIRD_PARTY_IMAGE_HOSTS) {
            return Some(build(
                url.clone(),
                DEFAULT_EXTENSION.to_string(),
                preview_width,
                preview_height,
                ResolutionRule::ThirdPartyHost,
            ));
        }
    }

    if let Some(image) = resolve_preview(post, link.as_ref()) {
        return Some(build(
            image.0,
            image.1,
            preview_width,
            preview_height,
            ResolutionRule::Preview,
        ));
    }

    if let Some(image) = resolve_gallery(post) {
        return Some(image_with_post(post, image));
    }

    if let Some((_, parsed)) = &link {
        if let Some(url) = imgur_direct_url(parsed) {
            return Some(build(
                url,
                DEFAULT_EXTENSION.to_string(),
                preview_width,
                preview_height,
                ResolutionRule::ImgurPage,
            ));
        }
    }

    None
}

/// Preview source from listing metadata, or a link that already points at a
/// preview host. Returns `(url, extension)`.
fn resolve_preview(post: &Post, link: Option<&(String, Url)>) -> Option<(String, String)> {
    let preview = post.media_candidates.iter().find_map(|candidate| match candidate {
        MediaCandidate::Preview { url, .. } => Some(unescape_entities(url)),
        _ => None,
    });

    if let Some((url, parsed)) = preview.and_then(parse_http_url) {
        let extension = path_extension(&parsed).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
        return Some((url, extension));
    }

    match link {
        Some((url, parsed)) if host_matches(parsed, PREVIEW_HOSTS) => Some((
            url.clone(),
            path_extension(parsed).unwrap_or_else(|| DEFAULT_EXTENSION.to_string()),
        )),
        _ => None,
    }
}

struct GalleryPick {
    url: String,
    extension: String,
    width: Option<u32>,
    height: Option<u32>,
}

/// First gallery item only. Later items are never inspected, even when the
/// first one is unusable.
fn resolve_gallery(post: &Post) -> Option<GalleryPick> {
    let (url, mime, width, height) =
        post.media_candidates.iter().find_map(|candidate| match candidate {
            MediaCandidate::GalleryItem {
                url,
                mime,
                width,
                height,
            } => Some((url, mime, *width, *height)),
            _ => None,
        })?;

    let (url, parsed) = parse_http_url(unescape_entities(url))?;
    let extension = path_extension(&parsed)
        .or_else(|| mime.as_deref().and_then(mime_extension))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

    Some(GalleryPick {
        url,
        extension,
        width,
        height,
    })
}

fn image_with_post(post: &Post, pick: GalleryPick) -> ResolvedImage {
    ResolvedImage {
        post_id: post.id.clone(),
        title: post.title.clone(),
        source_url: pick.url,
        width: pick.width,
        height: pick.height,
        extension: pick.extension,
        rule: ResolutionRule::Gallery,
    }
}

/// `https://imgur.com/AbCd` -> `https://i.imgur.com/AbCd.jpg`. Albums and
/// galleries hold several images and are not rewritten.
fn imgur_direct_url(parsed: &Url) -> Option<String> {
    if !host_matches(parsed, IMGUR_PAGE_HOSTS) {
        return None;
    }

    let segments: Vec<&str> = parsed
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    match segments.as_slice() {
        [id] if id.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Some(format!("https://i.imgur.com/{}.{}", id, DEFAULT_EXTENSION))
        }
        _ => None,
    }
}

/// Listing JSON encodes `&` in URLs as `&amp;`.
pub fn unescape_entities(url: &str) -> String {
    url.replace("&amp;", "&")
}

fn parse_http_url(url: String) -> Option<(String, Url)> {
    let parsed = Url::parse(&url).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some((url, parsed)),
        _ => None,
    }
}

fn host_matches(url: &Url, hosts: &[&str]) -> bool {
    url.host_str()
        .map(|host| hosts.iter().any(|h| host.eq_ignore_ascii_case(h)))
        .unwrap_or(false)
}

/// Lowercased extension of the last path segment, restricted to
/// [`IMAGE_EXTENSIONS`].
fn path_extension(url: &Url) -> Option<String> {
    let filename = url.path_segments()?.next_back()?;
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();

    IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Map a MIME type to one of [`IMAGE_EXTENSIONS`].
pub fn mime_extension(mime: &str) -> Option<String> {
    let essence = mime.split(';').next()?.trim().to_ascii_lowercase();

    // Listing metadata uses the non-standard `image/jpg`.
    if essence == "image/jpg" {
        return Some("jpg".to_string());
    }

    let candidates = mime_guess::get_mime_extensions_str(&essence)?;
    if candidates.contains(&"jpg") {
        return Some("jpg".to_string());
    }

    candidates
        .iter()
        .find(|ext| IMAGE_EXTENSIONS.contains(*ext))
        .map(|ext| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn post(candidates: Vec<MediaCandidate>) -> Post {
        Post {
            id: "p1".into(),
            title: "A title".into(),
            score: 10,
            created_at: Utc::now(),
            is_nsfw: false,
            media_candidates: candidates,
        }
    }

    fn link(url: &str) -> MediaCandidate {
        MediaCandidate::Link { url: url.into() }
    }

    fn preview(url: &str) -> MediaCandidate {
        MediaCandidate::Preview {
            url: url.into(),
            width: Some(1920),
            height: Some(1080),
        }
    }

    fn gallery(url: &str, mime: Option<&str>) -> MediaCandidate {
        MediaCandidate::GalleryItem {
            url: url.into(),
            mime: mime.map(String::from),
            width: Some(800),
            height: Some(600),
        }
    }

    #[test]
    fn test_direct_extension() {
        let image = resolve(&post(vec![
            link("https://example.com/photos/Sunset.PNG"),
            preview("https://preview.redd.it/x.jpg?s=1"),
        ]))
        .unwrap();

        assert_eq!(image.rule, ResolutionRule::DirectExtension);
        assert_eq!(image.source_url, "https://example.com/photos/Sunset.PNG");
        assert_eq!(image.extension, "png");
        assert_eq!(image.width, Some(1920));
        assert_eq!(image.post_id, "p1");
    }

    #[test]
    fn test_native_host_without_extension() {
        let image = resolve(&post(vec![link("https://i.redd.it/abcdef")])).unwrap();
        assert_eq!(image.rule, ResolutionRule::NativeHost);
        assert_eq!(image.extension, "jpg");
        assert!(image.width.is_none());
    }

    #[test]
    fn test_third_party_host() {
        let image = resolve(&post(vec![link("https://i.imgur.com/xyz")])).unwrap();
        assert_eq!(image.rule, ResolutionRule::ThirdPartyHost);
        assert_eq!(image.source_url, "https://i.imgur.com/xyz");
    }

    #[test]
    fn test_preview_unescapes_entities() {
        let image = resolve(&post(vec![
            link("https://www.youtube.com/watch?v=1"),
            preview("https://external-preview.redd.it/abc.png?width=1&amp;s=sig"),
        ]))
        .unwrap();

        assert_eq!(image.rule, ResolutionRule::Preview);
        assert_eq!(
            image.source_url,
            "https://external-preview.redd.it/abc.png?width=1&s=sig"
        );
        assert_eq!(image.extension, "png");
        assert_eq!(image.height, Some(1080));
    }

    #[test]
    fn test_gallery_takes_first_item_only() {
        let image = resolve(&post(vec![
            link("https://www.reddit.com/gallery/p1"),
            gallery("https://preview.redd.it/first?format=png&amp;s=1", Some("image/png")),
            gallery("https://preview.redd.it/second.jpg", Some("image/jpg")),
            gallery("https://preview.redd.it/third.jpg", Some("image/jpg")),
        ]))
        .unwrap();

        assert_eq!(image.rule, ResolutionRule::Gallery);
        assert_eq!(image.source_url, "https://preview.redd.it/first?format=png&s=1");
        assert_eq!(image.extension, "png");
        assert_eq!(image.width, Some(800));
    }

    #[test]
    fn test_gallery_of_one_and_of_many_resolve_to_one_image() {
        for count in 1..6 {
            let mut candidates = vec![link("https://www.reddit.com/gallery/p1")];
            for i in 0..count {
                candidates.push(gallery(
                    &format!("https://preview.redd.it/item{}.jpg", i),
                    Some("image/jpg"),
                ));
            }
            let image = resolve(&post(candidates)).unwrap();
            assert_eq!(image.source_url, "https://preview.redd.it/item0.jpg");
        }
    }

    #[test]
    fn test_imgur_page_rewritten() {
        let image = resolve(&post(vec![link("https://imgur.com/AbC12")])).unwrap();
        assert_eq!(image.rule, ResolutionRule::ImgurPage);
        assert_eq!(image.source_url, "https://i.imgur.com/AbC12.jpg");

        assert!(resolve(&post(vec![link("https://imgur.com/a/AbC12")])).is_none());
        assert!(resolve(&post(vec![link("https://imgur.com/gallery/AbC12")])).is_none());
    }

    #[test]
    fn test_unresolvable() {
        assert!(resolve(&post(Vec::new())).is_none());
        assert!(resolve(&post(vec![link("https://www.reddit.com/r/pics/comments/p1/")])).is_none());
        assert!(resolve(&post(vec![link("https://v.redd.it/video123")])).is_none());
        assert!(resolve(&post(vec![link("ftp://example.com/a.jpg")])).is_none());
        assert!(resolve(&post(vec![link("https://example.com/clip.mp4")])).is_none());
    }

    #[test]
    fn test_mime_extension() {
        assert_eq!(mime_extension("image/jpg").as_deref(), Some("jpg"));
        assert_eq!(mime_extension("image/jpeg").as_deref(), Some("jpg"));
        assert_eq!(mime_extension("image/png; charset=binary").as_deref(), Some("png"));
        assert_eq!(mime_extension("image/webp").as_deref(), Some("webp"));
        assert!(mime_extension("text/html").is_none());
    }
}
