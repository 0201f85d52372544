//! Single image download.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use reqwest::{header, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::api::RedditClient;
use crate::dedup::DedupIndex;
use crate::download::state::{DownloadResult, FailureKind, SkipReason};
use crate::error::{Error, Result};
use crate::fs::{image_filename, partial_filename};
use crate::media::ResolvedImage;

/// Fetches one image and persists it under the subreddit folder.
///
/// Bytes are streamed into a hidden `.part` file that is renamed into place
/// once complete, so a file carrying the post id prefix is always whole.
pub struct ImageDownloader {
    client: Arc<RedditClient>,
    dedup: Option<Arc<DedupIndex>>,
    target_dir: PathBuf,
}

impl ImageDownloader {
    /// `dedup` is `None` when existing files should be re-downloaded.
    pub fn new(
        client: Arc<RedditClient>,
        dedup: Option<Arc<DedupIndex>>,
        target_dir: PathBuf,
    ) -> Self {
        Self {
            client,
            dedup,
            target_dir,
        }
    }

    /// Download one image. Never fails: every problem becomes a
    /// [`FailureKind`] in the returned result.
    pub async fn download(&self, image: &ResolvedImage) -> DownloadResult {
        if let Some(index) = &self.dedup {
            if index.contains(&image.post_id) {
                return DownloadResult::skipped(&image.post_id, SkipReason::AlreadyPresent);
            }
            if !index.try_claim(&image.post_id) {
                return DownloadResult::skipped(&image.post_id, SkipReason::InFlight);
            }
        }

        let saved = match image_filename(image) {
            Ok(name) => {
                let output_path = self.target_dir.join(name);
                self.fetch_to(image, &output_path)
                    .await
                    .map(|bytes| (output_path, bytes))
            }
            Err(e) => Err(FailureKind::InvalidName(e.to_string())),
        };

        match saved {
            Ok((path, bytes)) => {
                if let Some(index) = &self.dedup {
                    index.record(&image.post_id);
                }
                DownloadResult::saved(&image.post_id, path, bytes)
            }
            Err(kind) => {
                if let Some(index) = &self.dedup {
                    index.release(&image.post_id);
                }
                DownloadResult::failed(&image.post_id, kind)
            }
        }
    }

    async fn fetch_to(
        &self,
        image: &ResolvedImage,
        output_path: &Path,
    ) -> std::result::Result<u64, FailureKind> {
        let response = self
            .client
            .download_file(&image.source_url)
            .await
            .map_err(classify)?;

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !content_type.starts_with("image/") {
            return Err(FailureKind::NotAnImage(content_type));
        }

        let partial_path = self.target_dir.join(partial_filename(&image.post_id));

        let written = match stream_to_file(response, &partial_path).await {
            Ok(0) => Err(FailureKind::Network("empty response body".to_string())),
            Ok(bytes) => Ok(bytes),
            Err(e) => Err(classify(e)),
        };

        let bytes = match written {
            Ok(bytes) => bytes,
            Err(kind) => {
                let _ = tokio::fs::remove_file(&partial_path).await;
                return Err(kind);
            }
        };

        if let Err(e) = tokio::fs::rename(&partial_path, output_path).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(FailureKind::Write(e.to_string()));
        }

        Ok(bytes)
    }
}

/// Stream a response body into `path`, returning the byte count.
async fn stream_to_file(response: Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| Error::FetchFailed(format!("Stream error: {}", e)))?;
        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
    }

    file.flush().await?;
    Ok(downloaded)
}

fn classify(error: Error) -> FailureKind {
    match error {
        Error::HttpStatus(code) => FailureKind::HttpStatus(code),
        Error::Io(e) => FailureKind::Write(e.to_string()),
        Error::InvalidFilename(msg) => FailureKind::InvalidName(msg),
        other => FailureKind::Network(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::download::state::DownloadOutcome;
    use crate::media::ResolutionRule;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image(id: &str, url: String) -> ResolvedImage {
        ResolvedImage {
            post_id: id.into(),
            title: "Test: image".into(),
            source_url: url,
            width: None,
            height: None,
            extension: "png".into(),
            rule: ResolutionRule::DirectExtension,
        }
    }

    fn downloader(dir: &Path, dedup: Option<Arc<DedupIndex>>) -> ImageDownloader {
        let client = RedditClient::new(&NetworkConfig::default()).unwrap();
        ImageDownloader::new(Arc::new(client), dedup, dir.to_path_buf())
    }

    #[tokio::test]
    async fn test_saves_and_records() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![1u8, 2, 3, 4], "image/png"),
            )
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let index = Arc::new(DedupIndex::new());
        let dl = downloader(tmp.path(), Some(Arc::clone(&index)));

        let result = dl
            .download(&image("p1", format!("{}/img.png", server.uri())))
            .await;

        let expected = tmp.path().join("p1_Test image.png");
        assert_eq!(
            result.outcome,
            DownloadOutcome::Saved {
                path: expected.clone(),
                bytes: 4
            }
        );
        assert_eq!(std::fs::read(&expected).unwrap(), vec![1u8, 2, 3, 4]);
        assert!(index.contains("p1"));

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_ellipsis_title_is_saved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8; 8], "image/png"))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dl = downloader(tmp.path(), Some(Arc::new(DedupIndex::new())));
        let mut item = image("abc123", format!("{}/img.png", server.uri()));
        item.title = "Wait... what is this".into();

        let result = dl.download(&item).await;

        let expected = tmp.path().join("abc123_Wait. what is this.png");
        assert_eq!(
            result.outcome,
            DownloadOutcome::Saved {
                path: expected.clone(),
                bytes: 8
            }
        );
        assert!(expected.is_file());
    }

    #[tokio::test]
    async fn test_failed_download_releases_claim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8, 2], "image/png"))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let index = Arc::new(DedupIndex::new());
        let dl = downloader(tmp.path(), Some(Arc::clone(&index)));
        let item = image("p1", format!("{}/img.png", server.uri()));

        let first = dl.download(&item).await;
        assert_eq!(first.outcome, DownloadOutcome::Failed(FailureKind::HttpStatus(500)));
        assert!(!index.contains("p1"));

        let second = dl.download(&item).await;
        assert!(matches!(second.outcome, DownloadOutcome::Saved { .. }));
        assert!(index.contains("p1"));
    }

    #[tokio::test]
    async fn test_concurrent_same_id_fetched_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![1u8, 2, 3], "image/png")
                    .set_delay(std::time::Duration::from_millis(100)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dl = downloader(tmp.path(), Some(Arc::new(DedupIndex::new())));
        let item = image("p1", format!("{}/img.png", server.uri()));

        let (a, b) = tokio::join!(dl.download(&item), dl.download(&item));
        let outcomes = [a.outcome, b.outcome];

        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, DownloadOutcome::Saved { .. }))
                .count(),
            1
        );
        assert!(outcomes
            .iter()
            .any(|o| *o == DownloadOutcome::Skipped(SkipReason::InFlight)));
    }

    #[tokio::test]
    async fn test_skips_indexed_post_without_fetching() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let index = Arc::new(DedupIndex::new());
        index.record("p1");
        let dl = downloader(tmp.path(), Some(index));

        let result = dl
            .download(&image("p1", format!("{}/img.png", server.uri())))
            .await;
        assert_eq!(
            result.outcome,
            DownloadOutcome::Skipped(SkipReason::AlreadyPresent)
        );
    }

    #[tokio::test]
    async fn test_http_error_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let index = Arc::new(DedupIndex::new());
        let dl = downloader(tmp.path(), Some(Arc::clone(&index)));

        let result = dl
            .download(&image("p1", format!("{}/img.png", server.uri())))
            .await;
        assert_eq!(
            result.outcome,
            DownloadOutcome::Failed(FailureKind::HttpStatus(403))
        );
        assert!(!index.contains("p1"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_image_content_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let dl = downloader(tmp.path(), None);

        let result = dl
            .download(&image("p1", format!("{}/img.png", server.uri())))
            .await;
        assert!(matches!(
            result.outcome,
            DownloadOutcome::Failed(FailureKind::NotAnImage(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let dl = downloader(tmp.path(), None);

        let result = dl
            .download(&image("p1", "http://127.0.0.1:9/img.png".to_string()))
            .await;
        assert!(matches!(
            result.outcome,
            DownloadOutcome::Failed(FailureKind::Network(_))
        ));
    }
}
