//! Bounded pool of concurrent download workers.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::download::media::ImageDownloader;
use crate::download::state::{DownloadResult, FailureKind};
use crate::error::{Error, Result};
use crate::media::ResolvedImage;

/// Queue slots per worker. Submission waits once the queue is full.
const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Fixed-size set of workers pulling [`ResolvedImage`]s off a shared queue.
///
/// Each submitted image produces exactly one [`DownloadResult`] on the result
/// channel handed to [`DownloadWorkerPool::start`]. Results arrive in
/// completion order, not submission order.
pub struct DownloadWorkerPool {
    sender: mpsc::Sender<ResolvedImage>,
    handles: Vec<JoinHandle<()>>,
}

impl DownloadWorkerPool {
    /// Spawn `workers` tasks (at least one).
    pub fn start(
        workers: usize,
        downloader: Arc<ImageDownloader>,
        results: mpsc::UnboundedSender<DownloadResult>,
    ) -> Self {
        let workers = workers.max(1);
        let (sender, receiver) = mpsc::channel::<ResolvedImage>(workers * QUEUE_DEPTH_PER_WORKER);
        let queue = Arc::new(Mutex::new(receiver));

        let handles = (0..workers)
            .map(|worker_id| {
                let queue = Arc::clone(&queue);
                let downloader = Arc::clone(&downloader);
                let results = results.clone();

                tokio::spawn(async move {
                    loop {
                        let image = {
                            let mut queue = queue.lock().await;
                            queue.recv().await
                        };

                        let Some(image) = image else {
                            break;
                        };

                        tracing::debug!("Worker {} fetching {}", worker_id, image.source_url);
                        let result = run_isolated(Arc::clone(&downloader), image).await;

                        if results.send(result).is_err() {
                            tracing::debug!("Result receiver dropped, worker {} exiting", worker_id);
                            break;
                        }
                    }
                })
            })
            .collect();

        Self { sender, handles }
    }

    /// Queue an image for download, waiting for a free slot.
    pub async fn submit(&self, image: ResolvedImage) -> Result<()> {
        self.sender
            .send(image)
            .await
            .map_err(|e| Error::FetchFailed(format!("Worker pool closed before {}", e.0.post_id)))
    }

    /// Close the queue and wait for every queued download to finish.
    pub async fn shutdown(self) {
        drop(self.sender);
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("Download worker terminated abnormally: {}", e);
            }
        }
    }
}

/// Run one download on its own task. A panic becomes a failed result.
async fn run_isolated(downloader: Arc<ImageDownloader>, image: ResolvedImage) -> DownloadResult {
    let post_id = image.post_id.clone();
    match tokio::spawn(async move { downloader.download(&image).await }).await {
        Ok(result) => result,
        Err(e) => DownloadResult::failed(post_id, FailureKind::Network(format!("worker task failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::RedditClient;
    use crate::config::NetworkConfig;
    use crate::dedup::DedupIndex;
    use crate::download::state::DownloadOutcome;
    use crate::media::ResolutionRule;
    use std::collections::HashSet;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image(id: &str, url: String) -> ResolvedImage {
        ResolvedImage {
            post_id: id.into(),
            title: format!("title {}", id),
            source_url: url,
            width: None,
            height: None,
            extension: "jpg".into(),
            rule: ResolutionRule::DirectExtension,
        }
    }

    #[tokio::test]
    async fn test_every_item_yields_one_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok.jpg"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0xFFu8, 0xD8, 0xFF], "image/jpeg")
                    .set_delay(Duration::from_millis(20)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.jpg"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let tmp = tempfile::tempdir().unwrap();
        let client = Arc::new(RedditClient::new(&NetworkConfig::default()).unwrap());
        let downloader = Arc::new(ImageDownloader::new(
            client,
            Some(Arc::new(DedupIndex::new())),
            tmp.path().to_path_buf(),
        ));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = DownloadWorkerPool::start(3, downloader, tx);

        for i in 0..10 {
            let route = if i % 5 == 0 { "gone" } else { "ok" };
            pool.submit(image(&format!("id{}", i), format!("{}/{}.jpg", server.uri(), route)))
                .await
                .unwrap();
        }
        pool.shutdown().await;

        let mut ids = HashSet::new();
        let mut saved = 0;
        let mut failed = 0;
        while let Ok(result) = rx.try_recv() {
            assert!(ids.insert(result.post_id.clone()));
            match result.outcome {
                DownloadOutcome::Saved { .. } => saved += 1,
                DownloadOutcome::Failed(_) => failed += 1,
                DownloadOutcome::Skipped(_) => {}
            }
        }

        assert_eq!(ids.len(), 10);
        assert_eq!(saved, 8);
        assert_eq!(failed, 2);
    }

    #[tokio::test]
    async fn test_shutdown_with_nothing_submitted() {
        let tmp = tempfile::tempdir().unwrap();
        let client = Arc::new(RedditClient::new(&NetworkConfig::default()).unwrap());
        let downloader = Arc::new(ImageDownloader::new(client, None, tmp.path().to_path_buf()));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let pool = DownloadWorkerPool::start(5, downloader, tx);
        pool.shutdown().await;

        assert!(rx.recv().await.is_none());
    }
}
