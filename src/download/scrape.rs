//! One scrape run: listing pages in, saved images out.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::api::{ListingQuery, ListingSource, RedditClient};
use crate::config::Config;
use crate::dedup::DedupIndex;
use crate::download::events::{EventSink, ScrapeEvent, TracingSink};
use crate::download::media::ImageDownloader;
use crate::download::paginator::{Paginator, PaginatorSettings};
use crate::download::pool::DownloadWorkerPool;
use crate::download::state::{DownloadResult, FailureKind, RunPhase, RunState, SkipReason};
use crate::error::Result;
use crate::fs::{ensure_dir, get_subreddit_folder};
use crate::media::{accept, resolve, Post, RejectReason, ResolvedImage};

/// Stops a running [`Scraper`] at the next page boundary.
///
/// Downloads already queued are allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle(Arc<AtomicBool>);

impl CancelHandle {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives pagination, filtering and downloads for one subreddit.
pub struct Scraper {
    config: Config,
    client: Arc<RedditClient>,
    source: Arc<dyn ListingSource>,
    sink: Arc<dyn EventSink>,
    cancel: CancelHandle,
}

impl Scraper {
    /// Listings and images both go through `client`.
    pub fn new(config: Config, client: Arc<RedditClient>) -> Self {
        let source: Arc<dyn ListingSource> = client.clone();
        Self {
            config,
            client,
            source,
            sink: Arc::new(TracingSink),
            cancel: CancelHandle::default(),
        }
    }

    /// Read listing pages from `source` instead of the client.
    pub fn with_source(mut self, source: Arc<dyn ListingSource>) -> Self {
        self.source = source;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run to completion and return the final counters.
    ///
    /// Only setup failures (output directory, index scan) are returned as
    /// errors. Pagination failures end the run early and are recorded in
    /// [`RunState::aborted`].
    pub async fn run(&self) -> Result<RunState> {
        let target_dir = get_subreddit_folder(&self.config)?;
        ensure_dir(&target_dir).await?;

        let dedup = if self.config.options.skip_existing {
            let index = DedupIndex::scan(&target_dir)?;
            tracing::info!(
                "Found {} existing images in {}",
                index.len(),
                target_dir.display()
            );
            Some(Arc::new(index))
        } else {
            None
        };

        let state = Arc::new(Mutex::new(RunState::default()));
        let (results_tx, mut results_rx) = mpsc::unbounded_channel::<DownloadResult>();

        let collector = {
            let state = Arc::clone(&state);
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                while let Some(result) = results_rx.recv().await {
                    lock(&state).record_result(&result);
                    sink.emit(ScrapeEvent::Finished(result));
                }
            })
        };

        let downloader = Arc::new(ImageDownloader::new(
            Arc::clone(&self.client),
            dedup.clone(),
            target_dir,
        ));
        let pool = DownloadWorkerPool::start(self.config.options.workers, downloader, results_tx.clone());

        lock(&state).phase = RunPhase::Paginating;
        self.paginate(&state, &pool, dedup.as_deref(), &results_tx).await;

        lock(&state).phase = RunPhase::Draining;
        tracing::debug!("Waiting for in-flight downloads");
        pool.shutdown().await;
        drop(results_tx);
        if let Err(e) = collector.await {
            tracing::error!("Result collector terminated abnormally: {}", e);
        }

        let final_state = {
            let mut state = lock(&state);
            state.phase = RunPhase::Done;
            state.clone()
        };

        if !final_state.is_balanced() {
            tracing::warn!(
                "Outcome counts do not add up: {} accepted, {} completed",
                final_state.accepted,
                final_state.completed()
            );
        }

        self.sink.emit(ScrapeEvent::RunComplete(final_state.clone()));
        Ok(final_state)
    }

    async fn paginate(
        &self,
        state: &Mutex<RunState>,
        pool: &DownloadWorkerPool,
        dedup: Option<&DedupIndex>,
        results: &mpsc::UnboundedSender<DownloadResult>,
    ) {
        let limit = u64::from(self.config.target.limit);
        let mut paginator = Paginator::new(
            Arc::clone(&self.source),
            ListingQuery::from_config(&self.config),
            PaginatorSettings::from_config(&self.config.network),
        );
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted = 0u64;

        'pages: while accepted < limit {
            if self.cancel.is_cancelled() {
                tracing::info!("Cancelled, no further pages will be requested");
                lock(state).cancelled = true;
                break;
            }

            let next = paginator.next_page().await;
            lock(state).rate_limit_retries = paginator.throttle_waits();

            let posts = match next {
                Ok(Some(posts)) => posts,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Pagination aborted: {}", e);
                    lock(state).aborted = Some(e.to_string());
                    break;
                }
            };

            {
                let mut state = lock(state);
                state.pages_fetched = paginator.pages_fetched();
                state.cursor = paginator.cursor().map(String::from);
            }
            self.sink.emit(ScrapeEvent::PageFetched {
                page: paginator.pages_fetched(),
                posts: posts.len(),
                cursor: paginator.cursor().map(String::from),
            });

            for post in posts {
                if accepted >= limit {
                    tracing::debug!("Limit of {} reached mid-page", limit);
                    break 'pages;
                }
                lock(state).posts_seen += 1;

                let image = match self.evaluate(&post, &mut seen) {
                    Ok(image) => image,
                    Err(reason) => {
                        lock(state).rejected += 1;
                        self.sink.emit(ScrapeEvent::Rejected {
                            post_id: post.id,
                            reason,
                        });
                        continue;
                    }
                };

                accepted += 1;
                lock(state).accepted += 1;
                self.sink.emit(ScrapeEvent::Accepted {
                    post_id: image.post_id.clone(),
                    url: image.source_url.clone(),
                });

                if dedup.is_some_and(|index| index.contains(&image.post_id)) {
                    send_or_record(
                        state,
                        results,
                        DownloadResult::skipped(image.post_id, SkipReason::AlreadyPresent),
                    );
                    continue;
                }

                let post_id = image.post_id.clone();
                if let Err(e) = pool.submit(image).await {
                    send_or_record(
                        state,
                        results,
                        DownloadResult::failed(post_id, FailureKind::Network(e.to_string())),
                    );
                }
            }
        }
    }

    /// Resolve and filter one post.
    fn evaluate(
        &self,
        post: &Post,
        seen: &mut HashSet<String>,
    ) -> std::result::Result<ResolvedImage, RejectReason> {
        if !seen.insert(post.id.clone()) {
            return Err(RejectReason::DuplicateInListing);
        }

        let image = resolve(post).ok_or(RejectReason::NoImage)?;
        accept(post, &image, &self.config.filters)?;
        Ok(image)
    }
}

/// Hand a result to the collector, or count it here if the collector is gone.
fn send_or_record(
    state: &Mutex<RunState>,
    results: &mpsc::UnboundedSender<DownloadResult>,
    result: DownloadResult,
) {
    if let Err(mpsc::error::SendError(result)) = results.send(result) {
        tracing::error!(
            "Result collector stopped, recording {} without events",
            result.post_id
        );
        lock(state).record_result(&result);
    }
}

fn lock(state: &Mutex<RunState>) -> MutexGuard<'_, RunState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
