//! Progress events emitted during a run.

use std::sync::Mutex;

use crate::download::state::{DownloadResult, RunState};
use crate::media::RejectReason;

/// Something the presentation layer may want to show.
#[derive(Debug, Clone)]
pub enum ScrapeEvent {
    PageFetched {
        page: u32,
        posts: usize,
        cursor: Option<String>,
    },
    Accepted {
        post_id: String,
        url: String,
    },
    Rejected {
        post_id: String,
        reason: RejectReason,
    },
    /// An accepted image reached its terminal outcome.
    Finished(DownloadResult),
    RunComplete(RunState),
}

/// Receiver of [`ScrapeEvent`]s. Called from the pagination task and from
/// download workers, so implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ScrapeEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ScrapeEvent) {
        use crate::download::state::DownloadOutcome;

        match event {
            ScrapeEvent::PageFetched { page, posts, cursor } => {
                tracing::info!(
                    "Fetched page {} ({} posts, next: {})",
                    page,
                    posts,
                    cursor.as_deref().unwrap_or("none")
                );
            }
            ScrapeEvent::Accepted { post_id, url } => {
                tracing::debug!("Accepted {} -> {}", post_id, url);
            }
            ScrapeEvent::Rejected { post_id, reason } => {
                tracing::debug!("Rejected {}: {}", post_id, reason);
            }
            ScrapeEvent::Finished(result) => match result.outcome {
                DownloadOutcome::Saved { path, bytes } => {
                    tracing::info!("Saved {} ({} bytes)", path.display(), bytes);
                }
                DownloadOutcome::Skipped(reason) => {
                    tracing::debug!("Skipped {}: {}", result.post_id, reason);
                }
                DownloadOutcome::Failed(kind) => {
                    tracing::warn!("Failed {}: {}", result.post_id, kind);
                }
            },
            ScrapeEvent::RunComplete(state) => {
                tracing::info!(
                    "Run complete: {} accepted, {} saved, {} skipped, {} failed",
                    state.accepted,
                    state.saved,
                    state.skipped,
                    state.failed
                );
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ScrapeEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ScrapeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: ScrapeEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
