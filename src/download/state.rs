//! Run state and per-image outcomes.

use std::fmt;
use std::path::PathBuf;

/// Lifecycle of a scrape run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Idle,
    Paginating,
    Draining,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => write!(f, "idle"),
            RunPhase::Paginating => write!(f, "paginating"),
            RunPhase::Draining => write!(f, "draining"),
            RunPhase::Done => write!(f, "done"),
        }
    }
}

/// Why an accepted image was not downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A file for this post id exists in the output directory.
    AlreadyPresent,
    /// Another worker is downloading the same post id.
    InFlight,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::AlreadyPresent => write!(f, "already downloaded"),
            SkipReason::InFlight => write!(f, "already being downloaded"),
        }
    }
}

/// Classification of a failed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The image host answered with a non-2xx status.
    HttpStatus(u16),
    /// The body was not an image (`Content-Type` outside `image/*`).
    NotAnImage(String),
    /// Connection, timeout or body stream error.
    Network(String),
    /// Writing or renaming the file failed.
    Write(String),
    /// No safe filename could be built.
    InvalidName(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpStatus(code) => write!(f, "HTTP {}", code),
            FailureKind::NotAnImage(content_type) => {
                write!(f, "not an image (content-type '{}')", content_type)
            }
            FailureKind::Network(msg) => write!(f, "network error: {}", msg),
            FailureKind::Write(msg) => write!(f, "write error: {}", msg),
            FailureKind::InvalidName(msg) => write!(f, "invalid filename: {}", msg),
        }
    }
}

/// Terminal outcome of one dispatched image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved { path: PathBuf, bytes: u64 },
    Skipped(SkipReason),
    Failed(FailureKind),
}

/// Reported exactly once per accepted image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub post_id: String,
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    pub fn saved(post_id: impl Into<String>, path: PathBuf, bytes: u64) -> Self {
        Self {
            post_id: post_id.into(),
            outcome: DownloadOutcome::Saved { path, bytes },
        }
    }

    pub fn skipped(post_id: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            post_id: post_id.into(),
            outcome: DownloadOutcome::Skipped(reason),
        }
    }

    pub fn failed(post_id: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            post_id: post_id.into(),
            outcome: DownloadOutcome::Failed(kind),
        }
    }
}

/// Counters for one scrape run.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub phase: RunPhase,
    pub pages_fetched: u32,
    pub posts_seen: u64,
    pub rejected: u64,
    pub accepted: u64,
    pub saved: u64,
    pub skipped: u64,
    pub failed: u64,
    pub bytes_saved: u64,
    /// Cursor of the most recently fetched page.
    pub cursor: Option<String>,
    /// Cooldown waits caused by throttling.
    pub rate_limit_retries: u32,
    /// Set when pagination ended on an unrecoverable transport error.
    pub aborted: Option<String>,
    /// Set when the run was stopped between pages.
    pub cancelled: bool,
}

impl RunState {
    /// Fold one download result into the counters.
    pub fn record_result(&mut self, result: &DownloadResult) {
        match &result.outcome {
            DownloadOutcome::Saved { bytes, .. } => {
                self.saved += 1;
                self.bytes_saved += bytes;
            }
            DownloadOutcome::Skipped(_) => self.skipped += 1,
            DownloadOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Number of accepted images that have reached a terminal outcome.
    pub fn completed(&self) -> u64 {
        self.saved + self.skipped + self.failed
    }

    /// `saved + skipped + failed == accepted`.
    pub fn is_balanced(&self) -> bool {
        self.completed() == self.accepted
    }
}
