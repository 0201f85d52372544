//! Post id index of images already on disk.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::Result;
use crate::fs::post_id_from_filename;

#[derive(Debug, Default)]
struct Ids {
    /// Ids with a complete file on disk.
    saved: HashSet<String>,
    /// Ids a worker is currently downloading.
    claimed: HashSet<String>,
}

/// Set of post ids that already have a saved file.
///
/// Shared between download workers. The lock is held only for a single
/// lookup or update, never across I/O.
#[derive(Debug, Default)]
pub struct DedupIndex {
    ids: Mutex<Ids>,
}

impl DedupIndex {
    /// An index with no known ids.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from the files in `dir`.
    ///
    /// A missing directory yields an empty index. Hidden files and partial
    /// downloads are ignored.
    pub fn scan(dir: &Path) -> Result<Self> {
        let mut saved = HashSet::new();

        if !dir.exists() {
            return Ok(Self::from_saved(saved));
        }

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };

            if let Some(id) = post_id_from_filename(name) {
                saved.insert(id.to_string());
            }
        }

        tracing::debug!("Indexed {} existing files in {}", saved.len(), dir.display());
        Ok(Self::from_saved(saved))
    }

    fn from_saved(saved: HashSet<String>) -> Self {
        Self {
            ids: Mutex::new(Ids {
                saved,
                claimed: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Ids> {
        // A panicking holder cannot leave the sets half-updated.
        self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether a file for `post_id` has been saved.
    pub fn contains(&self, post_id: &str) -> bool {
        self.lock().saved.contains(post_id)
    }

    /// Reserve `post_id` for download.
    ///
    /// Returns `false` when the id is already saved or claimed by another
    /// worker. A successful claim must end in [`record`](Self::record) or
    /// [`release`](Self::release).
    pub fn try_claim(&self, post_id: &str) -> bool {
        let mut ids = self.lock();
        if ids.saved.contains(post_id) || ids.claimed.contains(post_id) {
            return false;
        }
        ids.claimed.insert(post_id.to_string())
    }

    /// Drop a claim after a failed download so the id can be tried again.
    pub fn release(&self, post_id: &str) {
        self.lock().claimed.remove(post_id);
    }

    /// Register a post id after its file has been saved.
    pub fn record(&self, post_id: &str) {
        let mut ids = self.lock();
        ids.claimed.remove(post_id);
        ids.saved.insert(post_id.to_string());
    }

    /// Number of saved ids.
    pub fn len(&self) -> usize {
        self.lock().saved.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().saved.is_empty()
    }
}
