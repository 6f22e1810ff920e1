//! Persistent set of already processed URLs
//!
//! The frontier is loaded once at startup, only ever grows, and is
//! checkpointed to a JSON array file every [`CHECKPOINT_INTERVAL`] accepted
//! URLs and at shutdown.

use crate::storage::PersistWarning;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

/// Number of accepted URLs between two checkpoints
pub const CHECKPOINT_INTERVAL: usize = 100;

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Newly recorded; `ordinal` counts URLs accepted during this run
    Accepted { ordinal: usize },
    /// Already present (this run or a previous one)
    AlreadySeen,
}

/// The set of processed URLs
#[derive(Debug)]
pub struct Frontier {
    path: PathBuf,
    seen: Mutex<HashSet<String>>,
    accepted: AtomicUsize,
}

impl Frontier {
    /// Creates an empty frontier that checkpoints to `path`
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self::with_urls(path, HashSet::new())
    }

    fn with_urls(path: impl Into<PathBuf>, urls: HashSet<String>) -> Self {
        Self {
            path: path.into(),
            seen: Mutex::new(urls),
            accepted: AtomicUsize::new(0),
        }
    }

    /// Loads the frontier from `path`
    ///
    /// A missing file yields an empty frontier silently. An unreadable or
    /// corrupt file also yields an empty frontier, together with a warning.
    pub fn load(path: impl Into<PathBuf>) -> (Self, Option<PersistWarning>) {
        let path = path.into();

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No frontier file at {}, starting empty", path.display());
                return (Self::empty(path), None);
            }
            Err(e) => {
                let warning = PersistWarning::FrontierLoad {
                    path: path.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", warning);
                return (Self::empty(path), Some(warning));
            }
        };

        match serde_json::from_str::<Vec<String>>(&content) {
            Ok(urls) => {
                tracing::info!("Loaded {} seen URLs from {}", urls.len(), path.display());
                (Self::with_urls(path, urls.into_iter().collect()), None)
            }
            Err(e) => {
                let warning = PersistWarning::FrontierLoad {
                    path: path.clone(),
                    reason: e.to_string(),
                };
                tracing::warn!("{}", warning);
                (Self::empty(path), Some(warning))
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, url: &str) -> bool {
        self.lock().contains(url)
    }

    /// Records `url` if it is not present yet
    ///
    /// Insert-if-absent is atomic, so two workers offering the same URL get
    /// exactly one `Accepted`.
    pub fn admit(&self, url: &str) -> Admission {
        let mut seen = self.lock();
        if seen.insert(url.to_string()) {
            let ordinal = self.accepted.fetch_add(1, Ordering::SeqCst) + 1;
            Admission::Accepted { ordinal }
        } else {
            Admission::AlreadySeen
        }
    }

    /// URLs accepted during this run
    pub fn accepted_this_run(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// True when the URL with this ordinal should trigger a checkpoint
    pub fn checkpoint_due(ordinal: usize) -> bool {
        ordinal > 0 && ordinal % CHECKPOINT_INTERVAL == 0
    }

    /// Writes the frontier to its file
    ///
    /// The array is sorted so identical sets produce identical files. The
    /// data goes to a temporary sibling first and is then renamed into place.
    /// Returns the number of URLs written.
    pub fn save(&self) -> Result<usize, PersistWarning> {
        let mut urls: Vec<String> = self.lock().iter().cloned().collect();
        urls.sort();

        let warn = |reason: String| PersistWarning::FrontierSave {
            path: self.path.clone(),
            reason,
        };

        let encoded = serde_json::to_string(&urls).map_err(|e| warn(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| warn(e.to_string()))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, encoded).map_err(|e| warn(e.to_string()))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| warn(e.to_string()))?;

        tracing::debug!("Saved {} seen URLs to {}", urls.len(), self.path.display());
        Ok(urls.len())
    }
}
