//! Content-addressed artifact files and their JSON sidecars

use crate::config::OutputConfig;
use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Stable 16-hex-character name derived from a URL
///
/// The name depends on the URL alone, so re-fetching a URL overwrites its
/// earlier artifacts instead of duplicating them.
///
/// # Example
///
/// ```
/// use corpus_harvest::storage::content_hash;
///
/// let a = content_hash("https://x.edu/a");
/// assert_eq!(a, content_hash("https://x.edu/a"));
/// assert_eq!(a.len(), 16);
/// ```
pub fn content_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut name = hex::encode(digest);
    name.truncate(16);
    name
}

/// Sidecar metadata written for every processed URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub status: Option<u16>,
    pub content_type: Option<String>,
    pub file_path: Option<String>,
    pub html_path: Option<String>,
    #[serde(default)]
    pub out_links: Vec<String>,
    pub domain: Option<String>,
    pub notes: Option<String>,
}

impl ArtifactMeta {
    /// Starts a record for `url` stamped with the current time
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            fetched_at: Utc::now(),
            status: None,
            content_type: None,
            file_path: None,
            html_path: None,
            out_links: Vec::new(),
            domain: None,
            notes: None,
        }
    }
}

/// Output directories for bodies and sidecars
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    html_dir: PathBuf,
    files_dir: PathBuf,
    meta_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(
        html_dir: impl Into<PathBuf>,
        files_dir: impl Into<PathBuf>,
        meta_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            html_dir: html_dir.into(),
            files_dir: files_dir.into(),
            meta_dir: meta_dir.into(),
        }
    }

    /// Builds the store from the output configuration and creates its directories
    pub fn create(output: &OutputConfig) -> StorageResult<Self> {
        let store = Self::new(&output.html_dir, &output.files_dir, &output.meta_dir);
        store.ensure_dirs()?;
        Ok(store)
    }

    pub fn ensure_dirs(&self) -> StorageResult<()> {
        for dir in [&self.html_dir, &self.files_dir, &self.meta_dir] {
            fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        }
        Ok(())
    }

    pub fn html_dir(&self) -> &Path {
        &self.html_dir
    }

    /// `<html_dir>/<hash>.html`
    pub fn html_path(&self, url: &str) -> PathBuf {
        self.html_dir.join(format!("{}.html", content_hash(url)))
    }

    /// `<files_dir>/<hash><ext>`
    pub fn file_path(&self, url: &str, ext: &str) -> PathBuf {
        self.files_dir.join(format!("{}{}", content_hash(url), ext))
    }

    /// Sidecar of a navigable page or of a direct file that yielded nothing:
    /// `<meta_dir>/<hash>.json`
    pub fn page_sidecar_path(&self, url: &str) -> PathBuf {
        self.meta_dir.join(format!("{}.json", content_hash(url)))
    }

    /// Sidecar of a saved file: `<meta_dir>/<hash><ext>.json`
    pub fn file_sidecar_path(&self, url: &str, ext: &str) -> PathBuf {
        self.meta_dir
            .join(format!("{}{}.json", content_hash(url), ext))
    }

    /// Writes a page's HTML text and returns its path
    pub fn save_html(&self, url: &str, html: &str) -> StorageResult<PathBuf> {
        let path = self.html_path(url);
        fs::write(&path, html).map_err(|e| StorageError::io(&path, e))?;
        Ok(path)
    }

    /// Writes a file body and returns its path
    pub fn save_file(&self, url: &str, ext: &str, body: &[u8]) -> StorageResult<PathBuf> {
        let path = self.file_path(url, ext);
        fs::write(&path, body).map_err(|e| StorageError::io(&path, e))?;
        Ok(path)
    }

    /// Writes a sidecar record to `path` as pretty-printed JSON
    pub fn write_sidecar(&self, path: &Path, meta: &ArtifactMeta) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(meta)?;
        fs::write(path, json).map_err(|e| StorageError::io(path, e))
    }

    /// Reads a sidecar record back
    pub fn read_sidecar(path: &Path) -> StorageResult<ArtifactMeta> {
        let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Lists every sidecar currently in the metadata directory
    pub fn sidecar_paths(&self) -> StorageResult<Vec<PathBuf>> {
        let entries =
            fs::read_dir(&self.meta_dir).map_err(|e| StorageError::io(&self.meta_dir, e))?;

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();
        Ok(paths)
    }
}
