//! Storage module for persisting harvest results
//!
//! This module handles everything written to disk during a run:
//! - The frontier file (URLs already processed, for resumption)
//! - Content-addressed page and file bodies
//! - JSON sidecar metadata for every processed URL
//! - The append-only attempt log
//!
//! Write failures never abort a run. Operations that the pipeline treats as
//! best-effort report problems as [`PersistWarning`] values instead.

mod artifacts;
mod attempt_log;
mod frontier;

pub use artifacts::{content_hash, ArtifactMeta, ArtifactStore};
pub use attempt_log::AttemptLog;
pub use frontier::{Admission, Frontier, CHECKPOINT_INTERVAL};

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A best-effort persistence step that did not succeed
///
/// These are collected into the run summary so callers (and tests) can see
/// that persistence degraded without the run failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistWarning {
    /// The frontier file existed but could not be read or parsed
    FrontierLoad { path: PathBuf, reason: String },

    /// A frontier checkpoint could not be written
    FrontierSave { path: PathBuf, reason: String },

    /// A page body, file body, or sidecar could not be written
    Artifact { url: String, reason: String },

    /// A line could not be appended to the attempt log
    AttemptLog { path: PathBuf, reason: String },
}

impl fmt::Display for PersistWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrontierLoad { path, reason } => {
                write!(f, "frontier load from {} failed: {}", path.display(), reason)
            }
            Self::FrontierSave { path, reason } => {
                write!(f, "frontier save to {} failed: {}", path.display(), reason)
            }
            Self::Artifact { url, reason } => {
                write!(f, "artifact for {} not persisted: {}", url, reason)
            }
            Self::AttemptLog { path, reason } => {
                write!(f, "attempt log {} not written: {}", path.display(), reason)
            }
        }
    }
}
