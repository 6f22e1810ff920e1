//! Append-only attempt log
//!
//! One line per terminal event: `[<timestamp>] <event-context> -> <detail>`.

use crate::storage::{PersistWarning, StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Open handle on the attempt log; the file is closed when this is dropped
#[derive(Debug)]
pub struct AttemptLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl AttemptLog {
    /// Opens (or creates) the log in append mode, creating parent directories
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StorageError::io(&path, e))?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Formats one log line (without the trailing newline)
    pub fn format_line(at: DateTime<Utc>, context: &str, detail: &str) -> String {
        format!(
            "[{}] {} -> {}",
            at.to_rfc3339_opts(SecondsFormat::Millis, true),
            context,
            detail
        )
    }

    /// Appends one event line stamped with the current time
    pub fn record(&self, context: &str, detail: &str) -> Result<(), PersistWarning> {
        let line = Self::format_line(Utc::now(), context, detail);
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        writeln!(file, "{}", line).map_err(|e| PersistWarning::AttemptLog {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }
}
