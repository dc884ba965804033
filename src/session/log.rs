//! The session transcript log.
//!
//! [`TranscriptLog`] owns the output file path.  The file is created
//! lazily on the first append, holds one transcript per line (UTF-8), and
//! is deleted when the session ends.  A missing file is never an error —
//! neither on append (it gets created) nor on delete (reported as a no-op).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// LogError
// ---------------------------------------------------------------------------

/// Filesystem failures on the transcript log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to append to {path}: {source}")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// TranscriptLog
// ---------------------------------------------------------------------------

/// Append-only, ordered transcript file.
///
/// # Example
///
/// ```rust
/// use mic_scribe::session::TranscriptLog;
///
/// let dir = tempfile::tempdir().unwrap();
/// let log = TranscriptLog::new(dir.path().join("output.txt"));
///
/// log.append("hello world").unwrap();
/// assert!(log.exists());
///
/// assert!(log.delete().unwrap());   // removed
/// assert!(!log.delete().unwrap());  // already gone — no-op
/// ```
#[derive(Debug, Clone)]
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    /// Create a log handle for `path`.  Nothing touches the filesystem
    /// until the first [`append`](TranscriptLog::append).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `true` when the log file currently exists on disk.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Append `line` followed by a newline, creating the file on first use.
    ///
    /// Callers are responsible for never passing empty or whitespace-only
    /// text; the session loop filters those before they reach the log.
    pub fn append(&self, line: &str) -> Result<(), LogError> {
        debug_assert!(!line.trim().is_empty(), "empty lines never reach the log");

        let map_err = |source| LogError::Append {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(map_err)?;

        writeln!(file, "{line}").map_err(map_err)?;
        file.flush().map_err(map_err)
    }

    /// Delete the log file.
    ///
    /// Returns `Ok(true)` when a file was removed and `Ok(false)` when none
    /// existed — deleting an absent log is a no-op, not an error.
    pub fn delete(&self) -> Result<bool, LogError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(LogError::Delete {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
