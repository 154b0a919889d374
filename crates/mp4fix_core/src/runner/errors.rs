//! Error types for a run.
//!
//! Only errors that stop the whole run live here. Per-file failures are
//! `InvocationError`s and are recorded in the run summary instead.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fatal run error.
#[derive(Error, Debug)]
pub enum RunError {
    /// Target directory missing, not a directory, or unreadable.
    #[error("Invalid target directory {path}: {reason}")]
    Path { path: PathBuf, reason: String },

    /// Filesystem error outside of a single candidate.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },

    /// The run report could not be written.
    #[error("Failed to write report {path}: {message}")]
    Report { path: PathBuf, message: String },
}

impl RunError {
    /// Create a path error.
    pub fn path(path: impl AsRef<Path>, reason: impl Into<String>) -> Self {
        Self::Path {
            path: path.as_ref().to_path_buf(),
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a report error.
    pub fn report(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Report {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result type for run operations.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_error_names_directory() {
        let err = RunError::path("/srv/media", "directory does not exist");
        let msg = err.to_string();
        assert!(msg.contains("/srv/media"));
        assert!(msg.contains("does not exist"));
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;
        let err = RunError::io(
            "creating output directory",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("creating output directory"));
        assert!(err.source().is_some());
    }
}
