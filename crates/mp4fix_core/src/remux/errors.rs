//! Per-file invocation errors.

use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Why a single candidate could not be remuxed.
///
/// None of these stop the run.
#[derive(Error, Debug)]
pub enum InvocationError {
    /// The executable could not be found.
    #[error("{tool} not found (is it installed and on PATH?)")]
    ToolNotFound { tool: String },

    /// The executable exists but could not be started.
    #[error("failed to start {tool}: {source}")]
    SpawnFailed {
        tool: String,
        #[source]
        source: io::Error,
    },

    /// The tool ran and reported failure.
    #[error("{tool} failed with exit code {exit_code}{}", format_tail(.stderr_tail))]
    NonZeroExit {
        tool: String,
        exit_code: i32,
        stderr_tail: Vec<String>,
    },

    /// The tool was killed before it could exit.
    #[error("{tool} was terminated by a signal")]
    Terminated { tool: String },

    /// The tool reported success but produced nothing.
    #[error("output file {} is missing or empty", .path.display())]
    EmptyOutput { path: PathBuf },

    /// Stream probing produced unusable output.
    #[error("stream probe failed: {message}")]
    ProbeFailed { message: String },

    /// Filesystem error while preparing or publishing the output.
    #[error("I/O error while {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

fn format_tail(tail: &[String]) -> String {
    match tail.last() {
        Some(line) => format!(": {}", line),
        None => String::new(),
    }
}

/// Serializable classification of an `InvocationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ToolNotFound,
    SpawnFailed,
    NonZeroExit,
    Terminated,
    EmptyOutput,
    ProbeFailed,
    Io,
}

impl InvocationError {
    /// Map a spawn error, separating "not found" from other failures.
    pub fn from_spawn(tool: impl Into<String>, source: io::Error) -> Self {
        let tool = tool.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::ToolNotFound { tool }
        } else {
            Self::SpawnFailed { tool, source }
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a probe failure.
    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
        }
    }

    /// Classification for reports.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::ToolNotFound { .. } => FailureKind::ToolNotFound,
            Self::SpawnFailed { .. } => FailureKind::SpawnFailed,
            Self::NonZeroExit { .. } => FailureKind::NonZeroExit,
            Self::Terminated { .. } => FailureKind::Terminated,
            Self::EmptyOutput { .. } => FailureKind::EmptyOutput,
            Self::ProbeFailed { .. } => FailureKind::ProbeFailed,
            Self::Io { .. } => FailureKind::Io,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinct_from_spawn_failure() {
        let err = InvocationError::from_spawn(
            "ffmpeg",
            io::Error::new(io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(err.kind(), FailureKind::ToolNotFound);

        let err = InvocationError::from_spawn(
            "ffmpeg",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.kind(), FailureKind::SpawnFailed);
        assert!(err.to_string().contains("failed to start ffmpeg"));
    }

    #[test]
    fn non_zero_exit_shows_last_stderr_line() {
        let err = InvocationError::NonZeroExit {
            tool: "ffmpeg".into(),
            exit_code: 1,
            stderr_tail: vec!["first".into(), "Invalid data found".into()],
        };
        assert_eq!(
            err.to_string(),
            "ffmpeg failed with exit code 1: Invalid data found"
        );

        let bare = InvocationError::NonZeroExit {
            tool: "ffmpeg".into(),
            exit_code: 69,
            stderr_tail: Vec::new(),
        };
        assert_eq!(bare.to_string(), "ffmpeg failed with exit code 69");
    }
}
