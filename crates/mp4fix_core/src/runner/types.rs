//! Core types for a run: options, per-file outcomes and the summary.

use std::path::PathBuf;
use std::time::Duration;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::config::{ScanSettings, Settings};
use crate::discovery::Candidate;
use crate::remux::InvocationError;

/// Options for one run, resolved before the run starts.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory to scan.
    pub root: PathBuf,
    /// Mirror outputs under this directory instead of next to each source.
    pub output_root: Option<PathBuf>,
    /// Candidate discovery settings.
    pub scan: ScanSettings,
    /// Report what would happen without invoking any tool.
    pub dry_run: bool,
    /// Compute MD5 of each source and output.
    pub checksum: bool,
}

impl RunOptions {
    /// Options for `root` with default settings.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_settings(root, &Settings::default())
    }

    /// Options for `root` taken from loaded settings.
    pub fn from_settings(root: impl Into<PathBuf>, settings: &Settings) -> Self {
        Self {
            root: root.into(),
            output_root: None,
            scan: settings.scan.clone(),
            dry_run: false,
            checksum: settings.remux.checksum,
        }
    }

    /// Set the output root.
    pub fn with_output_root(mut self, output_root: Option<PathBuf>) -> Self {
        self.output_root = output_root;
        self
    }

    /// Enable or disable dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Why a candidate was not remuxed, without that being a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The output path already exists (from a previous run or otherwise).
    OutputExists,
    /// Dry run; nothing was invoked.
    DryRun,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::OutputExists => "output already exists",
            SkipReason::DryRun => "dry run",
        }
    }
}

/// Result of handling one candidate.
#[derive(Debug)]
pub enum FileOutcome {
    /// Output written; size in bytes.
    Remuxed { bytes: u64 },
    /// Nothing done, by policy.
    Skipped(SkipReason),
    /// The invocation failed; the run continued.
    Failed(InvocationError),
    /// The run was cancelled before this candidate.
    NotAttempted,
}

impl FileOutcome {
    /// Short status word for logs and reports.
    pub fn status(&self) -> &'static str {
        match self {
            FileOutcome::Remuxed { .. } => "remuxed",
            FileOutcome::Skipped(_) => "skipped",
            FileOutcome::Failed(_) => "failed",
            FileOutcome::NotAttempted => "not_attempted",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FileOutcome::Failed(_))
    }
}

impl Serialize for FileOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("FileOutcome", 3)?;
        state.serialize_field("status", self.status())?;
        match self {
            FileOutcome::Remuxed { bytes } => {
                state.serialize_field("bytes", bytes)?;
            }
            FileOutcome::Skipped(reason) => {
                state.serialize_field("reason", reason)?;
            }
            FileOutcome::Failed(err) => {
                state.serialize_field("kind", &err.kind())?;
                state.serialize_field("message", &err.to_string())?;
            }
            FileOutcome::NotAttempted => {}
        }
        state.end()
    }
}

/// What happened to one candidate.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// Source file.
    pub source: PathBuf,
    /// Source path relative to the scanned root.
    pub relative: PathBuf,
    /// Output path (planned or written).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    /// Outcome.
    pub outcome: FileOutcome,
    /// Time spent on this candidate in milliseconds.
    pub elapsed_ms: u64,
    /// MD5 of the source, when checksums are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_md5: Option<String>,
    /// MD5 of the output, when checksums are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_md5: Option<String>,
}

impl FileReport {
    /// Report for `candidate` with the given outcome.
    pub fn new(candidate: &Candidate, output: Option<PathBuf>, outcome: FileOutcome) -> Self {
        Self {
            source: candidate.path.clone(),
            relative: candidate.relative.clone(),
            output,
            outcome,
            elapsed_ms: 0,
            source_md5: None,
            output_md5: None,
        }
    }

    /// Source path relative to the root, for display.
    pub fn display_name(&self) -> String {
        self.relative.display().to_string()
    }

    /// Set elapsed time.
    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed_ms = elapsed.as_millis() as u64;
        self
    }
}

/// Everything a run did.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Scanned directory.
    pub root: PathBuf,
    /// RFC 3339 start time.
    pub started_at: String,
    /// RFC 3339 finish time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    /// First line of `ffmpeg -version`, if it could be queried.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_version: Option<String>,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Whether the run was cancelled.
    pub cancelled: bool,
    /// Number of candidates discovered.
    pub total: usize,
    /// One entry per candidate, in traversal order.
    pub files: Vec<FileReport>,
}

impl RunSummary {
    /// Start a summary for `total` candidates under `root`.
    pub fn new(root: impl Into<PathBuf>, total: usize, dry_run: bool) -> Self {
        Self {
            root: root.into(),
            started_at: chrono::Local::now().to_rfc3339(),
            finished_at: None,
            tool_version: None,
            dry_run,
            cancelled: false,
            total,
            files: Vec::with_capacity(total),
        }
    }

    /// Mark the summary finished.
    pub fn finish(&mut self) {
        self.finished_at = Some(chrono::Local::now().to_rfc3339());
    }

    fn count(&self, f: impl Fn(&FileOutcome) -> bool) -> usize {
        self.files.iter().filter(|r| f(&r.outcome)).count()
    }

    pub fn remuxed(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Remuxed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(FileOutcome::is_failure)
    }

    pub fn not_attempted(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::NotAttempted))
    }

    /// Candidates that were handled in some way.
    pub fn attempted(&self) -> usize {
        self.files.len() - self.not_attempted()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    /// Failed reports, in order.
    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|r| r.outcome.is_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn candidate(name: &str) -> Candidate {
        Candidate {
            path: PathBuf::from("/media").join(name),
            relative: PathBuf::from(name),
        }
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = RunSummary::new("/media", 4, false);
        summary.files.push(FileReport::new(
            &candidate("a.mp4"),
            None,
            FileOutcome::Remuxed { bytes: 10 },
        ));
        summary.files.push(FileReport::new(
            &candidate("b.mp4"),
            None,
            FileOutcome::Skipped(SkipReason::OutputExists),
        ));
        summary.files.push(FileReport::new(
            &candidate("c.mp4"),
            None,
            FileOutcome::Failed(InvocationError::ToolNotFound {
                tool: "ffmpeg".into(),
            }),
        ));
        summary
            .files
            .push(FileReport::new(&candidate("d.mp4"), None, FileOutcome::NotAttempted));

        assert_eq!(summary.remuxed(), 1);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.not_attempted(), 1);
        assert_eq!(summary.attempted(), 3);
        assert!(summary.has_failures());
        assert_eq!(summary.failures().count(), 1);
    }

    #[test]
    fn outcome_serializes_with_kind() {
        let failed = FileOutcome::Failed(InvocationError::io(
            "publishing output",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        ));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["kind"], "io");
        assert!(json["message"].as_str().unwrap().contains("disk full"));

        let skipped = serde_json::to_value(FileOutcome::Skipped(SkipReason::DryRun)).unwrap();
        assert_eq!(skipped["status"], "skipped");
        assert_eq!(skipped["reason"], "dry_run");
    }

    #[test]
    fn options_take_scan_settings() {
        let mut settings = Settings::default();
        settings.scan.extensions = vec!["m4v".into()];
        settings.remux.checksum = true;

        let options = RunOptions::from_settings("/media", &settings).with_dry_run(true);
        assert_eq!(options.scan.extensions, vec!["m4v"]);
        assert!(options.checksum);
        assert!(options.dry_run);
        assert!(options.output_root.is_none());
    }
}
