//! The traversal-and-dispatch loop.
//!
//! Discovery runs to completion first, then every candidate is handled in
//! traversal order, one external invocation at a time. Per-file failures
//! are recorded and the loop moves on; only discovery errors stop a run.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::checksum::md5_file;
use crate::discovery::{discover_candidates, Candidate};
use crate::logging::RunLogger;
use crate::remux::{InvocationError, RemuxTool};

use super::errors::RunResult;
use super::output::{discard, output_path, partial_path, path_exists, publish, Publish};
use super::progress::{CancelHandle, Progress};
use super::types::{FileOutcome, FileReport, RunOptions, RunSummary, SkipReason};

/// Progress callback type.
///
/// Called once per handled candidate, after the counter has advanced.
pub type ProgressCallback = Box<dyn Fn(Progress, &FileReport) + Send + Sync>;

/// Runs a remux tool over every candidate under a root.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use mp4fix_core::logging::{LogConfig, RunLogger};
/// use mp4fix_core::remux::Ffmpeg;
/// use mp4fix_core::runner::{RunOptions, Runner};
///
/// let logger = Arc::new(RunLogger::tracing_only(LogConfig::default()));
/// let runner = Runner::new(Ffmpeg::new(), logger);
/// let summary = runner.run(&RunOptions::new("/srv/media")).unwrap();
/// println!("{} remuxed, {} failed", summary.remuxed(), summary.failed());
/// ```
pub struct Runner {
    tool: Box<dyn RemuxTool>,
    logger: Arc<RunLogger>,
    cancel: CancelHandle,
    progress_callback: Option<ProgressCallback>,
}

impl Runner {
    /// Create a runner around `tool`.
    pub fn new<T: RemuxTool + 'static>(tool: T, logger: Arc<RunLogger>) -> Self {
        Self {
            tool: Box::new(tool),
            logger,
            cancel: CancelHandle::new(),
            progress_callback: None,
        }
    }

    /// Use an existing cancellation handle.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    /// Set the progress callback.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Get a cancellation handle.
    ///
    /// Calling `cancel()` stops the run before the next candidate.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Run over every candidate under `options.root`.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned (bad root, unreadable tree). Failures
    /// of individual files are in the returned summary.
    pub fn run(&self, options: &RunOptions) -> RunResult<RunSummary> {
        self.logger.phase("Discovery");
        self.logger.info(&format!("Scanning {}", options.root.display()));

        let candidates = discover_candidates(&options.root, &options.scan).map_err(|e| {
            self.logger.error(&e.to_string());
            e
        })?;

        let total = candidates.len();
        self.logger.info(&format!(
            "Found {} candidate file(s) with extension(s) {}",
            total,
            options.scan.extensions.join(", ")
        ));

        let mut summary = RunSummary::new(&options.root, total, options.dry_run);
        if total > 0 && !options.dry_run {
            summary.tool_version = self.query_version();
        }

        let mut progress = Progress::new(total);
        if total > 0 {
            self.logger.phase(if options.dry_run { "Dry run" } else { "Remux" });
        }

        for (i, candidate) in candidates.iter().enumerate() {
            if self.cancel.is_cancelled() {
                let remaining = total - i;
                self.logger.warn(&format!(
                    "Cancelled; {} candidate(s) not attempted",
                    remaining
                ));
                for rest in &candidates[i..] {
                    summary
                        .files
                        .push(FileReport::new(rest, None, FileOutcome::NotAttempted));
                }
                summary.cancelled = true;
                break;
            }

            let report = self.process(candidate, options);
            progress.advance();
            self.report_progress(progress, &report);
            summary.files.push(report);
        }

        // Interrupts that land during discovery or the last invocation
        if self.cancel.is_cancelled() {
            summary.cancelled = true;
        }
        if !progress.is_complete() {
            self.logger.warn(&format!("Stopped after {}", progress));
        }

        summary.finish();
        self.log_summary(&summary);
        self.logger.flush();
        Ok(summary)
    }

    /// Query and log the tool version; absence is not fatal.
    fn query_version(&self) -> Option<String> {
        match self.tool.version() {
            Ok(version) => {
                self.logger
                    .info(&format!("Using {}: {}", self.tool.name(), version));
                Some(version)
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "Could not query {} version: {}",
                    self.tool.name(),
                    e
                ));
                None
            }
        }
    }

    /// Handle one candidate. Never fails; problems end up in the report.
    fn process(&self, candidate: &Candidate, options: &RunOptions) -> FileReport {
        let started = Instant::now();

        let Some(output) = output_path(
            candidate,
            &options.scan.output_marker,
            options.output_root.as_deref(),
        ) else {
            let err = InvocationError::io(
                "deriving output path",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "output path would equal the source",
                ),
            );
            return FileReport::new(candidate, None, FileOutcome::Failed(err))
                .with_elapsed(started.elapsed());
        };

        if path_exists(&output) {
            return FileReport::new(
                candidate,
                Some(output),
                FileOutcome::Skipped(SkipReason::OutputExists),
            )
            .with_elapsed(started.elapsed());
        }

        if options.dry_run {
            return FileReport::new(
                candidate,
                Some(output),
                FileOutcome::Skipped(SkipReason::DryRun),
            )
            .with_elapsed(started.elapsed());
        }

        let mut report =
            FileReport::new(candidate, Some(output.clone()), FileOutcome::NotAttempted);

        if options.checksum {
            match md5_file(&candidate.path) {
                Ok(sum) => report.source_md5 = Some(sum),
                Err(e) => {
                    report.outcome =
                        FileOutcome::Failed(InvocationError::io("hashing source", e));
                    return report.with_elapsed(started.elapsed());
                }
            }
        }

        report.outcome = match self.remux_into(candidate, &output) {
            Ok(outcome) => outcome,
            Err(e) => FileOutcome::Failed(e),
        };

        if options.checksum && matches!(report.outcome, FileOutcome::Remuxed { .. }) {
            match md5_file(&output) {
                Ok(sum) => report.output_md5 = Some(sum),
                Err(e) => self
                    .logger
                    .warn(&format!("Could not hash {}: {}", output.display(), e)),
            }
        }

        report.with_elapsed(started.elapsed())
    }

    /// Remux into a partial file and publish it as `output`.
    fn remux_into(
        &self,
        candidate: &Candidate,
        output: &Path,
    ) -> Result<FileOutcome, InvocationError> {
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| InvocationError::io("creating output directory", e))?;
        }

        let partial = partial_path(output);
        discard(&partial);

        if let Err(e) = self.tool.remux(&candidate.path, &partial, &self.logger) {
            discard(&partial);
            return Err(e);
        }

        let bytes = match fs::metadata(&partial) {
            Ok(meta) if meta.len() > 0 => meta.len(),
            _ => {
                discard(&partial);
                return Err(InvocationError::EmptyOutput {
                    path: output.to_path_buf(),
                });
            }
        };

        match publish(&partial, output) {
            Ok(Publish::Published) => Ok(FileOutcome::Remuxed { bytes }),
            Ok(Publish::Collision) => Ok(FileOutcome::Skipped(SkipReason::OutputExists)),
            Err(e) => {
                discard(&partial);
                Err(InvocationError::io("publishing output", e))
            }
        }
    }

    /// Emit "N of M" for a handled candidate.
    fn report_progress(&self, progress: Progress, report: &FileReport) {
        let line = format!("[{}] {}", progress, report.display_name());
        match &report.outcome {
            FileOutcome::Remuxed { .. } => self.logger.success(&line),
            FileOutcome::Skipped(reason) => {
                self.logger.skipped(&format!("{}: {}", line, reason.as_str()))
            }
            FileOutcome::Failed(err) => self.logger.error(&format!("{}: {}", line, err)),
            FileOutcome::NotAttempted => {}
        }
        self.logger.progress(progress.percent());

        if let Some(ref callback) = self.progress_callback {
            callback(progress, report);
        }
    }

    fn log_summary(&self, summary: &RunSummary) {
        self.logger.phase("Summary");
        self.logger.info(&format!(
            "{} candidate(s): {} remuxed, {} skipped, {} failed, {} not attempted",
            summary.total,
            summary.remuxed(),
            summary.skipped(),
            summary.failed(),
            summary.not_attempted()
        ));
        for failure in summary.failures() {
            if let FileOutcome::Failed(ref err) = failure.outcome {
                self.logger
                    .warn(&format!("{}: {}", failure.relative.display(), err));
            }
        }
        if summary.remuxed() > 0 {
            self.logger
                .info("Originals were left in place; check the outputs before removing them");
        }
    }
}
