//! Command-line arguments and exit status mapping.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use mp4fix_core::config::Settings;
use mp4fix_core::runner::RunSummary;

/// Remux every MP4 under a directory with ffmpeg, without re-encoding.
///
/// Originals are never modified; each output is written next to its source
/// as `<name>.remux.mp4` (or under `--output-dir`). Existing outputs are
/// skipped, so the command is safe to run repeatedly.
#[derive(Debug, Parser)]
#[command(name = "mp4fix", version, about, long_about = None)]
pub struct Cli {
    /// Directory to process (defaults to the current directory).
    #[arg(value_name = "TARGET_DIRECTORY")]
    pub target: Option<PathBuf>,

    /// Config file to load.
    #[arg(short, long, value_name = "PATH", env = "MP4FIX_CONFIG")]
    pub config: Option<PathBuf>,

    /// File extension to treat as a candidate (repeatable).
    #[arg(short = 'e', long = "extension", value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Write outputs under this directory, mirroring the source tree.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// ffmpeg executable.
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<String>,

    /// ffprobe executable.
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<String>,

    /// Do not probe streams; map everything.
    #[arg(long)]
    pub no_probe: bool,

    /// Record MD5 of each source and output.
    #[arg(long)]
    pub checksum: bool,

    /// List what would be remuxed without running ffmpeg.
    #[arg(long)]
    pub dry_run: bool,

    /// Write a JSON run report to this path.
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// Write a per-run log file into this directory.
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Exit with status 2 if any file failed.
    #[arg(long)]
    pub strict: bool,

    /// More output (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Write the default config to the config path and exit.
    #[arg(long)]
    pub write_default_config: bool,

    /// Replace an existing file with --write-default-config.
    #[arg(long, requires = "write_default_config")]
    pub force: bool,
}

impl Cli {
    /// Apply command-line overrides on top of loaded settings.
    pub fn apply(&self, settings: &mut Settings) {
        if !self.extensions.is_empty() {
            settings.scan.extensions = self.extensions.clone();
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            settings.tools.ffmpeg = ffmpeg.clone();
        }
        if let Some(ffprobe) = &self.ffprobe {
            settings.tools.ffprobe = ffprobe.clone();
        }
        if self.no_probe {
            settings.remux.probe_streams = false;
        }
        if self.checksum {
            settings.remux.checksum = true;
        }
        if let Some(dir) = &self.log_dir {
            settings.logging.log_dir = Some(dir.to_string_lossy().into_owned());
        }
    }
}

/// Process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Every candidate was handled.
    Success,
    /// The run could not start or its report could not be written.
    Fatal,
    /// At least one file failed and `--strict` was given.
    Failures,
    /// Interrupted before all candidates were handled.
    Cancelled,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Exit::Success => 0,
            Exit::Fatal => 1,
            Exit::Failures => 2,
            Exit::Cancelled => 130,
        }
    }

    /// Exit status for a finished run.
    pub fn for_summary(summary: &RunSummary, strict: bool) -> Self {
        if summary.cancelled {
            Exit::Cancelled
        } else if strict && summary.has_failures() {
            Exit::Failures
        } else {
            Exit::Success
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit.code())
    }
}
