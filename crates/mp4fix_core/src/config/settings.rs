//! Settings struct with TOML-based sections.
//!
//! Settings are organized into logical sections that map to TOML tables.
//! Every field has a default so a partial (or empty) config file is valid.

use serde::{Deserialize, Serialize};

use crate::logging::{LogConfig, LogLevel};

/// Root settings structure containing all configuration sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// External tool locations.
    #[serde(default)]
    pub tools: ToolSettings,

    /// Candidate discovery.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Remux invocation behaviour.
    #[serde(default)]
    pub remux: RemuxSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Config sections, one per TOML table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSection {
    Tools,
    Scan,
    Remux,
    Logging,
}

impl ConfigSection {
    /// All sections in file order.
    pub const ALL: [ConfigSection; 4] = [
        ConfigSection::Tools,
        ConfigSection::Scan,
        ConfigSection::Remux,
        ConfigSection::Logging,
    ];

    /// TOML table name for this section.
    pub fn table_name(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "tools",
            ConfigSection::Scan => "scan",
            ConfigSection::Remux => "remux",
            ConfigSection::Logging => "logging",
        }
    }

    /// One-line comment written above the table.
    pub fn comment(&self) -> &'static str {
        match self {
            ConfigSection::Tools => "External tools (names are looked up in PATH)",
            ConfigSection::Scan => "Which files are picked up as candidates",
            ConfigSection::Remux => "How each candidate is remuxed",
            ConfigSection::Logging => "Logging configuration",
        }
    }
}

/// Paths (or PATH names) of the external tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSettings {
    /// ffmpeg executable.
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// ffprobe executable.
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            ffprobe: default_ffprobe(),
        }
    }
}

/// Candidate discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanSettings {
    /// File extensions (without the dot) treated as candidates.
    /// Matching is ASCII case-insensitive.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Suffix appended to the file stem of every output file.
    /// Files whose stem already ends with it are never candidates.
    #[serde(default = "default_output_marker")]
    pub output_marker: String,

    /// Follow symbolic links while walking.
    #[serde(default)]
    pub follow_links: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_output_marker() -> String {
    ".remux".to_string()
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            output_marker: default_output_marker(),
            follow_links: false,
        }
    }
}

impl ScanSettings {
    /// Whether `ext` is one of the configured candidate extensions.
    pub fn matches_extension(&self, ext: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Remux invocation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemuxSettings {
    /// Probe streams with ffprobe and drop blocked codecs.
    #[serde(default = "default_true")]
    pub probe_streams: bool,

    /// Codec names excluded from the output.
    #[serde(default = "default_blocked_codecs")]
    pub blocked_codecs: Vec<String>,

    /// Value passed to ffmpeg `-v`.
    #[serde(default = "default_ffmpeg_loglevel")]
    pub ffmpeg_loglevel: String,

    /// Compute MD5 of source and output.
    #[serde(default)]
    pub checksum: bool,
}

fn default_true() -> bool {
    true
}

fn default_blocked_codecs() -> Vec<String> {
    vec!["eia_608".to_string()]
}

fn default_ffmpeg_loglevel() -> String {
    "warning".to_string()
}

impl Default for RemuxSettings {
    fn default() -> Self {
        Self {
            probe_streams: true,
            blocked_codecs: default_blocked_codecs(),
            ffmpeg_loglevel: default_ffmpeg_loglevel(),
            checksum: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default level when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: LogLevel,

    /// Use compact log format (filter progress, keep tool output in tail).
    #[serde(default = "default_true")]
    pub compact: bool,

    /// Progress update step percentage.
    #[serde(default = "default_progress_step")]
    pub progress_step: u32,

    /// Number of tool output lines kept for error diagnosis.
    #[serde(default = "default_error_tail")]
    pub error_tail: u32,

    /// Prefix run log lines with a timestamp.
    #[serde(default = "default_true")]
    pub show_timestamps: bool,

    /// Directory for per-run log files (disabled when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}

fn default_progress_step() -> u32 {
    20
}

fn default_error_tail() -> u32 {
    20
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            compact: true,
            progress_step: default_progress_step(),
            error_tail: default_error_tail(),
            show_timestamps: true,
            log_dir: None,
        }
    }
}

impl LoggingSettings {
    /// Build the run logger configuration from these settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: self.level,
            compact: self.compact,
            progress_step: self.progress_step.max(1),
            error_tail: self.error_tail as usize,
            show_timestamps: self.show_timestamps,
        }
    }
}
