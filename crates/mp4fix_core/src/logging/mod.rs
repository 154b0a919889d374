//! Logging infrastructure for mp4fix.
//!
//! This module provides:
//! - Global `tracing` subscriber setup
//! - A per-run logger with optional file output
//! - Compact mode with progress filtering
//! - Tail buffer of external tool output for error diagnosis
//!
//! # Example
//!
//! ```no_run
//! use mp4fix_core::logging::{LogConfig, RunLoggerBuilder};
//!
//! let logger = RunLoggerBuilder::new("mp4fix_run")
//!     .log_dir(Some("/tmp/mp4fix-logs"))
//!     .config(LogConfig::default())
//!     .build()
//!     .unwrap();
//!
//! logger.phase("Discovery");
//! logger.command("ffmpeg -i input.mp4 ...");
//! logger.progress(50);
//! logger.success("Run completed");
//! ```

mod run_logger;
mod types;

pub use run_logger::{RunLogger, RunLoggerBuilder};
pub use types::{LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .try_init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
