//! Configuration management for mp4fix.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use mp4fix_core::config::ConfigManager;
//!
//! let mut config = ConfigManager::new("mp4fix.toml");
//! config.load_or_default().unwrap();
//!
//! println!("Extensions: {:?}", config.settings().scan.extensions);
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, LoggingSettings, RemuxSettings, ScanSettings, Settings, ToolSettings,
};
