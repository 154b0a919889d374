//! Config manager for loading and atomically saving settings.
//!
//! Key features:
//! - Atomic writes (write to temp file, then rename)
//! - Validation on load (unknown sections are reported)
//! - Commented output when writing a fresh config

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use toml_edit::DocumentMut;

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Failed to parse config for validation: {0}")]
    EditParseError(#[from] toml_edit::TomlError),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Manages application configuration.
pub struct ConfigManager {
    /// Path to the config file.
    config_path: PathBuf,
    /// Current settings loaded in memory.
    settings: Settings,
    /// Top-level keys found on load that are not known sections.
    unknown_sections: Vec<String>,
}

impl ConfigManager {
    /// Create a new config manager with the given config file path.
    ///
    /// Does not load the config - call `load()` or `load_or_default()` after.
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
            unknown_sections: Vec::new(),
        }
    }

    /// Get the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Get a reference to the current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get a mutable reference to the current settings.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Consume the manager, returning the settings.
    pub fn into_settings(self) -> Settings {
        self.settings
    }

    /// Top-level keys in the loaded file that were ignored.
    pub fn unknown_sections(&self) -> &[String] {
        &self.unknown_sections
    }

    /// Load config from file.
    ///
    /// Returns error if file doesn't exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            return Err(ConfigError::NotFound(self.config_path.clone()));
        }

        let content = fs::read_to_string(&self.config_path)?;
        let (settings, unknown) = parse_and_validate(&content)?;
        self.settings = settings;
        self.unknown_sections = unknown;
        Ok(())
    }

    /// Load config from file, keeping defaults if it doesn't exist.
    ///
    /// Returns whether a file was loaded.
    pub fn load_or_default(&mut self) -> ConfigResult<bool> {
        if self.config_path.exists() {
            self.load()?;
            Ok(true)
        } else {
            tracing::debug!(
                "No config at {}, using defaults",
                self.config_path.display()
            );
            self.settings = Settings::default();
            Ok(false)
        }
    }

    /// Save the entire config atomically.
    ///
    /// Creates parent directories, writes to a temp file first, then renames.
    pub fn save(&self) -> ConfigResult<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = self.generate_config_with_comments()?;
        self.atomic_write(&content)?;
        Ok(())
    }

    /// Generate config content with a comment above each section.
    fn generate_config_with_comments(&self) -> ConfigResult<String> {
        let mut output = String::new();

        output.push_str("# mp4fix configuration\n");
        output.push_str("# Missing keys fall back to their defaults.\n\n");

        for section in ConfigSection::ALL {
            let body = match section {
                ConfigSection::Tools => toml::to_string_pretty(&self.settings.tools)?,
                ConfigSection::Scan => toml::to_string_pretty(&self.settings.scan)?,
                ConfigSection::Remux => toml::to_string_pretty(&self.settings.remux)?,
                ConfigSection::Logging => toml::to_string_pretty(&self.settings.logging)?,
            };
            output.push_str(&format!("# {}\n", section.comment()));
            output.push_str(&format!("[{}]\n", section.table_name()));
            for line in body.lines() {
                output.push_str(line);
                output.push('\n');
            }
            output.push('\n');
        }

        Ok(output)
    }

    /// Write content atomically (temp file + rename).
    fn atomic_write(&self, content: &str) -> ConfigResult<()> {
        let temp_path = self.config_path.with_extension("toml.tmp");

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, &self.config_path)?;
        Ok(())
    }
}

/// Parse config content, returning settings and any unknown top-level keys.
fn parse_and_validate(content: &str) -> ConfigResult<(Settings, Vec<String>)> {
    let doc: DocumentMut = content.parse()?;
    let settings: Settings = toml::from_str(content)?;

    let known: Vec<&str> = ConfigSection::ALL.iter().map(|s| s.table_name()).collect();
    let unknown = doc
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| !known.contains(&key.as_str()))
        .collect();

    Ok((settings, unknown))
}
