//! Engine configuration.
//!
//! # Responsibility
//! - Carry the tunables an engine instance is built with.
//! - Parse host-provided JSON with defaults for every missing field.
//!
//! # Invariants
//! - A config that passed `validate()` never makes engine construction or
//!   logging init fail on shape alone.

use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::logging::{default_log_level, LogLevel};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Logging section of [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of trace|debug|info|warn|error.
    pub level: String,
    /// Absolute directory for rolling log files. `None` disables file logs.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Tunables for one [`crate::Engine`] instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Entries kept on each of the undo and redo stacks.
    pub history_capacity: usize,
    pub logging: LoggingConfig,
    /// Shortcut override file loaded by the operation registry.
    pub keymap_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            logging: LoggingConfig::default(),
            keymap_path: None,
        }
    }
}

/// Config parse and validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    ZeroHistoryCapacity,
    UnsupportedLevel(String),
    RelativePath { field: &'static str, path: PathBuf },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid engine config json: {message}"),
            Self::ZeroHistoryCapacity => write!(f, "history_capacity must be at least 1"),
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativePath { field, path } => write!(
                f,
                "{field} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

impl EngineConfig {
    /// Parses and validates a config from JSON text.
    pub fn from_json_str(value: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(value).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks ranges and path shapes.
    ///
    /// # Errors
    /// - `ZeroHistoryCapacity` when `history_capacity == 0`.
    /// - `UnsupportedLevel` for an unknown log level.
    /// - `RelativePath` when `log_dir` or `keymap_path` is relative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        if LogLevel::parse(&self.logging.level).is_err() {
            return Err(ConfigError::UnsupportedLevel(self.logging.level.clone()));
        }
        if let Some(path) = &self.logging.log_dir {
            if !path.is_absolute() {
                return Err(ConfigError::RelativePath {
                    field: "logging.log_dir",
                    path: path.clone(),
                });
            }
        }
        if let Some(path) = &self.keymap_path {
            if !path.is_absolute() {
                return Err(ConfigError::RelativePath {
                    field: "keymap_path",
                    path: path.clone(),
                });
            }
        }
        Ok(())
    }
}
