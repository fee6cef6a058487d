//! Configuration for participants and the recovery scanner.
//!
//! Values come from defaults, then an optional TOML file, then the
//! `XASIM_RECORD_DIR` environment variable, then explicit setters.
//!
//! ```toml
//! record_dir = "target/DummyXAResource/"
//! crash_exit_code = 1
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default directory holding branch record files
pub const DEFAULT_RECORD_DIR: &str = "target/DummyXAResource/";

/// Default exit code used when a participant simulates a crash
pub const DEFAULT_CRASH_EXIT_CODE: i32 = 1;

/// Environment variable overriding the record directory
pub const RECORD_DIR_ENV: &str = "XASIM_RECORD_DIR";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: toml::de::Error,
    },
}

/// Settings shared by participants and the recovery scanner.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use xasim_core::XaSimConfig;
///
/// let config = XaSimConfig::new().record_dir("/tmp/branches");
/// assert_eq!(config.record_dir.to_str(), Some("/tmp/branches"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct XaSimConfig {
    /// Directory holding branch record files
    pub record_dir: PathBuf,
    /// Exit code passed to the halt hook on a simulated crash
    pub crash_exit_code: i32,
}

impl XaSimConfig {
    /// Create a config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a TOML file; missing keys take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse from a TOML string
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply the `XASIM_RECORD_DIR` environment override, if set
    pub fn with_env_overrides(self) -> Self {
        match std::env::var_os(RECORD_DIR_ENV) {
            Some(dir) if !dir.is_empty() => self.record_dir(dir),
            _ => self,
        }
    }

    /// Set the record directory
    pub fn record_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.record_dir = dir.into();
        self
    }

    /// Set the simulated crash exit code
    pub fn crash_exit_code(mut self, code: i32) -> Self {
        self.crash_exit_code = code;
        self
    }
}

impl Default for XaSimConfig {
    fn default() -> Self {
        Self {
            record_dir: PathBuf::from(DEFAULT_RECORD_DIR),
            crash_exit_code: DEFAULT_CRASH_EXIT_CODE,
        }
    }
}
