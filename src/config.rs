//! Logger configuration.
//!
//! ```toml
//! level = "debug"
//! log_to_file = true
//! development = false
//! name = "api"
//! stacktrace_level = "error"
//! log_dir = "/var/log/api"
//!
//! [rotation]
//! max_size_mb = 128
//! max_backups = 30
//! max_age_days = 7
//! compress = true
//! local_time = true
//! ```

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::log::{log_error::LogError, log_level::LogLevel, rotating_file::RotationPolicy};

/// Root configuration. Every key is optional.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogConfig {
    /// Level name; unknown names mean `info`.
    pub level: String,

    /// Also write to a rotating file.
    pub log_to_file: bool,

    /// Make `dpanic` calls panic after logging.
    pub development: bool,

    /// Root logger name.
    pub name: Option<String>,

    /// Attach backtraces to records at or above this level.
    pub stacktrace_level: Option<String>,

    /// Directory for the log file. Defaults to `<cwd>/logs`.
    pub log_dir: Option<PathBuf>,

    pub rotation: RotationConfig,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            development: false,
            name: None,
            stacktrace_level: None,
            log_dir: None,
            rotation: RotationConfig::default(),
        }
    }
}

/// Rotating file limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RotationConfig {
    /// Size of the active file that triggers rotation, in megabytes.
    pub max_size_mb: u64,

    /// Rotated files to keep; 0 keeps all.
    pub max_backups: usize,

    /// Days to keep rotated files; 0 keeps them forever.
    pub max_age_days: u64,

    /// Gzip rotated files.
    pub compress: bool,

    /// Use local time rather than UTC in backup names.
    pub local_time: bool,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 128,
            max_backups: 30,
            max_age_days: 7,
            compress: true,
            local_time: true,
        }
    }
}

impl RotationConfig {
    #[must_use]
    pub fn policy(&self) -> RotationPolicy {
        RotationPolicy {
            local_time: self.local_time,
            ..RotationPolicy::new(
                self.max_size_mb,
                self.max_backups,
                self.max_age_days,
                self.compress,
            )
        }
    }
}

impl LogConfig {
    /// Defaults with the two construction parameters filled in.
    pub fn new(level: impl Into<String>, log_to_file: bool) -> Self {
        Self {
            level: level.into(),
            log_to_file,
            ..Self::default()
        }
    }

    /// Load and validate configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - TOML file; missing keys take their defaults.
    ///
    /// # Errors
    /// [`LogError::Io`] if the file cannot be read, otherwise the errors of
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: &Path) -> Result<Self, LogError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    ///
    /// # Errors
    /// [`LogError::ConfigParse`] for malformed TOML or mistyped keys, and
    /// whatever [`validate`](Self::validate) rejects.
    pub fn from_toml_str(content: &str) -> Result<Self, LogError> {
        let config: LogConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// [`LogError::InvalidConfig`] when `rotation.max_size_mb` is zero.
    pub fn validate(&self) -> Result<(), LogError> {
        if self.rotation.max_size_mb == 0 {
            return Err(LogError::InvalidConfig(
                "rotation.max_size_mb must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolved threshold; unknown names give `Info`.
    #[must_use]
    pub fn level(&self) -> LogLevel {
        LogLevel::resolve(&self.level)
    }

    #[must_use]
    pub fn stacktrace_level(&self) -> Option<LogLevel> {
        self.stacktrace_level.as_deref().map(LogLevel::resolve)
    }
}
