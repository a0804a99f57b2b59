//! Aggregator configuration
//!
//! Field names follow the conventional `level_log` / `format_console` style
//! so that a JSON document can configure an aggregator directly:
//!
//! ```
//! use log_aggregator::{AggregatorConfig, LogLevel};
//!
//! let config = AggregatorConfig::from_json_str(r#"{
//!     "file_path": "/var/log/app",
//!     "level_console": "DEBUG",
//!     "rotate_period": { "unit": "H", "interval": 6 }
//! }"#).unwrap();
//!
//! assert_eq!(config.level_console, LogLevel::Debug);
//! assert_eq!(config.level_log, LogLevel::Debug);
//! assert_eq!(config.base_log_name, "record");
//! ```

use super::error::{LoggerError, Result};
use super::log_level::LogLevel;
use super::template::{FormatTemplate, DEFAULT_FORMAT};
use super::timestamp::TimestampFormat;
use crate::sinks::{
    ColorMode, RotationPeriod, RotationPolicy, DEFAULT_BASE_NAME, DEFAULT_SUFFIX,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AggregatorConfig {
    /// Directory of the log file; `None` disables the file sink
    pub file_path: Option<PathBuf>,
    pub level_log: LogLevel,
    pub format_log: String,
    pub base_log_name: String,
    /// strftime suffix for rotated files
    pub suffix_log_name: String,
    pub rotate_period: RotationPeriod,
    /// Rotated files to keep; 0 keeps all
    pub backup_count: usize,
    pub compress_rotated: bool,
    pub level_console: LogLevel,
    pub format_console: String,
    pub console_colors: ColorMode,
    pub timestamp_format: TimestampFormat,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            file_path: None,
            level_log: LogLevel::Debug,
            format_log: DEFAULT_FORMAT.to_string(),
            base_log_name: DEFAULT_BASE_NAME.to_string(),
            suffix_log_name: DEFAULT_SUFFIX.to_string(),
            rotate_period: RotationPeriod::default(),
            backup_count: 0,
            compress_rotated: false,
            level_console: LogLevel::Info,
            format_console: DEFAULT_FORMAT.to_string(),
            console_colors: ColorMode::default(),
            timestamp_format: TimestampFormat::default(),
        }
    }
}

impl AggregatorConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading configuration",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&json)
    }

    /// Enable the file sink, writing into directory `path`.
    #[must_use]
    pub fn file_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn level_log(mut self, level: LogLevel) -> Self {
        self.level_log = level;
        self
    }

    #[must_use]
    pub fn format_log(mut self, format: impl Into<String>) -> Self {
        self.format_log = format.into();
        self
    }

    #[must_use]
    pub fn base_log_name(mut self, name: impl Into<String>) -> Self {
        self.base_log_name = name.into();
        self
    }

    #[must_use]
    pub fn suffix_log_name(mut self, suffix: impl Into<String>) -> Self {
        self.suffix_log_name = suffix.into();
        self
    }

    #[must_use]
    pub fn rotate_period(mut self, period: RotationPeriod) -> Self {
        self.rotate_period = period;
        self
    }

    #[must_use]
    pub fn backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use]
    pub fn compress_rotated(mut self, enabled: bool) -> Self {
        self.compress_rotated = enabled;
        self
    }

    #[must_use]
    pub fn level_console(mut self, level: LogLevel) -> Self {
        self.level_console = level;
        self
    }

    #[must_use]
    pub fn format_console(mut self, format: impl Into<String>) -> Self {
        self.format_console = format.into();
        self
    }

    #[must_use]
    pub fn console_colors(mut self, mode: ColorMode) -> Self {
        self.console_colors = mode;
        self
    }

    #[must_use]
    pub fn timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Full path of the active log file, if the file sink is enabled
    pub fn log_file(&self) -> Option<PathBuf> {
        self.file_path
            .as_ref()
            .map(|dir| dir.join(&self.base_log_name))
    }

    pub(crate) fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy::new()
            .with_period(self.rotate_period)
            .with_suffix(self.suffix_log_name.clone())
            .with_backup_count(self.backup_count)
            .with_compression(self.compress_rotated)
    }

    /// Check templates, the timestamp pattern, rotation settings and the
    /// base file name.
    pub fn validate(&self) -> Result<()> {
        FormatTemplate::parse(&self.format_console)?;
        self.timestamp_format.validate()?;
        if self.file_path.is_some() {
            FormatTemplate::parse(&self.format_log)?;
            self.rotation_policy().validate()?;
            if self.base_log_name.is_empty()
                || self.base_log_name.contains(['/', '\\'])
            {
                return Err(LoggerError::config(
                    "AggregatorConfig",
                    format!("invalid base_log_name '{}'", self.base_log_name),
                ));
            }
        }
        Ok(())
    }
}
