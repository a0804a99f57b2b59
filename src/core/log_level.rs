//! Log level definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug = 10,
    #[default]
    Info = 20,
    #[serde(alias = "WARN")]
    Warning = 30,
    Error = 40,
    #[serde(alias = "FATAL")]
    Critical = 50,
}

impl LogLevel {
    /// All levels in ascending severity.
    pub const ALL: [LogLevel; 5] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warning,
        LogLevel::Error,
        LogLevel::Critical,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::Critical => "CRITICAL",
        }
    }

    /// Numeric severity (10, 20, 30, 40, 50)
    pub fn severity(&self) -> u8 {
        *self as u8
    }

    /// Position of this level in [`LogLevel::ALL`], used to index per-level tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            LogLevel::Debug => 0,
            LogLevel::Info => 1,
            LogLevel::Warning => 2,
            LogLevel::Error => 3,
            LogLevel::Critical => 4,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // `pad` so width/alignment specs like `{:<8}` apply
        f.pad(self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "DEBUG" | "10" => Ok(LogLevel::Debug),
            "INFO" | "20" => Ok(LogLevel::Info),
            "WARNING" | "WARN" | "30" => Ok(LogLevel::Warning),
            "ERROR" | "40" => Ok(LogLevel::Error),
            "CRITICAL" | "FATAL" | "50" => Ok(LogLevel::Critical),
            _ => Err(format!("Invalid log level: '{}'", s)),
        }
    }
}

/// Per-sink minimum-severity gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelFilter {
    min_level: LogLevel,
}

impl LevelFilter {
    pub const fn new(min_level: LogLevel) -> Self {
        Self { min_level }
    }

    #[inline]
    pub fn permits(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        Self::new(level)
    }
}
