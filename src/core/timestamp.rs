//! Timestamp formatting utilities
//!
//! Controls how the `{timestamp}` placeholder of a format template is
//! rendered. The default mirrors the classic `asctime` layout in local time.

use super::error::{LoggerError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Timestamp format options
///
/// # Examples
///
/// ```
/// use log_aggregator::TimestampFormat;
/// use chrono::Utc;
///
/// let format = TimestampFormat::Iso8601;
/// let timestamp = format.format(&Utc::now());
/// assert!(timestamp.ends_with('Z'));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// Local time with milliseconds: `2025-01-08 10:30:45,123`
    #[default]
    Asctime,

    /// UTC ISO 8601 with milliseconds: `2025-01-08T10:30:45.123Z`
    Iso8601,

    /// RFC 3339 with the local offset: `2025-01-08T10:30:45.123+01:00`
    Rfc3339,

    /// Unix timestamp in milliseconds: `1736332245123`
    UnixMillis,

    /// Any strftime-compatible format, rendered in local time
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Asctime => datetime
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S,%3f")
                .to_string(),
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => datetime
                .with_timezone(&Local)
                .to_rfc3339_opts(chrono::SecondsFormat::Millis, false),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => {
                let mut out = String::with_capacity(32);
                match write!(out, "{}", datetime.with_timezone(&Local).format(format_str)) {
                    Ok(()) => out,
                    Err(_) => TimestampFormat::Asctime.format(datetime),
                }
            }
        }
    }

    /// Check that a custom pattern is valid strftime.
    ///
    /// An invalid pattern would otherwise fall back to the asctime layout
    /// on every record.
    pub fn validate(&self) -> Result<()> {
        if let TimestampFormat::Custom(format_str) = self {
            if StrftimeItems::new(format_str).any(|item| matches!(item, Item::Error)) {
                return Err(LoggerError::config(
                    "TimestampFormat",
                    format!("invalid strftime pattern '{}'", format_str),
                ));
            }
        }
        Ok(())
    }
}
