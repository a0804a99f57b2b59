//! Time-rotated file sink
//!
//! Appends formatted records to `<dir>/<base name>` and, once the rotation
//! period has elapsed, renames the file to `<base name>.<suffix>` (the suffix
//! being the strftime-formatted start of the period it covers) before
//! continuing in a fresh file.

use crate::core::error::{LoggerError, Result};
use crate::core::log_level::{LevelFilter, LogLevel};
use crate::core::record::LogRecord;
use crate::core::sink::Sink;
use crate::core::template::FormatTemplate;
use crate::core::timestamp::TimestampFormat;
use chrono::format::{Item, StrftimeItems};
use chrono::{
    DateTime, Datelike, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default base file name inside the log directory
pub const DEFAULT_BASE_NAME: &str = "record";

/// Default strftime suffix for rotated files
pub const DEFAULT_SUFFIX: &str = "%Y-%m-%d";

/// Unit of a rotation period
///
/// Parsed from the conventional short names: `S`, `M`, `H`, `D`,
/// `midnight`, and `W0`..`W6` (Monday = 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RotationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    /// At local midnight
    Midnight,
    /// At local midnight starting the given weekday (0 = Monday)
    Weekday(u8),
}

impl RotationUnit {
    fn fixed_length(&self) -> Option<Duration> {
        match self {
            RotationUnit::Seconds => Some(Duration::seconds(1)),
            RotationUnit::Minutes => Some(Duration::minutes(1)),
            RotationUnit::Hours => Some(Duration::hours(1)),
            RotationUnit::Days => Some(Duration::days(1)),
            RotationUnit::Midnight | RotationUnit::Weekday(_) => None,
        }
    }
}

impl fmt::Display for RotationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationUnit::Seconds => f.write_str("S"),
            RotationUnit::Minutes => f.write_str("M"),
            RotationUnit::Hours => f.write_str("H"),
            RotationUnit::Days => f.write_str("D"),
            RotationUnit::Midnight => f.write_str("midnight"),
            RotationUnit::Weekday(day) => write!(f, "W{}", day),
        }
    }
}

impl FromStr for RotationUnit {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "S" => Ok(RotationUnit::Seconds),
            "M" => Ok(RotationUnit::Minutes),
            "H" => Ok(RotationUnit::Hours),
            "D" => Ok(RotationUnit::Days),
            "MIDNIGHT" => Ok(RotationUnit::Midnight),
            _ => match upper.strip_prefix('W').map(str::parse::<u8>) {
                Some(Ok(day)) if day <= 6 => Ok(RotationUnit::Weekday(day)),
                _ => Err(LoggerError::config(
                    "RotationUnit",
                    format!("unknown rotation unit '{}' (expected S, M, H, D, midnight or W0-W6)", s),
                )),
            },
        }
    }
}

impl TryFrom<String> for RotationUnit {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RotationUnit> for String {
    fn from(unit: RotationUnit) -> Self {
        unit.to_string()
    }
}

/// When to rotate: every `interval` units
///
/// # Examples
///
/// ```
/// use log_aggregator::sinks::{RotationPeriod, RotationUnit};
///
/// // The default: every night at midnight
/// assert_eq!(RotationPeriod::default(), RotationPeriod::midnight());
///
/// // Every six hours
/// let period = RotationPeriod::new(RotationUnit::Hours, 6);
/// assert_eq!(period.to_string(), "6 x H");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationPeriod {
    pub unit: RotationUnit,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

fn default_interval() -> u32 {
    1
}

impl Default for RotationPeriod {
    fn default() -> Self {
        Self::midnight()
    }
}

impl fmt::Display for RotationPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.interval, self.unit)
    }
}

impl RotationPeriod {
    #[must_use]
    pub fn new(unit: RotationUnit, interval: u32) -> Self {
        Self { unit, interval }
    }

    #[must_use]
    pub fn midnight() -> Self {
        Self::new(RotationUnit::Midnight, 1)
    }

    /// Check the interval is at least one.
    pub fn validate(&self) -> Result<()> {
        if self.interval == 0 {
            return Err(LoggerError::config(
                "RotationPeriod",
                "interval must be at least 1",
            ));
        }
        if let RotationUnit::Weekday(day) = self.unit {
            if day > 6 {
                return Err(LoggerError::config(
                    "RotationPeriod",
                    format!("weekday must be 0-6, got {}", day),
                ));
            }
        }
        Ok(())
    }

    /// Length of one whole period
    pub fn length(&self) -> Duration {
        let interval = i64::from(self.interval.max(1));
        match self.unit.fixed_length() {
            Some(unit) => unit * interval as i32,
            None => match self.unit {
                RotationUnit::Weekday(_) => Duration::weeks(interval),
                _ => Duration::days(interval),
            },
        }
    }

    /// Whole calendar days per period for the midnight-aligned units
    fn calendar_days(&self) -> Option<u64> {
        let interval = u64::from(self.interval.max(1));
        match self.unit {
            RotationUnit::Midnight => Some(interval),
            RotationUnit::Weekday(_) => Some(7 * interval),
            _ => None,
        }
    }

    /// The first rollover instant strictly after `from`.
    ///
    /// `midnight` first rolls at the next local midnight and `W<n>` at the
    /// midnight ending day `n`, whatever the interval. The interval applies
    /// from the second period on (see [`following_rollover`](Self::following_rollover)).
    pub fn next_rollover(&self, from: DateTime<Local>) -> DateTime<Local> {
        match self.unit {
            RotationUnit::Midnight => next_midnight(from),
            RotationUnit::Weekday(day) => {
                let mut at = next_midnight(from);
                // The midnight starting day d ends day d - 1
                while (at.weekday().num_days_from_monday() + 6) % 7 != u32::from(day) {
                    at = next_midnight(at);
                }
                at
            }
            _ => from + self.length(),
        }
    }

    /// The rollover after `previous`, the first one later than `now`.
    ///
    /// Midnight-aligned units step whole calendar periods from `previous`,
    /// so the schedule keeps its weekday and survives DST changes. The
    /// fixed units restart from `now`.
    pub fn following_rollover(
        &self,
        previous: DateTime<Local>,
        now: DateTime<Local>,
    ) -> DateTime<Local> {
        let Some(days) = self.calendar_days() else {
            return now + self.length();
        };
        let mut date = previous.date_naive();
        let mut at = previous;
        while at <= now {
            match date.checked_add_days(Days::new(days)) {
                Some(next) => {
                    date = next;
                    at = local_midnight(date);
                }
                None => return self.next_rollover(now),
            }
        }
        at
    }

    /// Local wall-clock start of the period that ends at `end`.
    ///
    /// Midnight-aligned periods are counted back in calendar days, so a
    /// 23 or 25 hour DST day still starts at the previous midnight.
    pub fn period_start<Tz: TimeZone>(&self, end: &DateTime<Tz>) -> NaiveDateTime {
        let start = match self.calendar_days() {
            Some(days) => end.naive_local().checked_sub_days(Days::new(days)),
            None => end
                .clone()
                .checked_sub_signed(self.length())
                .map(|start| start.naive_local()),
        };
        start.unwrap_or_else(|| end.naive_local())
    }
}

/// Local midnight that starts the day after `from`
fn next_midnight(from: DateTime<Local>) -> DateTime<Local> {
    match from.date_naive().succ_opt() {
        Some(day) => local_midnight(day),
        None => from + Duration::days(1),
    }
}

/// First local instant of `date`
fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let midnight = date.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        // DST gap at 00:00: the day starts an hour later
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

/// Rotation settings for [`TimedRotatingFileSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationPolicy {
    pub period: RotationPeriod,
    /// strftime pattern appended to rotated file names
    pub suffix: String,
    /// Rotated files to keep; 0 keeps all
    pub backup_count: usize,
    /// Gzip rotated files
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            period: RotationPeriod::default(),
            suffix: DEFAULT_SUFFIX.to_string(),
            backup_count: 0,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_period(mut self, period: RotationPeriod) -> Self {
        self.period = period;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_backup_count(mut self, count: usize) -> Self {
        self.backup_count = count;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    /// Check the period and that the suffix is a valid, non-empty strftime pattern.
    pub fn validate(&self) -> Result<()> {
        self.period.validate()?;
        if self.suffix.is_empty() {
            return Err(LoggerError::config("RotationPolicy", "suffix must not be empty"));
        }
        if StrftimeItems::new(&self.suffix).any(|item| matches!(item, Item::Error)) {
            return Err(LoggerError::config(
                "RotationPolicy",
                format!("invalid strftime suffix '{}'", self.suffix),
            ));
        }
        Ok(())
    }
}

/// File sink with time-based rotation
///
/// # Examples
///
/// ```no_run
/// use log_aggregator::sinks::{RotationPeriod, RotationPolicy, RotationUnit, TimedRotatingFileSink};
/// use log_aggregator::LogLevel;
///
/// let policy = RotationPolicy::new()
///     .with_period(RotationPeriod::new(RotationUnit::Hours, 1))
///     .with_suffix("%Y-%m-%d_%H")
///     .with_backup_count(24);
/// let sink = TimedRotatingFileSink::with_policy("/var/log/app/record", policy)
///     .unwrap()
///     .with_min_level(LogLevel::Info);
/// ```
pub struct TimedRotatingFileSink {
    base_path: PathBuf,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    next_rollover: DateTime<Local>,
    filter: LevelFilter,
    template: FormatTemplate,
    timestamp_format: TimestampFormat,
    line: String,
}

impl TimedRotatingFileSink {
    /// Create a sink rotating at midnight with the default suffix.
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created or opened
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_policy(path, RotationPolicy::default())
    }

    /// Create a sink with a custom rotation policy.
    ///
    /// # Errors
    ///
    /// Returns error if the policy is invalid or the file cannot be opened
    pub fn with_policy<P: AsRef<Path>>(path: P, policy: RotationPolicy) -> Result<Self> {
        policy.validate()?;
        let base_path = path.as_ref().to_path_buf();

        if let Some(parent) = base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let (file, modified) = Self::open_append(&base_path)?;
        // An existing file's period started at its last write, so a restart
        // rotates yesterday's file instead of extending it
        let next_rollover = policy.period.next_rollover(modified);

        Ok(Self {
            base_path,
            policy,
            writer: Some(BufWriter::new(file)),
            next_rollover,
            filter: LevelFilter::new(LogLevel::Debug),
            template: FormatTemplate::default(),
            timestamp_format: TimestampFormat::default(),
            line: String::with_capacity(256),
        })
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.filter = LevelFilter::new(level);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: FormatTemplate) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn open_append(path: &Path) -> Result<(File, DateTime<Local>)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;
        let modified = file
            .metadata()
            .and_then(|m| m.modified())
            .map(DateTime::<Local>::from)
            .unwrap_or_else(|_| Local::now());
        Ok((file, modified))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.base_path
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Instant at which the next write triggers a rotation
    #[must_use]
    pub fn next_rollover(&self) -> DateTime<Local> {
        self.next_rollover
    }

    /// Name the current file will get when rotated now
    fn rotated_path(&self) -> PathBuf {
        let period_start = self.policy.period.period_start(&self.next_rollover);
        let filename = self
            .base_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_BASE_NAME);
        self.base_path.with_file_name(format!(
            "{}.{}",
            filename,
            period_start.format(&self.policy.suffix)
        ))
    }

    /// Roll the current file over to its suffixed name and start a new one
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        let target = self.rotated_path();
        let compressed = gz_path(&target);
        for stale in [&target, &compressed] {
            if stale.exists() {
                fs::remove_file(stale).map_err(|e| {
                    LoggerError::file_rotation(
                        stale.display().to_string(),
                        format!("Failed to replace existing rotated file: {}", e),
                    )
                })?;
            }
        }

        if self.base_path.exists() {
            fs::rename(&self.base_path, &target).map_err(|e| {
                LoggerError::file_rotation(
                    self.base_path.display().to_string(),
                    format!("Failed to rename to '{}': {}", target.display(), e),
                )
            })?;

            if self.policy.compress {
                compress_file(&target)?;
            }
        }

        if self.policy.backup_count > 0 {
            self.remove_old_backups();
        }

        let (file, _) = Self::open_append(&self.base_path)?;
        self.writer = Some(BufWriter::new(file));
        self.next_rollover = self
            .policy
            .period
            .following_rollover(self.next_rollover, Local::now());
        Ok(())
    }

    /// Rotated files of this sink, oldest first
    ///
    /// Only names whose suffix parses back under the policy's strftime
    /// pattern (optionally followed by `.gz`) count as backups.
    fn backups(&self) -> Vec<PathBuf> {
        let Some(dir) = self.base_path.parent() else {
            return Vec::new();
        };
        let dir = if dir.as_os_str().is_empty() { Path::new(".") } else { dir };
        let prefix = match self.base_path.file_name().and_then(|n| n.to_str()) {
            Some(name) => format!("{}.", name),
            None => return Vec::new(),
        };

        let mut backups: Vec<(NaiveDateTime, PathBuf)> = match fs::read_dir(dir) {
            Ok(entries) => entries
                .filter_map(|entry| entry.ok())
                .filter_map(|entry| {
                    let path = entry.path();
                    let suffix = path.file_name()?.to_str()?.strip_prefix(&prefix)?;
                    let suffix = suffix.strip_suffix(".gz").unwrap_or(suffix);
                    let start = parse_suffix(suffix, &self.policy.suffix)?;
                    Some((start, path))
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        backups.sort();
        backups.into_iter().map(|(_, path)| path).collect()
    }

    fn remove_old_backups(&self) {
        let backups = self.backups();
        let excess = backups.len().saturating_sub(self.policy.backup_count);
        for old in backups.into_iter().take(excess) {
            if let Err(e) = fs::remove_file(&old) {
                eprintln!(
                    "[LOGGER WARNING] Failed to remove old backup {}: {}",
                    old.display(),
                    e
                );
            }
        }
    }

    fn rotate_or_recover(&mut self) -> Result<()> {
        if let Err(e) = self.rotate() {
            eprintln!(
                "[LOGGER WARNING] Log rotation failed: {}. Continuing with current file.",
                e
            );
            if self.writer.is_none() {
                let (file, _) = Self::open_append(&self.base_path).map_err(|reopen_err| {
                    eprintln!(
                        "[LOGGER ERROR] Failed to reopen log file after rotation failure: {}",
                        reopen_err
                    );
                    e
                })?;
                self.writer = Some(BufWriter::new(file));
            }
            // Retry at the next boundary rather than on every write
            self.next_rollover = self
                .policy
                .period
                .following_rollover(self.next_rollover, Local::now());
        }
        Ok(())
    }
}

/// Period start encoded in a rotated file's suffix
///
/// Patterns without a time of day (or with hours but no minutes) parse as
/// a date; ties are then broken by file name.
fn parse_suffix(text: &str, pattern: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, pattern)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, pattern)
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

fn gz_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Gzip `path` to `path.gz`, removing the original only on success.
fn compress_file(path: &Path) -> Result<()> {
    use std::io::{BufReader, Read};

    let gz_path = gz_path(path);
    let mut temp_name = gz_path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let input = File::open(path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to open file for compression: {}", path.display()),
            e,
        )
    })?;
    let mut reader = BufReader::with_capacity(64 * 1024, input);

    let output = File::create(&temp_path).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to create temporary compressed file: {}", temp_path.display()),
            e,
        )
    })?;
    let mut encoder = flate2::write::GzEncoder::new(
        BufWriter::with_capacity(64 * 1024, output),
        flate2::Compression::default(),
    );

    let result = (|| -> std::io::Result<()> {
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = reader.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            encoder.write_all(&buffer[..read])?;
        }
        encoder.finish()?.flush()
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress {}", path.display()),
            e,
        ));
    }

    fs::rename(&temp_path, &gz_path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LoggerError::io_operation(
            "compress log file",
            format!("Failed to rename compressed file to: {}", gz_path.display()),
            e,
        )
    })?;

    if let Err(e) = fs::remove_file(path) {
        eprintln!(
            "[LOGGER WARNING] Compression succeeded but failed to remove original file {}: {}",
            path.display(),
            e
        );
    }
    Ok(())
}

impl Sink for TimedRotatingFileSink {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        if Local::now() >= self.next_rollover {
            self.rotate_or_recover()?;
        }

        self.line.clear();
        self.template
            .render_into(&mut self.line, record, &self.timestamp_format);
        self.line.push('\n');

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        writer.write_all(self.line.as_bytes()).map_err(|e| {
            LoggerError::file_sink(
                self.base_path.display().to_string(),
                format!("Failed to write record: {}", e),
            )
        })
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.base_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn filter(&self) -> LevelFilter {
        self.filter
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for TimedRotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CallSite;
    use chrono::{FixedOffset, Weekday};
    use std::io::Read;
    use tempfile::tempdir;

    fn record(level: LogLevel, message: &str) -> LogRecord {
        LogRecord::new(level, "rot", CallSite::new("rot.rs", 1, "writer"), message)
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap();
        Local.from_local_datetime(&naive).earliest().unwrap()
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("midnight".parse::<RotationUnit>().unwrap(), RotationUnit::Midnight);
        assert_eq!("MIDNIGHT".parse::<RotationUnit>().unwrap(), RotationUnit::Midnight);
        assert_eq!("h".parse::<RotationUnit>().unwrap(), RotationUnit::Hours);
        assert_eq!("W6".parse::<RotationUnit>().unwrap(), RotationUnit::Weekday(6));
        assert!("W7".parse::<RotationUnit>().is_err());
        assert!("fortnight".parse::<RotationUnit>().is_err());
        assert_eq!(RotationUnit::Weekday(2).to_string(), "W2");
    }

    #[test]
    fn test_period_serde() {
        let period: RotationPeriod =
            serde_json::from_str(r#"{"unit":"H","interval":3}"#).unwrap();
        assert_eq!(period, RotationPeriod::new(RotationUnit::Hours, 3));

        let period: RotationPeriod = serde_json::from_str(r#"{"unit":"midnight"}"#).unwrap();
        assert_eq!(period, RotationPeriod::midnight());

        assert!(serde_json::from_str::<RotationPeriod>(r#"{"unit":"X"}"#).is_err());
        assert_eq!(
            serde_json::to_string(&RotationPeriod::midnight()).unwrap(),
            r#"{"unit":"midnight","interval":1}"#
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(RotationPeriod::new(RotationUnit::Seconds, 0).validate().is_err());
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new().with_period(RotationPeriod::new(RotationUnit::Days, 0));
        assert!(TimedRotatingFileSink::with_policy(dir.path().join("record"), policy).is_err());
    }

    #[test]
    fn test_invalid_suffix_rejected() {
        assert!(RotationPolicy::new().with_suffix("%Y-%Q").validate().is_err());
        assert!(RotationPolicy::new().with_suffix("").validate().is_err());
        assert!(RotationPolicy::new().validate().is_ok());
    }

    #[test]
    fn test_next_rollover_midnight() {
        let from = local(2025, 3, 10, 15, 30);
        assert_eq!(RotationPeriod::midnight().next_rollover(from), local(2025, 3, 11, 0, 0));
        // The first rollover ignores the interval
        assert_eq!(
            RotationPeriod::new(RotationUnit::Midnight, 3).next_rollover(from),
            local(2025, 3, 11, 0, 0)
        );
    }

    #[test]
    fn test_next_rollover_weekday() {
        // 2025-03-10 is a Monday
        let from = local(2025, 3, 10, 9, 0);
        assert_eq!(from.weekday(), Weekday::Mon);

        // W2 rolls at the midnight ending Wednesday
        let next = RotationPeriod::new(RotationUnit::Weekday(2), 1).next_rollover(from);
        assert_eq!(next, local(2025, 3, 13, 0, 0));

        // Same weekday as today: at the end of today
        let next = RotationPeriod::new(RotationUnit::Weekday(0), 1).next_rollover(from);
        assert_eq!(next, local(2025, 3, 11, 0, 0));

        // Tuesday: a full week until the end of next Monday
        let next = RotationPeriod::new(RotationUnit::Weekday(0), 2).next_rollover(local(2025, 3, 11, 9, 0));
        assert_eq!(next, local(2025, 3, 18, 0, 0));
    }

    #[test]
    fn test_following_rollover_steps_calendar_periods() {
        let every_three_days = RotationPeriod::new(RotationUnit::Midnight, 3);
        let previous = local(2025, 3, 11, 0, 0);
        assert_eq!(
            every_three_days.following_rollover(previous, local(2025, 3, 11, 0, 0)),
            local(2025, 3, 14, 0, 0)
        );
        // Missed boundaries are skipped, keeping the alignment
        assert_eq!(
            every_three_days.following_rollover(previous, local(2025, 3, 18, 12, 0)),
            local(2025, 3, 20, 0, 0)
        );

        let fortnightly = RotationPeriod::new(RotationUnit::Weekday(0), 2);
        assert_eq!(
            fortnightly.following_rollover(local(2025, 3, 18, 0, 0), local(2025, 3, 18, 0, 1)),
            local(2025, 4, 1, 0, 0)
        );

        let hourly = RotationPeriod::new(RotationUnit::Hours, 1);
        let now = local(2025, 3, 10, 9, 30);
        assert_eq!(hourly.following_rollover(previous, now), now + Duration::hours(1));
    }

    #[test]
    fn test_period_start_counts_calendar_days() {
        // Midnight after the 23-hour spring-forward day in New York
        let end = FixedOffset::west_opt(4 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 10, 0, 0, 0)
            .unwrap();
        let day_start = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap().and_time(NaiveTime::MIN);
        assert_eq!(RotationPeriod::midnight().period_start(&end), day_start);
        assert_eq!(
            RotationPeriod::new(RotationUnit::Weekday(6), 2).period_start(&end),
            NaiveDate::from_ymd_opt(2025, 2, 24).unwrap().and_time(NaiveTime::MIN)
        );
        assert_eq!(
            RotationPeriod::new(RotationUnit::Hours, 6).period_start(&end),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap().and_hms_opt(18, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_suffix() {
        assert_eq!(
            parse_suffix("10-03-2025", "%d-%m-%Y"),
            NaiveDate::from_ymd_opt(2025, 3, 10).map(|d| d.and_time(NaiveTime::MIN))
        );
        assert_eq!(
            parse_suffix("2025-03-10_14-30", "%Y-%m-%d_%H-%M"),
            NaiveDate::from_ymd_opt(2025, 3, 10).and_then(|d| d.and_hms_opt(14, 30, 0))
        );
        assert_eq!(parse_suffix("0-notes.txt", DEFAULT_SUFFIX), None);
        assert_eq!(parse_suffix("2025-03-10.bak", DEFAULT_SUFFIX), None);
    }

    #[test]
    fn test_next_rollover_fixed_units() {
        let from = local(2025, 3, 10, 9, 0);
        assert_eq!(
            RotationPeriod::new(RotationUnit::Hours, 2).next_rollover(from),
            from + Duration::hours(2)
        );
        assert_eq!(
            RotationPeriod::new(RotationUnit::Seconds, 30).next_rollover(from),
            from + Duration::seconds(30)
        );
    }

    #[test]
    fn test_sink_creation() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join(DEFAULT_BASE_NAME);

        let sink = TimedRotatingFileSink::new(&path).unwrap();
        assert!(path.exists());
        assert_eq!(sink.path(), path);
        assert!(sink.next_rollover() > Local::now());
    }

    #[test]
    fn test_level_filter_applies() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        let mut sink = TimedRotatingFileSink::new(&path)
            .unwrap()
            .with_min_level(LogLevel::Warning)
            .with_template(FormatTemplate::parse("{level}:{message}").unwrap());

        assert!(!sink.handle(&record(LogLevel::Info, "quiet")).unwrap());
        assert!(sink.handle(&record(LogLevel::Error, "loud")).unwrap());
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ERROR:loud\n");
    }

    #[test]
    fn test_rotation_preserves_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        let policy = RotationPolicy::new()
            .with_period(RotationPeriod::new(RotationUnit::Seconds, 1))
            .with_suffix("%Y-%m-%d_%H-%M-%S");
        let mut sink = TimedRotatingFileSink::with_policy(&path, policy)
            .unwrap()
            .with_template(FormatTemplate::parse("{message}").unwrap());

        sink.emit(&record(LogLevel::Info, "before")).unwrap();
        sink.next_rollover = Local::now() - Duration::seconds(1);
        let expected_backup = sink.rotated_path();
        sink.emit(&record(LogLevel::Info, "after")).unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&expected_backup).unwrap(), "before\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "after\n");
        assert!(sink.next_rollover() > Local::now());
    }

    #[test]
    fn test_rotated_name_uses_period_start() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        let mut sink = TimedRotatingFileSink::new(&path).unwrap();

        sink.next_rollover = local(2025, 3, 11, 0, 0);
        assert_eq!(sink.rotated_path(), dir.path().join("record.2025-03-10"));
    }

    #[test]
    fn test_rotated_name_on_short_dst_day() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        fs::write(dir.path().join("record.2025-03-08"), "saturday\n").unwrap();
        let mut sink = TimedRotatingFileSink::new(&path)
            .unwrap()
            .with_template(FormatTemplate::parse("{message}").unwrap());

        // 2025-03-09 lasts 23 hours where DST starts that day
        sink.emit(&record(LogLevel::Info, "sunday")).unwrap();
        sink.next_rollover = local(2025, 3, 10, 0, 0);
        assert_eq!(sink.rotated_path(), dir.path().join("record.2025-03-09"));
        sink.rotate().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("record.2025-03-08")).unwrap(),
            "saturday\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("record.2025-03-09")).unwrap(),
            "sunday\n"
        );
    }

    #[test]
    fn test_backup_retention() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        let policy = RotationPolicy::new()
            .with_period(RotationPeriod::new(RotationUnit::Hours, 1))
            .with_suffix("%Y-%m-%d_%H")
            .with_backup_count(2);
        let mut sink = TimedRotatingFileSink::with_policy(&path, policy).unwrap();

        for hour in 1..=4 {
            sink.emit(&record(LogLevel::Info, &format!("hour {}", hour))).unwrap();
            sink.next_rollover = local(2025, 3, 10, hour, 0);
            sink.rotate().unwrap();
        }

        let backups = sink.backups();
        assert_eq!(backups.len(), 2);
        assert_eq!(backups[0], dir.path().join("record.2025-03-10_02"));
        assert_eq!(backups[1], dir.path().join("record.2025-03-10_03"));
    }

    #[test]
    fn test_retention_ignores_unrelated_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        for name in ["record.0-notes.txt", "record.lock", "record.2025-03-01.bak"] {
            fs::write(dir.path().join(name), "keep me\n").unwrap();
        }
        fs::write(dir.path().join("record.2025-03-09"), "old\n").unwrap();

        let policy = RotationPolicy::new().with_backup_count(1);
        let mut sink = TimedRotatingFileSink::with_policy(&path, policy).unwrap();
        sink.emit(&record(LogLevel::Info, "today")).unwrap();
        sink.next_rollover = local(2025, 3, 11, 0, 0);
        sink.rotate().unwrap();

        assert_eq!(sink.backups(), vec![dir.path().join("record.2025-03-10")]);
        assert!(!dir.path().join("record.2025-03-09").exists());
        for name in ["record.0-notes.txt", "record.lock", "record.2025-03-01.bak"] {
            assert!(dir.path().join(name).exists(), "{} was removed", name);
        }
    }

    #[test]
    fn test_retention_orders_by_parsed_date() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        // Name order differs from date order with a day-first suffix
        fs::write(dir.path().join("record.15-01-2025.gz"), "").unwrap();
        fs::write(dir.path().join("record.28-02-2025"), "").unwrap();
        fs::write(dir.path().join("record.01-03-2025"), "").unwrap();

        let policy = RotationPolicy::new()
            .with_suffix("%d-%m-%Y")
            .with_backup_count(2);
        let mut sink = TimedRotatingFileSink::with_policy(&path, policy).unwrap();
        sink.emit(&record(LogLevel::Info, "latest")).unwrap();
        sink.next_rollover = local(2025, 3, 11, 0, 0);
        sink.rotate().unwrap();

        assert_eq!(
            sink.backups(),
            vec![
                dir.path().join("record.01-03-2025"),
                dir.path().join("record.10-03-2025"),
            ]
        );
        assert!(!dir.path().join("record.15-01-2025.gz").exists());
        assert!(!dir.path().join("record.28-02-2025").exists());
    }

    #[test]
    fn test_rotation_with_compression() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        let policy = RotationPolicy::new().with_compression(true);
        let mut sink = TimedRotatingFileSink::with_policy(&path, policy)
            .unwrap()
            .with_template(FormatTemplate::parse("{message}").unwrap());

        sink.emit(&record(LogLevel::Info, "squeeze me")).unwrap();
        sink.next_rollover = local(2025, 3, 11, 0, 0);
        sink.rotate().unwrap();

        let gz = dir.path().join("record.2025-03-10.gz");
        assert!(gz.exists());
        assert!(!dir.path().join("record.2025-03-10").exists());

        let mut decoder = flate2::read::GzDecoder::new(File::open(gz).unwrap());
        let mut content = String::new();
        decoder.read_to_string(&mut content).unwrap();
        assert_eq!(content, "squeeze me\n");
    }

    #[test]
    fn test_existing_rotated_file_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("record");
        fs::write(dir.path().join("record.2025-03-10"), "stale\n").unwrap();

        let mut sink = TimedRotatingFileSink::new(&path)
            .unwrap()
            .with_template(FormatTemplate::parse("{message}").unwrap());
        sink.emit(&record(LogLevel::Info, "fresh")).unwrap();
        sink.next_rollover = local(2025, 3, 11, 0, 0);
        sink.rotate().unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("record.2025-03-10")).unwrap(),
            "fresh\n"
        );
    }
}
