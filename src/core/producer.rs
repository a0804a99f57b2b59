//! Producer-side logging context
//!
//! A producer binds to an aggregator's [`QueueHandle`] once and then hands
//! out named [`Logger`]s. Every log call becomes a [`LogRecord`] pushed onto
//! the queue; nothing is rendered on the producer's side.

use super::call_site::CallSite;
use super::log_level::LogLevel;
use super::queue::QueueHandle;
use super::record::LogRecord;
use std::sync::Arc;

/// A producer's binding to the aggregator queue
#[derive(Debug, Clone)]
pub struct Producer {
    queue: QueueHandle,
    min_level: LogLevel,
}

impl Producer {
    /// Bind with the default minimum level (`Debug`, i.e. forward everything
    /// and let the sinks filter).
    pub fn new(queue: QueueHandle) -> Self {
        Self::bind(queue, LogLevel::Debug)
    }

    /// Bind to `queue`, discarding records below `min_level` locally.
    pub fn bind(queue: QueueHandle, min_level: LogLevel) -> Self {
        Self { queue, min_level }
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// A logger that tags its records with `name` as the source.
    pub fn logger(&self, name: impl Into<String>) -> Logger {
        Logger {
            name: Arc::from(name.into()),
            producer: self.clone(),
        }
    }
}

/// Named logging handle. Cheap to clone and `Send`.
#[derive(Debug, Clone)]
pub struct Logger {
    name: Arc<str>,
    producer: Producer,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.producer.min_level
    }

    /// Enqueue a record with an explicit call site.
    ///
    /// Returns `false` if the record was filtered out or the listener has
    /// already shut down.
    pub fn log_at(&self, level: LogLevel, site: CallSite, message: impl AsRef<str>) -> bool {
        if !self.enabled(level) {
            return false;
        }
        let record = LogRecord::new(level, &*self.name, site, message);
        self.producer.queue.enqueue(record)
    }

    /// Enqueue a record built by the caller, e.g. one whose function name
    /// was resolved at runtime.
    ///
    /// The level gate still applies; the record's source is kept as is.
    pub fn submit(&self, record: LogRecord) -> bool {
        self.enabled(record.level) && self.producer.queue.enqueue(record)
    }

    /// Enqueue a record attributed to the calling file and line.
    ///
    /// The function name is only known through the macros
    /// ([`info!`](crate::info) and friends).
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> bool {
        self.log_at(level, CallSite::caller(), message)
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warning, message);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    #[track_caller]
    pub fn critical(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Critical, message);
    }
}
