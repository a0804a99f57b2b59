//! Log record structure

use super::call_site::CallSite;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::Path;

// Thread-local cache so repeated records on one thread don't re-format the id
thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Thread name, or its debug id for unnamed threads
fn current_thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let thread = std::thread::current();
                match thread.name() {
                    Some(name) => name.to_string(),
                    None => format!("{:?}", thread.id()),
                }
            })
            .clone()
    })
}

/// One log event. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Logical logger / producer name
    pub source: String,
    pub file: String,
    pub line: u32,
    pub function: String,
    pub message: String,
    pub thread: String,
    pub process: u32,
}

impl LogRecord {
    /// Escape control characters so that one record always renders as one line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(
        level: LogLevel,
        source: impl Into<String>,
        site: CallSite,
        message: impl AsRef<str>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            source: source.into(),
            file: site.file.to_string(),
            line: site.line,
            function: site.function.to_string(),
            message: Self::sanitize_message(message.as_ref()),
            thread: current_thread_label(),
            process: std::process::id(),
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Final path component of `file`
    pub fn file_name(&self) -> &str {
        Path::new(&self.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.file)
    }
}
