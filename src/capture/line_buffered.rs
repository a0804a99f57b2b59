//! Line-buffered adapter turning raw writes into records
//!
//! Anything that prints text (a progress reporter, a third-party helper
//! taking `impl Write`) can be pointed at a [`LineBufferedAdapter`]. Text is
//! buffered until a write ends with a newline; the buffered line then
//! becomes one record at the adapter's level.
//!
//! ```
//! use log_aggregator::prelude::*;
//! use log_aggregator::call_site;
//!
//! let aggregator = Aggregator::new(AggregatorConfig::new());
//! let logger = Producer::new(aggregator.queue_handle()).logger("stdout");
//! let mut adapter = LineBufferedAdapter::new(logger, LogLevel::Info);
//!
//! adapter.write_from("50% ", call_site!());
//! adapter.write_from("done\n", call_site!());
//! assert!(adapter.pending().is_empty());
//! ```

use super::stack::StackResolver;
use crate::core::{CallSite, LogLevel, LogRecord, Logger};
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::ops::{Deref, DerefMut};

pub struct LineBufferedAdapter {
    logger: Logger,
    level: LogLevel,
    buffer: Vec<u8>,
    call_site: Option<CallSite>,
    origin: CallSite,
    resolver: Option<StackResolver>,
}

impl LineBufferedAdapter {
    /// Adapter emitting through `logger` at `level`.
    ///
    /// Writes through the `io::Write`/`fmt::Write` impls with no call site
    /// bound are attributed to the place the adapter was created, unless a
    /// stack resolver is enabled.
    #[track_caller]
    pub fn new(logger: Logger, level: LogLevel) -> Self {
        Self {
            logger,
            level,
            buffer: Vec::with_capacity(128),
            call_site: None,
            origin: CallSite::caller(),
            resolver: None,
        }
    }

    /// Attribute unbound writes by walking the stack.
    ///
    /// The function that issued the line-completing write is reported,
    /// with its file and line when debug info has them. `skip` passes over
    /// that many more caller frames, for writes made through your own
    /// wrapper. A bound call site still takes precedence.
    ///
    /// ```
    /// # use log_aggregator::prelude::*;
    /// # let aggregator = Aggregator::new(AggregatorConfig::new());
    /// # let logger = Producer::new(aggregator.queue_handle()).logger("out");
    /// use std::io::Write;
    ///
    /// fn third_party_report(out: &mut impl Write) -> std::io::Result<()> {
    ///     writeln!(out, "report ready")
    /// }
    ///
    /// let mut adapter = LineBufferedAdapter::new(logger, LogLevel::Info).with_stack_resolver(0);
    /// third_party_report(&mut adapter)?;
    /// # Ok::<(), std::io::Error>(())
    /// ```
    #[must_use]
    pub fn with_stack_resolver(mut self, skip: usize) -> Self {
        self.resolver = Some(StackResolver::new(skip));
        self
    }

    pub fn stack_resolver(&self) -> Option<StackResolver> {
        self.resolver
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// Text buffered since the last emitted line
    pub fn pending(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.buffer)
    }

    pub fn call_site(&self) -> Option<CallSite> {
        self.call_site
    }

    /// Bind `site` for all later writes; `None` goes back to per-write
    /// caller tracking.
    pub fn set_call_site(&mut self, site: Option<CallSite>) {
        self.call_site = site;
    }

    /// Bind `site` until the returned guard is dropped.
    ///
    /// ```
    /// # use log_aggregator::prelude::*;
    /// # let aggregator = Aggregator::new(AggregatorConfig::new());
    /// # let logger = Producer::new(aggregator.queue_handle()).logger("out");
    /// use log_aggregator::call_site;
    ///
    /// let mut adapter = LineBufferedAdapter::new(logger, LogLevel::Info);
    /// {
    ///     let mut scope = adapter.scope(call_site!());
    ///     scope.write("attributed to this function\n");
    /// }
    /// assert!(adapter.call_site().is_none());
    /// ```
    pub fn scope(&mut self, site: CallSite) -> CaptureScope<'_> {
        let previous = self.call_site.replace(site);
        CaptureScope {
            adapter: self,
            previous,
        }
    }

    /// Buffer `fragment`; emit a record if it ends with a newline.
    ///
    /// Attribution is the bound call site if there is one, otherwise the
    /// stack resolver's answer or else the calling file and line.
    #[track_caller]
    pub fn write(&mut self, fragment: &str) {
        match self.call_site {
            Some(site) => self.push(fragment.as_bytes(), site, false),
            None => self.push(fragment.as_bytes(), CallSite::caller(), true),
        }
    }

    /// Like [`write`](Self::write) with an explicit call site.
    pub fn write_from(&mut self, fragment: &str, site: CallSite) {
        self.push(fragment.as_bytes(), site, false);
    }

    /// Does nothing: a line without its newline is never emitted.
    pub fn flush(&mut self) {}

    /// `unbound` writes may be attributed by the stack resolver.
    fn push(&mut self, bytes: &[u8], site: CallSite, unbound: bool) {
        self.buffer.extend_from_slice(bytes);
        if bytes.last() != Some(&b'\n') {
            return;
        }
        if self.logger.enabled(self.level) {
            let line = String::from_utf8_lossy(&self.buffer);
            let mut record = LogRecord::new(self.level, self.logger.name(), site, line.trim_end());
            if unbound {
                if let Some(caller) = self.resolver.and_then(|resolver| resolver.resolve()) {
                    record = caller.apply_to(record);
                }
            }
            self.logger.submit(record);
        }
        self.buffer.clear();
    }

    fn trait_site(&self) -> (CallSite, bool) {
        match self.call_site {
            Some(site) => (site, false),
            None => (self.origin, true),
        }
    }
}

impl io::Write for LineBufferedAdapter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let (site, unbound) = self.trait_site();
        self.push(buf, site, unbound);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for LineBufferedAdapter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let (site, unbound) = self.trait_site();
        self.push(s.as_bytes(), site, unbound);
        Ok(())
    }
}

impl fmt::Debug for LineBufferedAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBufferedAdapter")
            .field("logger", &self.logger.name())
            .field("level", &self.level)
            .field("pending", &self.pending())
            .field("call_site", &self.call_site)
            .field("resolver", &self.resolver)
            .finish()
    }
}

/// Guard returned by [`LineBufferedAdapter::scope`]
pub struct CaptureScope<'a> {
    adapter: &'a mut LineBufferedAdapter,
    previous: Option<CallSite>,
}

impl Deref for CaptureScope<'_> {
    type Target = LineBufferedAdapter;

    fn deref(&self) -> &Self::Target {
        self.adapter
    }
}

impl DerefMut for CaptureScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.adapter
    }
}

impl io::Write for CaptureScope<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::Write::write(&mut *self.adapter, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl fmt::Write for CaptureScope<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        fmt::Write::write_str(&mut *self.adapter, s)
    }
}

impl Drop for CaptureScope<'_> {
    fn drop(&mut self) {
        self.adapter.call_site = self.previous;
    }
}
