//! The aggregator: one queue, one listener thread, console and file sinks

use super::{
    config::AggregatorConfig,
    error::{LoggerError, Result},
    metrics::AggregatorMetrics,
    queue::{record_queue, Message, QueueHandle},
    record::LogRecord,
    sink::Sink,
    template::FormatTemplate,
};
use crate::sinks::{ConsoleSink, TimedRotatingFileSink};
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::any::Any;
use std::io::Write;
use std::sync::Arc;
use std::thread;

/// Messages the listener drains per wake-up before flushing the sinks
const BATCH_SIZE: usize = 50;

/// Collects records from any number of producers and renders them from a
/// single listener thread.
///
/// Lifecycle state sits behind locks, so an `Arc<Aggregator>` can be shared
/// and joined from whichever thread finishes last.
///
/// # Example
///
/// ```
/// use log_aggregator::prelude::*;
///
/// let aggregator = Aggregator::new(AggregatorConfig::new().level_console(LogLevel::Debug));
/// aggregator.start()?;
///
/// let handle = aggregator.queue_handle();
/// let worker = std::thread::spawn(move || {
///     let logger = Producer::new(handle).logger("worker");
///     log_aggregator::info!(logger, "hello from {}", "a worker");
/// });
/// worker.join().unwrap();
///
/// aggregator.join()?;
/// # Ok::<(), LoggerError>(())
/// ```
pub struct Aggregator {
    config: AggregatorConfig,
    queue: QueueHandle,
    receiver: Mutex<Option<Receiver<Message>>>,
    console_writer: Mutex<Option<Box<dyn Write + Send>>>,
    listener: Mutex<Option<thread::JoinHandle<()>>>,
    metrics: Arc<AggregatorMetrics>,
}

impl Aggregator {
    /// Create an aggregator with a fresh queue. Nothing is rendered until
    /// [`start`](Self::start); records enqueued before then are kept.
    #[must_use]
    pub fn new(config: AggregatorConfig) -> Self {
        let (queue, receiver) = record_queue();
        Self {
            config,
            queue,
            receiver: Mutex::new(Some(receiver)),
            console_writer: Mutex::new(None),
            listener: Mutex::new(None),
            metrics: Arc::new(AggregatorMetrics::new()),
        }
    }

    /// Like [`new`](Self::new), but the console sink writes to `writer`
    /// instead of standard error.
    #[must_use]
    pub fn with_console_writer(config: AggregatorConfig, writer: Box<dyn Write + Send>) -> Self {
        let aggregator = Self::new(config);
        *aggregator.console_writer.lock() = Some(writer);
        aggregator
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Handle producers use to enqueue records
    pub fn queue_handle(&self) -> QueueHandle {
        self.queue.clone()
    }

    pub fn metrics(&self) -> &AggregatorMetrics {
        &self.metrics
    }

    pub fn is_running(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Build the sinks and spawn the listener thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, the log file cannot
    /// be opened, the thread cannot be spawned, or the listener was already
    /// started.
    pub fn start(&self) -> Result<()> {
        let mut listener_slot = self.listener.lock();
        let mut receiver_slot = self.receiver.lock();
        if listener_slot.is_some() || receiver_slot.is_none() {
            return Err(LoggerError::AlreadyStarted);
        }
        self.config.validate()?;
        let sinks = self.build_sinks()?;

        let receiver = receiver_slot.take().ok_or(LoggerError::AlreadyStarted)?;
        let listener = Listener {
            receiver,
            sinks,
            metrics: Arc::clone(&self.metrics),
        };

        let handle = thread::Builder::new()
            .name("log-listener".into())
            .spawn(move || {
                listener.run();
            })
            .map_err(|e| {
                LoggerError::io_operation("spawning listener", "thread creation failed", e)
            })?;
        *listener_slot = Some(handle);
        Ok(())
    }

    fn build_sinks(&self) -> Result<Vec<Box<dyn Sink>>> {
        let config = &self.config;
        let mut sinks: Vec<Box<dyn Sink>> = Vec::with_capacity(2);

        if let Some(path) = config.log_file() {
            let file = TimedRotatingFileSink::with_policy(path, config.rotation_policy())?
                .with_min_level(config.level_log)
                .with_template(FormatTemplate::parse(&config.format_log)?)
                .with_timestamp_format(config.timestamp_format.clone());
            sinks.push(Box::new(file));
        }

        let template = FormatTemplate::parse(&config.format_console)?;
        let writer = self
            .console_writer
            .lock()
            .take()
            .unwrap_or_else(|| Box::new(std::io::stderr()));
        let console = ConsoleSink::with_writer(writer)
            .with_color_mode(config.console_colors)
            .with_min_level(config.level_console)
            .with_template(template)
            .with_timestamp_format(config.timestamp_format.clone());
        sinks.push(Box::new(console));

        Ok(sinks)
    }

    /// Enqueue the shutdown sentinel and wait for the listener to drain the
    /// queue and exit.
    ///
    /// Everything enqueued before this call is rendered by the time it
    /// returns. Call it only once producers have stopped logging.
    ///
    /// # Errors
    ///
    /// [`LoggerError::NotStarted`] if there is no running listener,
    /// [`LoggerError::ListenerPanicked`] if the listener thread panicked.
    pub fn join(&self) -> Result<()> {
        let handle = self.listener.lock().take().ok_or(LoggerError::NotStarted)?;
        // A failed send means the listener already stopped on its own
        let _ = self.queue.send_shutdown();
        handle
            .join()
            .map_err(|payload| LoggerError::ListenerPanicked(panic_message(payload.as_ref())))
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        if self.listener.get_mut().is_some() {
            if let Err(e) = self.join() {
                eprintln!("[LOGGER ERROR] Listener shutdown on drop failed: {}", e);
            }
        }
    }
}

/// Why the listener loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shutdown {
    Sentinel,
    TransportClosed,
}

/// Sole owner of the sinks; lives on the listener thread
pub(crate) struct Listener {
    receiver: Receiver<Message>,
    sinks: Vec<Box<dyn Sink>>,
    metrics: Arc<AggregatorMetrics>,
}

impl Listener {
    pub(crate) fn run(mut self) -> Shutdown {
        let mut batch = Vec::with_capacity(BATCH_SIZE);

        loop {
            match self.receiver.recv() {
                Ok(message) => batch.push(message),
                Err(_) => {
                    // Every sender is gone: same as the sentinel
                    self.metrics.record_transport_shutdown();
                    eprintln!("[LOGGER WARNING] Record queue closed; listener shutting down.");
                    self.flush_all();
                    return Shutdown::TransportClosed;
                }
            }

            while batch.len() < BATCH_SIZE {
                match self.receiver.try_recv() {
                    Ok(message) => batch.push(message),
                    Err(_) => break,
                }
            }

            let mut stop = false;
            for message in batch.drain(..) {
                match message {
                    Message::Record(record) => self.dispatch(&record),
                    Message::Shutdown => {
                        stop = true;
                        break;
                    }
                }
            }
            self.flush_all();

            if stop {
                return Shutdown::Sentinel;
            }
        }
    }

    /// Hand one record to every sink, isolating errors and panics per sink.
    fn dispatch(&mut self, record: &LogRecord) {
        self.metrics.record_received();
        let mut failed = false;

        for sink in self.sinks.iter_mut() {
            let result =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.handle(record)));
            match result {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    failed = true;
                    eprintln!(
                        "[LOGGER ERROR] Oops! Sink '{}' failed on a record from '{}' ({}:{} {}()): {}",
                        sink.name(),
                        record.source,
                        record.file,
                        record.line,
                        record.function,
                        e
                    );
                    let mut source = std::error::Error::source(&e);
                    while let Some(cause) = source {
                        eprintln!("    caused by: {}", cause);
                        source = cause.source();
                    }
                }
                Err(payload) => {
                    failed = true;
                    eprintln!(
                        "[LOGGER CRITICAL] Sink '{}' panicked on a record from '{}': {}. \
                         Listener continues.",
                        sink.name(),
                        record.source,
                        panic_message(payload.as_ref())
                    );
                }
            }
        }

        if failed {
            self.metrics.record_failed();
        } else {
            self.metrics.record_dispatched();
        }
    }

    fn flush_all(&mut self) {
        for sink in self.sinks.iter_mut() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| sink.flush()));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => eprintln!("[LOGGER ERROR] Sink '{}' flush failed: {}", sink.name(), e),
                Err(payload) => eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked during flush: {}",
                    sink.name(),
                    panic_message(payload.as_ref())
                ),
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallSite, LevelFilter, LogLevel, Producer};

    /// Sink that remembers messages and can be told to misbehave
    struct Recording {
        seen: Arc<Mutex<Vec<String>>>,
        flushes: Arc<Mutex<usize>>,
    }

    impl Sink for Recording {
        fn emit(&mut self, record: &LogRecord) -> Result<()> {
            match record.message.as_str() {
                "error" => Err(LoggerError::other("simulated failure")),
                "panic" => panic!("simulated panic"),
                message => {
                    self.seen.lock().push(message.to_string());
                    Ok(())
                }
            }
        }

        fn flush(&mut self) -> Result<()> {
            *self.flushes.lock() += 1;
            Ok(())
        }

        fn filter(&self) -> LevelFilter {
            LevelFilter::new(LogLevel::Debug)
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn listener() -> (QueueHandle, Listener, Arc<Mutex<Vec<String>>>, Arc<AggregatorMetrics>) {
        let (queue, receiver) = record_queue();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let metrics = Arc::new(AggregatorMetrics::new());
        let listener = Listener {
            receiver,
            sinks: vec![Box::new(Recording {
                seen: Arc::clone(&seen),
                flushes: Arc::new(Mutex::new(0)),
            })],
            metrics: Arc::clone(&metrics),
        };
        (queue, listener, seen, metrics)
    }

    fn record(message: &str) -> LogRecord {
        LogRecord::new(LogLevel::Info, "t", CallSite::new("t.rs", 1, "f"), message)
    }

    #[test]
    fn test_sentinel_stops_listener() {
        let (queue, listener, seen, metrics) = listener();
        queue.enqueue(record("a"));
        queue.enqueue(record("b"));
        queue.send_shutdown();
        queue.enqueue(record("after sentinel"));

        assert_eq!(listener.run(), Shutdown::Sentinel);
        assert_eq!(*seen.lock(), vec!["a", "b"]);
        assert_eq!(metrics.dispatched(), 2);
    }

    #[test]
    fn test_closed_transport_is_graceful_shutdown() {
        let (queue, listener, seen, metrics) = listener();
        queue.enqueue(record("last words"));
        drop(queue);

        assert_eq!(listener.run(), Shutdown::TransportClosed);
        assert_eq!(*seen.lock(), vec!["last words"]);
        assert_eq!(metrics.transport_shutdowns(), 1);
    }

    #[test]
    fn test_bad_record_does_not_kill_listener() {
        let (queue, listener, seen, metrics) = listener();
        for message in ["one", "error", "two", "panic", "three"] {
            queue.enqueue(record(message));
        }
        queue.send_shutdown();

        assert_eq!(listener.run(), Shutdown::Sentinel);
        assert_eq!(*seen.lock(), vec!["one", "two", "three"]);
        assert_eq!(metrics.received(), 5);
        assert_eq!(metrics.failed(), 2);
        assert_eq!(metrics.dispatched(), 3);
    }

    #[test]
    fn test_large_backlog_is_drained_in_batches() {
        let (queue, listener, seen, _) = listener();
        for i in 0..(BATCH_SIZE * 3 + 7) {
            queue.enqueue(record(&i.to_string()));
        }
        queue.send_shutdown();

        listener.run();
        let seen = seen.lock();
        assert_eq!(seen.len(), BATCH_SIZE * 3 + 7);
        assert!(seen.iter().enumerate().all(|(i, m)| *m == i.to_string()));
    }

    #[test]
    fn test_lifecycle_misuse() {
        let aggregator =
            Aggregator::with_console_writer(AggregatorConfig::new(), Box::new(std::io::sink()));
        assert!(matches!(aggregator.join(), Err(LoggerError::NotStarted)));

        aggregator.start().unwrap();
        assert!(aggregator.is_running());
        assert!(matches!(aggregator.start(), Err(LoggerError::AlreadyStarted)));

        aggregator.join().unwrap();
        assert!(!aggregator.is_running());
        assert!(matches!(aggregator.join(), Err(LoggerError::NotStarted)));
        assert!(matches!(aggregator.start(), Err(LoggerError::AlreadyStarted)));
    }

    #[test]
    fn test_invalid_config_fails_start() {
        let aggregator = Aggregator::with_console_writer(
            AggregatorConfig::new().format_console("{unknown}"),
            Box::new(std::io::sink()),
        );
        assert!(matches!(aggregator.start(), Err(LoggerError::TemplateError { .. })));
        assert!(!aggregator.is_running());
    }

    #[test]
    fn test_records_before_start_are_kept() {
        let aggregator =
            Aggregator::with_console_writer(AggregatorConfig::new(), Box::new(std::io::sink()));
        let logger = Producer::new(aggregator.queue_handle()).logger("early");
        logger.info("queued before start");

        aggregator.start().unwrap();
        aggregator.join().unwrap();
        assert_eq!(aggregator.metrics().received(), 1);
    }

    #[test]
    fn test_shared_aggregator_joined_from_another_thread() {
        let aggregator = Arc::new(Aggregator::with_console_writer(
            AggregatorConfig::new(),
            Box::new(std::io::sink()),
        ));
        aggregator.start().unwrap();

        let shared = Arc::clone(&aggregator);
        let joiner = thread::spawn(move || shared.join());
        joiner.join().unwrap().unwrap();
        assert!(!aggregator.is_running());
    }

    #[test]
    fn test_drop_joins_listener() {
        let metrics_seen;
        {
            let aggregator =
                Aggregator::with_console_writer(AggregatorConfig::new(), Box::new(std::io::sink()));
            aggregator.start().unwrap();
            let handle = aggregator.queue_handle();
            Producer::new(handle).logger("d").warning("bye");
            metrics_seen = Arc::clone(&aggregator.metrics);
        }
        assert_eq!(metrics_seen.received(), 1);
    }
}
