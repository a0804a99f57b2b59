//! # Log Aggregator
//!
//! Cross-thread log aggregation: any number of producers push records onto
//! one queue, and a single listener thread renders them to a coloured
//! console and a time-rotated log file.
//!
//! ## Features
//!
//! - **One writer**: only the listener touches the console and the file
//! - **Non-blocking producers**: logging is an enqueue on an unbounded channel
//! - **Level gating**: independent minimum levels for console and file
//! - **Rotation**: time-based file rotation with retention and gzip
//! - **Output capture**: [`LineBufferedAdapter`] turns printed lines into records
//!
//! ## Example
//!
//! ```
//! use log_aggregator::prelude::*;
//! use log_aggregator::{info, warning};
//!
//! let aggregator = Aggregator::new(AggregatorConfig::new());
//! aggregator.start()?;
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|id| {
//!         let producer = Producer::new(aggregator.queue_handle());
//!         std::thread::spawn(move || {
//!             let logger = producer.logger(format!("worker-{}", id));
//!             info!(logger, "started");
//!             warning!(logger, "finished with {} retries", id);
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//!
//! aggregator.join()?;
//! # Ok::<(), LoggerError>(())
//! ```

pub mod capture;
pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::capture::{CaptureScope, LineBufferedAdapter};
    pub use crate::core::{
        Aggregator, AggregatorConfig, AggregatorMetrics, CallSite, LevelFilter, LogLevel,
        LogRecord, Logger, LoggerError, Producer, QueueHandle, Result, TimestampFormat,
    };
    pub use crate::sinks::{ColorMode, RotationPeriod, RotationUnit};
}

pub use capture::{CaptureScope, LineBufferedAdapter, StackResolver};
pub use core::{
    Aggregator, AggregatorConfig, AggregatorMetrics, CallSite, FormatTemplate, LevelFilter,
    LogLevel, LogRecord, Logger, LoggerError, Message, Producer, QueueHandle, Result, Sink,
    TimestampFormat, DEFAULT_FORMAT, UNKNOWN_FUNCTION,
};
pub use sinks::{
    ColorMode, ConsoleSink, Palette, RotationPeriod, RotationPolicy, RotationUnit,
    TimedRotatingFileSink,
};
