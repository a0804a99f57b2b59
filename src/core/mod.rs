//! Core types: records, levels, the queue, producers and the aggregator

pub mod aggregator;
pub mod call_site;
pub mod config;
pub mod error;
pub mod log_level;
pub mod metrics;
pub mod producer;
pub mod queue;
pub mod record;
pub mod sink;
pub mod template;
pub mod timestamp;

pub use aggregator::Aggregator;
pub use call_site::{CallSite, UNKNOWN_FUNCTION};
pub use config::AggregatorConfig;
pub use error::{LoggerError, Result};
pub use log_level::{LevelFilter, LogLevel};
pub use metrics::AggregatorMetrics;
pub use producer::{Logger, Producer};
pub use queue::{Message, QueueHandle};
pub use record::LogRecord;
pub use sink::Sink;
pub use template::{FormatTemplate, DEFAULT_FORMAT};
pub use timestamp::TimestampFormat;
