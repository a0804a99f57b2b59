//! Logging macros for ergonomic log message formatting.
//!
//! Unlike the [`Logger`](crate::Logger) methods, the macros capture the full
//! call site: file, line and the name of the enclosing function.
//!
//! # Examples
//!
//! ```
//! use log_aggregator::prelude::*;
//! use log_aggregator::info;
//!
//! let aggregator = Aggregator::new(AggregatorConfig::new());
//! let logger = Producer::new(aggregator.queue_handle()).logger("server");
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! ```

/// Name of the enclosing function, without its module path.
///
/// Inside a closure this is the function that defines the closure.
///
/// ```
/// fn handler() -> &'static str {
///     log_aggregator::function_name!()
/// }
/// assert_eq!(handler(), "handler");
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::core::call_site::short_function_name(type_name_of(__f))
    }};
}

/// [`CallSite`](crate::CallSite) of the macro invocation.
#[macro_export]
macro_rules! call_site {
    () => {
        $crate::CallSite::new(file!(), line!(), $crate::function_name!())
    };
}

/// Log a message with automatic formatting.
///
/// Evaluates to `true` if the record was enqueued.
///
/// # Examples
///
/// ```
/// # use log_aggregator::prelude::*;
/// # let aggregator = Aggregator::new(AggregatorConfig::new());
/// # let logger = Producer::new(aggregator.queue_handle()).logger("app");
/// use log_aggregator::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        let logger = &$logger;
        if logger.enabled(level) {
            logger.log_at(level, $crate::call_site!(), format!($($arg)+))
        } else {
            false
        }
    }};
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use log_aggregator::prelude::*;
/// # let aggregator = Aggregator::new(AggregatorConfig::new());
/// # let logger = Producer::new(aggregator.queue_handle()).logger("app");
/// use log_aggregator::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use log_aggregator::prelude::*;
/// # let aggregator = Aggregator::new(AggregatorConfig::new());
/// # let logger = Producer::new(aggregator.queue_handle()).logger("app");
/// use log_aggregator::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use log_aggregator::prelude::*;
/// # let aggregator = Aggregator::new(AggregatorConfig::new());
/// # let logger = Producer::new(aggregator.queue_handle()).logger("app");
/// use log_aggregator::warning;
/// warning!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use log_aggregator::prelude::*;
/// # let aggregator = Aggregator::new(AggregatorConfig::new());
/// # let logger = Producer::new(aggregator.queue_handle()).logger("app");
/// use log_aggregator::error;
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a critical-level message.
///
/// # Examples
///
/// ```
/// # use log_aggregator::prelude::*;
/// # let aggregator = Aggregator::new(AggregatorConfig::new());
/// # let logger = Producer::new(aggregator.queue_handle()).logger("app");
/// use log_aggregator::critical;
/// critical!(logger, "Unable to recover from error: {}", "disk full");
/// ```
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Critical, $($arg)+)
    };
}
