//! Aggregator metrics for observability
//!
//! Counters updated by the listener thread and readable from anywhere.

use std::sync::atomic::{AtomicU64, Ordering};

/// Listener counters
///
/// # Example
///
/// ```
/// use log_aggregator::AggregatorMetrics;
///
/// let metrics = AggregatorMetrics::new();
/// metrics.record_received();
/// metrics.record_dispatched();
///
/// assert_eq!(metrics.received(), 1);
/// assert_eq!(metrics.failure_rate(), 0.0);
/// ```
#[derive(Debug)]
pub struct AggregatorMetrics {
    /// Records taken off the queue
    received: AtomicU64,

    /// Records handed to every sink without error
    dispatched: AtomicU64,

    /// Records for which at least one sink failed or panicked
    failed: AtomicU64,

    /// Times the listener stopped because the queue transport closed
    transport_shutdowns: AtomicU64,
}

impl AggregatorMetrics {
    pub const fn new() -> Self {
        Self {
            received: AtomicU64::new(0),
            dispatched: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            transport_shutdowns: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn transport_shutdowns(&self) -> u64 {
        self.transport_shutdowns.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_received(&self) -> u64 {
        self.received.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_failed(&self) -> u64 {
        self.failed.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_transport_shutdown(&self) -> u64 {
        self.transport_shutdowns.fetch_add(1, Ordering::Relaxed)
    }

    /// Percentage (0.0 - 100.0) of received records that hit a sink failure
    pub fn failure_rate(&self) -> f64 {
        let received = self.received() as f64;
        if received == 0.0 {
            0.0
        } else {
            (self.failed() as f64 / received) * 100.0
        }
    }
}

impl Default for AggregatorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for AggregatorMetrics {
    /// Snapshot of the current values
    fn clone(&self) -> Self {
        Self {
            received: AtomicU64::new(self.received()),
            dispatched: AtomicU64::new(self.dispatched()),
            failed: AtomicU64::new(self.failed()),
            transport_shutdowns: AtomicU64::new(self.transport_shutdowns()),
        }
    }
}
