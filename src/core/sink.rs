//! Sink trait for record output destinations

use super::{error::Result, log_level::LevelFilter, record::LogRecord};

/// A destination that renders records.
///
/// Sinks are owned and driven exclusively by the aggregator's listener, so
/// they only need to be `Send`.
pub trait Sink: Send {
    /// Render one record. Called only for records that pass [`Sink::filter`].
    fn emit(&mut self, record: &LogRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn filter(&self) -> LevelFilter;
    fn name(&self) -> &str;

    /// Filter, then emit. Returns whether the record was rendered.
    fn handle(&mut self, record: &LogRecord) -> Result<bool> {
        if !self.filter().permits(record.level) {
            return Ok(false);
        }
        self.emit(record)?;
        Ok(true)
    }
}
