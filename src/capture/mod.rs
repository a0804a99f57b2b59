//! Capture of raw text output as log records

pub mod line_buffered;
pub mod stack;

pub use line_buffered::{CaptureScope, LineBufferedAdapter};
pub use stack::{ResolvedCaller, StackResolver};
