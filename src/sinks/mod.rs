//! Sink implementations

pub mod console;
pub mod rotating_file;

pub use console::{ColorMode, ConsoleSink, Palette};
pub use rotating_file::{
    RotationPeriod, RotationPolicy, RotationUnit, TimedRotatingFileSink, DEFAULT_BASE_NAME,
    DEFAULT_SUFFIX,
};

pub use crate::core::Sink;
