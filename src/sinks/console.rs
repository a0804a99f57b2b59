//! Console sink implementation

use crate::core::{LevelFilter, LogLevel, LogRecord, FormatTemplate, Result, Sink, TimestampFormat};
use serde::{Deserialize, Serialize};
use std::io::Write;

const GREY: &str = "\x1b[38;20m";
const GREEN: &str = "\x1b[32;20m";
const YELLOW: &str = "\x1b[33;20m";
const RED: &str = "\x1b[31;20m";
const BOLD_RED: &str = "\x1b[31;1m";
const RESET: &str = "\x1b[0m";

/// Whether the console sink wraps lines in ANSI colour codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Always,
    Never,
    /// Follow `NO_COLOR` / `CLICOLOR` / `CLICOLOR_FORCE` and whether stderr is a terminal
    Auto,
}

impl ColorMode {
    fn resolve(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            #[cfg(feature = "console")]
            ColorMode::Auto => colored::control::ShouldColorize::from_env().should_colorize(),
            #[cfg(not(feature = "console"))]
            ColorMode::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Per-level escape prefix/suffix, indexed by [`LogLevel`] position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    prefixes: [&'static str; 5],
    reset: &'static str,
}

impl Palette {
    /// DEBUG grey, INFO green, WARNING yellow, ERROR red, CRITICAL bold red
    pub const ANSI: Palette = Palette {
        prefixes: [GREY, GREEN, YELLOW, RED, BOLD_RED],
        reset: RESET,
    };

    pub const PLAIN: Palette = Palette {
        prefixes: ["", "", "", "", ""],
        reset: "",
    };

    #[inline]
    pub fn prefix(&self, level: LogLevel) -> &'static str {
        self.prefixes[level.index()]
    }

    #[inline]
    pub fn reset(&self) -> &'static str {
        self.reset
    }
}

/// Enable ANSI escape processing where the console needs it (Windows).
fn enable_ansi_support() {
    #[cfg(all(windows, feature = "console"))]
    {
        let _ = colored::control::set_virtual_terminal(true);
    }
}

/// Renders records as coloured lines on standard error
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
    palette: Palette,
    filter: LevelFilter,
    template: FormatTemplate,
    timestamp_format: TimestampFormat,
    line: String,
}

impl ConsoleSink {
    /// Sink writing to standard error with the default format at `Info`.
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }

    /// Sink writing to an arbitrary writer instead of standard error.
    ///
    /// # Example
    ///
    /// ```
    /// use log_aggregator::sinks::ConsoleSink;
    ///
    /// let sink = ConsoleSink::with_writer(Box::new(std::io::sink()));
    /// ```
    pub fn with_writer(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer,
            palette: Self::palette_for(ColorMode::Always),
            filter: LevelFilter::new(LogLevel::Info),
            template: FormatTemplate::default(),
            timestamp_format: TimestampFormat::default(),
            line: String::with_capacity(256),
        }
    }

    fn palette_for(mode: ColorMode) -> Palette {
        if mode.resolve() {
            enable_ansi_support();
            Palette::ANSI
        } else {
            Palette::PLAIN
        }
    }

    #[must_use]
    pub fn with_color_mode(mut self, mode: ColorMode) -> Self {
        self.palette = Self::palette_for(mode);
        self
    }

    #[must_use]
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.filter = LevelFilter::new(level);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: FormatTemplate) -> Self {
        self.template = template;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// The full line for `record`, colour codes included, without newline
    pub fn format_line(&mut self, record: &LogRecord) -> &str {
        self.line.clear();
        self.line.push_str(self.palette.prefix(record.level));
        self.template
            .render_into(&mut self.line, record, &self.timestamp_format);
        self.line.push_str(self.palette.reset());
        &self.line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn emit(&mut self, record: &LogRecord) -> Result<()> {
        self.format_line(record);
        self.line.push('\n');
        self.writer.write_all(self.line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn filter(&self) -> LevelFilter {
        self.filter
    }

    fn name(&self) -> &str {
        "console"
    }
}
