//! Format templates for rendering records as text lines
//!
//! A template is literal text with `{placeholder}` fields, optionally with
//! an alignment/width spec (`{level:<8}`). Templates are parsed once when a
//! sink is built; rendering only walks the pre-parsed segments.
//!
//! | Placeholder  | Value                                   |
//! |--------------|-----------------------------------------|
//! | `timestamp`  | record time, per [`TimestampFormat`]    |
//! | `level`      | `DEBUG`, `INFO`, `WARNING`, ...         |
//! | `source`     | logger name (alias `name`)              |
//! | `file`       | base name of the source file            |
//! | `path`       | source file path as recorded            |
//! | `line`       | source line                             |
//! | `function`   | enclosing function                      |
//! | `message`    | the message                             |
//! | `thread`     | thread name or id                       |
//! | `process`    | OS process id                           |

use super::error::{LoggerError, Result};
use super::record::LogRecord;
use super::timestamp::TimestampFormat;
use std::fmt::Write;
use std::str::FromStr;

/// `<timestamp> <LEVEL padded to 8> [<source>] <file> - <function>() : <message>`
pub const DEFAULT_FORMAT: &str =
    "{timestamp} {level:<8} [{source}] {file} - {function}() : {message}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Timestamp,
    Level,
    Source,
    File,
    Path,
    Line,
    Function,
    Message,
    Thread,
    Process,
}

impl Field {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "timestamp" | "asctime" => Field::Timestamp,
            "level" => Field::Level,
            "source" | "name" => Field::Source,
            "file" => Field::File,
            "path" => Field::Path,
            "line" => Field::Line,
            "function" => Field::Function,
            "message" => Field::Message,
            "thread" => Field::Thread,
            "process" => Field::Process,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        field: Field,
        align: Align,
        width: usize,
    },
}

/// A parsed format template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl FormatTemplate {
    /// Parse a template string.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::TemplateError`] for unknown placeholders,
    /// malformed width specs, or unbalanced braces.
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err(LoggerError::template(template, "nested '{'"))
                            }
                            Some(c) => body.push(c),
                            None => {
                                return Err(LoggerError::template(template, "unclosed '{'"))
                            }
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Self::parse_field(template, &body)?);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(LoggerError::template(template, "unmatched '}'")),
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    fn parse_field(template: &str, body: &str) -> Result<Segment> {
        let (name, spec) = match body.split_once(':') {
            Some((name, spec)) => (name.trim(), Some(spec.trim())),
            None => (body.trim(), None),
        };
        let field = Field::lookup(name).ok_or_else(|| {
            LoggerError::template(template, format!("unknown placeholder '{}'", name))
        })?;

        let (align, width) = match spec {
            None | Some("") => (Align::Left, 0),
            Some(spec) => {
                let (align, digits) = match spec.chars().next() {
                    Some('<') => (Align::Left, &spec[1..]),
                    Some('>') => (Align::Right, &spec[1..]),
                    Some('^') => (Align::Center, &spec[1..]),
                    _ => (Align::Left, spec),
                };
                let width = digits.parse::<usize>().map_err(|_| {
                    LoggerError::template(template, format!("invalid width spec ':{}'", spec))
                })?;
                (align, width)
            }
        };

        Ok(Segment::Field { field, align, width })
    }

    /// The template text this was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render a record into a new line (without trailing newline).
    pub fn render(&self, record: &LogRecord, timestamp_format: &TimestampFormat) -> String {
        let mut out = String::with_capacity(self.source.len() + record.message.len() + 64);
        self.render_into(&mut out, record, timestamp_format);
        out
    }

    /// Render a record, appending to `out`.
    pub fn render_into(
        &self,
        out: &mut String,
        record: &LogRecord,
        timestamp_format: &TimestampFormat,
    ) {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { field, align, width } => {
                    let owned;
                    let value: &str = match field {
                        Field::Timestamp => {
                            owned = timestamp_format.format(&record.timestamp);
                            &owned
                        }
                        Field::Level => record.level.to_str(),
                        Field::Source => &record.source,
                        Field::File => record.file_name(),
                        Field::Path => &record.file,
                        Field::Line => {
                            owned = record.line.to_string();
                            &owned
                        }
                        Field::Function => &record.function,
                        Field::Message => &record.message,
                        Field::Thread => &record.thread,
                        Field::Process => {
                            owned = record.process.to_string();
                            &owned
                        }
                    };
                    // Writing to a String cannot fail
                    let _ = match align {
                        Align::Left => write!(out, "{:<width$}", value, width = *width),
                        Align::Right => write!(out, "{:>width$}", value, width = *width),
                        Align::Center => write!(out, "{:^width$}", value, width = *width),
                    };
                }
            }
        }
    }
}

impl Default for FormatTemplate {
    fn default() -> Self {
        // DEFAULT_FORMAT is a constant known to parse
        Self::parse(DEFAULT_FORMAT).unwrap_or_else(|_| Self {
            source: DEFAULT_FORMAT.to_string(),
            segments: vec![Segment::Field {
                field: Field::Message,
                align: Align::Left,
                width: 0,
            }],
        })
    }
}

impl FromStr for FormatTemplate {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
