//! Caller lookup by walking the stack
//!
//! Used by [`LineBufferedAdapter`](super::LineBufferedAdapter) when no call
//! site is bound. Frames belonging to the adapter, the standard library and
//! the unwinder are passed over; the first frame left is the function that
//! issued the write.

use crate::core::LogRecord;

/// Frames whose path starts with one of these never count as the writer
const RUNTIME_PREFIXES: &[&str] = &[
    "std::",
    "core::",
    "alloc::",
    "backtrace::",
    "<std::",
    "<core::",
    "<alloc::",
    "<backtrace::",
    "<&",
];

/// Frames of the capture machinery itself
const CAPTURE_PATHS: &[&str] = &[
    "line_buffered::LineBufferedAdapter",
    "line_buffered::CaptureScope",
    "capture::stack::StackResolver",
];

/// Resolves the function behind a write from the call stack
///
/// `skip` counts caller frames to pass over after the capture machinery,
/// for when writes go through a wrapper of your own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackResolver {
    skip: usize,
}

/// Where a write came from, as far as debug info tells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCaller {
    pub function: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl ResolvedCaller {
    pub(crate) fn apply_to(self, mut record: LogRecord) -> LogRecord {
        record.function = self.function;
        if let (Some(file), Some(line)) = (self.file, self.line) {
            record.file = file;
            record.line = line;
        }
        record
    }
}

impl StackResolver {
    pub fn new(skip: usize) -> Self {
        Self { skip }
    }

    pub fn skip(&self) -> usize {
        self.skip
    }

    /// Walk the current stack.
    ///
    /// Returns `None` when symbols are unavailable (stripped binaries) or
    /// the stack runs out first.
    #[inline(never)]
    pub fn resolve(&self) -> Option<ResolvedCaller> {
        let mut remaining = self.skip;
        let mut found = None;

        backtrace::trace(|frame| {
            // Inlined functions come first, innermost outwards
            let mut symbols = Vec::new();
            backtrace::resolve_frame(frame, |symbol| {
                if let Some(name) = symbol.name() {
                    symbols.push(ResolvedCaller {
                        function: format!("{:#}", name),
                        file: symbol.filename().map(|path| path.display().to_string()),
                        line: symbol.lineno(),
                    });
                }
            });

            for caller in symbols {
                let path = strip_generic_args(&caller.function);
                if is_capture_machinery(&path) {
                    continue;
                }
                if remaining > 0 {
                    remaining -= 1;
                    continue;
                }
                found = Some(ResolvedCaller {
                    function: short_symbol_name(&path).to_string(),
                    ..caller
                });
                return false;
            }
            true
        });

        found
    }
}

fn is_capture_machinery(path: &str) -> bool {
    // Symbols without a path are C runtime or unwinder frames
    !path.contains("::")
        || RUNTIME_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || CAPTURE_PATHS.iter().any(|capture| path.contains(capture))
}

/// Drops `::<...>` argument lists from a demangled symbol.
fn strip_generic_args(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    let mut rest = symbol;
    while let Some(pos) = rest.find("::<") {
        out.push_str(&rest[..pos]);
        let args = &rest[pos + 2..];
        let mut depth = 0usize;
        let mut end = args.len();
        for (i, c) in args.char_indices() {
            match c {
                '<' => depth += 1,
                '>' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        end = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        rest = &args[end..];
    }
    out.push_str(rest);
    out
}

/// Last path segment, with closure frames reported as their function.
fn short_symbol_name(path: &str) -> &str {
    let mut name = path;
    // `{{closure}}` or `{closure#0}` depending on the mangling scheme
    while let Some(pos) = name.rfind("::").filter(|&pos| name[pos + 2..].starts_with('{')) {
        name = &name[..pos];
    }
    match name.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[inline(never)]
    fn resolve_here(skip: usize) -> Option<ResolvedCaller> {
        StackResolver::new(skip).resolve()
    }

    #[inline(never)]
    fn resolve_through_wrapper() -> Option<ResolvedCaller> {
        resolve_here(1)
    }

    #[test]
    fn test_strip_generic_args() {
        assert_eq!(
            strip_generic_args("app::report::<alloc::vec::Vec<u8>>"),
            "app::report"
        );
        assert_eq!(
            strip_generic_args("<app::Out as std::io::Write>::write_all::<&mut [u8]>"),
            "<app::Out as std::io::Write>::write_all"
        );
        assert_eq!(strip_generic_args("app::run"), "app::run");
    }

    #[test]
    fn test_short_symbol_name() {
        assert_eq!(short_symbol_name("app::worker::run"), "run");
        assert_eq!(short_symbol_name("app::worker::run::{{closure}}"), "run");
        assert_eq!(short_symbol_name("app::worker::run::{closure#0}"), "run");
        assert_eq!(short_symbol_name("<app::Out as std::io::Write>::write"), "write");
    }

    #[test]
    fn test_machinery_frames() {
        assert!(is_capture_machinery("std::io::Write::write_all"));
        assert!(is_capture_machinery("<&mut W as std::io::Write>::write"));
        assert!(is_capture_machinery(
            "<log_aggregator::capture::line_buffered::LineBufferedAdapter as std::io::Write>::write"
        ));
        assert!(is_capture_machinery("_Unwind_Backtrace"));
        assert!(!is_capture_machinery("my_app::reports::print_summary"));
    }

    #[test]
    fn test_resolve_finds_calling_function() {
        let caller = resolve_here(0).expect("symbols available in test builds");
        assert_eq!(caller.function, "resolve_here");
        assert!(caller.file.is_some_and(|file| file.ends_with("stack.rs")));
    }

    #[test]
    fn test_skip_passes_over_wrappers() {
        let caller = resolve_through_wrapper().expect("symbols available in test builds");
        assert_eq!(caller.function, "resolve_through_wrapper");
    }
}
