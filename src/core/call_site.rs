//! Source location attached to every record

use std::panic::Location;

/// Function name used when the caller could not be determined.
pub const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Where a record was produced: file, line and enclosing function.
///
/// Rust has no runtime function names, so call sites are captured at the
/// point of use with [`call_site!`](crate::call_site) (the logging macros
/// do this for you) and passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub function: &'static str,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self { file, line, function }
    }

    /// Call site of the caller, without a function name.
    ///
    /// Chained `#[track_caller]` functions report the outermost
    /// untracked caller.
    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            function: UNKNOWN_FUNCTION,
        }
    }

    #[must_use]
    pub fn with_function(mut self, function: &'static str) -> Self {
        self.function = function;
        self
    }
}

/// Strips a `type_name` path down to the bare function name.
///
/// Used by [`function_name!`](crate::function_name); closures report the
/// function that defines them.
#[doc(hidden)]
pub fn short_function_name(path: &'static str) -> &'static str {
    let mut name = path.strip_suffix("::__f").unwrap_or(path);
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    match name.rfind("::") {
        Some(pos) => &name[pos + 2..],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_function_name() {
        assert_eq!(short_function_name("my_crate::worker::run::__f"), "run");
        assert_eq!(
            short_function_name("my_crate::worker::run::{{closure}}::{{closure}}::__f"),
            "run"
        );
        assert_eq!(short_function_name("main::__f"), "main");
    }

    #[test]
    fn test_function_name_macro() {
        assert_eq!(crate::function_name!(), "test_function_name_macro");
        let from_closure = || crate::function_name!();
        assert_eq!(from_closure(), "test_function_name_macro");
    }

    #[test]
    fn test_caller_reports_this_file() {
        let site = CallSite::caller();
        assert!(site.file.ends_with("call_site.rs"));
        assert_eq!(site.function, UNKNOWN_FUNCTION);
        assert_eq!(site.with_function("f").function, "f");
    }
}
