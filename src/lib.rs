#![allow(clippy::module_inception)]

use std::{fmt::Write as _, fs, path::Path, rc::Rc, sync::Once};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod macros;
pub mod reader;
pub mod scope;
pub mod types;

extern crate regex;

/// A source line number and the name of the file it belongs to.
#[derive(Debug, Clone)]
pub struct Position(pub u32, pub Rc<String>);

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=snlc=debug` or `RUST_LOG=snlc=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// Returns line `line` (1-based) of `file`, without its line terminator.
pub fn get_source_line(file: &Path, line: u32) -> Option<String> {
    if line == 0 {
        return None;
    }

    let content = fs::read_to_string(file).ok()?;
    content
        .lines()
        .nth(line as usize - 1)
        .map(|text| text.to_string())
}

/// Builds the report `display_error` prints.
///
/// ```text
/// Error: UnknownIdentifier (Variable `k` not declared) [semantic error]
/// -> prog.tree:12
///    UnknownIdentifier at prog.tree:12: unknown identifier "k"
///    |
/// 12 | k := 3;
///    |
/// ```
///
/// The file named in the report is the one recorded in the error position.
/// The source line is quoted only when the program source is available.
pub fn format_error(error: &Error, source: Option<&Path>) -> String {
    let position = error.get_position();
    let mut report = String::new();

    if let ErrorTip::None = error.get_tip() {
        let _ = writeln!(report, "Error: {} [{}]", error.get_error_name(), error.get_class());
    } else {
        let _ = writeln!(
            report,
            "Error: {} ({}) [{}]",
            error.get_error_name(),
            error.get_tip(),
            error.get_class()
        );
    }
    let _ = writeln!(report, "-> {}:{}", position.1, position.0);
    let _ = writeln!(report, "   {}", error);

    let Some(line_text) = source.and_then(|source| get_source_line(source, position.0)) else {
        return report;
    };

    let line_string = position.0.to_string();
    let padding = line_string.len() + 2;

    let _ = writeln!(report, "{:>padding$}", "|");
    let _ = writeln!(report, "{} | {}", line_string, line_text.trim());
    let _ = writeln!(report, "{:>padding$}", "|");
    report
}

/// Prints an error report to stderr.
pub fn display_error(error: &Error, source: Option<&Path>) {
    eprint!("{}", format_error(error, source));
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    #[test]
    fn test_get_source_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "program p\nvar integer i;\nbegin\n  i := 1\nend.\n").unwrap();

        assert_eq!(
            super::get_source_line(file.path(), 2),
            Some(String::from("var integer i;"))
        );
        assert_eq!(
            super::get_source_line(file.path(), 4),
            Some(String::from("  i := 1"))
        );
        assert_eq!(super::get_source_line(file.path(), 0), None);
        assert_eq!(super::get_source_line(file.path(), 9), None);
    }

    #[test]
    fn test_format_error_quotes_source_line() {
        use std::rc::Rc;

        use crate::{
            errors::errors::{Error, ErrorImpl},
            Position,
        };

        let mut source = tempfile::NamedTempFile::new().unwrap();
        write!(source, "program p\nbegin\n   k := 3\nend.\n").unwrap();

        let error = Error::new(
            ErrorImpl::UnknownIdentifier {
                identifier: "k".to_string(),
            },
            Position(3, Rc::new("prog.tree".to_string())),
        );

        let report = super::format_error(&error, Some(source.path()));
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(
            lines[0],
            "Error: UnknownIdentifier (Variable `k` not declared) [semantic error]"
        );
        assert_eq!(lines[1], "-> prog.tree:3");
        assert_eq!(&lines[3..], ["  |", "3 | k := 3", "  |"]);

        let without_source = super::format_error(&error, None);
        assert_eq!(without_source.lines().count(), 3);
    }
}
