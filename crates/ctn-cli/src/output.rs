//! Formatted output helpers for CLI commands.
//!
//! Renders arguments back into ctn notation and draws section headings.

use std::io::Write;

use ctn_container::{Argument, ServiceArguments};

/// Writes a title underlined with a double rule of the same width.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn heading(out: &mut dyn Write, title: &str) -> std::io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "\u{2550}".repeat(title.chars().count()))?;
    writeln!(out)
}

/// Renders one argument the way it would be written in a ctn file.
#[must_use]
pub fn format_argument(argument: &Argument) -> String {
    match argument {
        Argument::Raw(value) => value.to_string(),
        Argument::Parameter(name) => format!(":{name}"),
        Argument::Dependency(name) => format!("@{name}"),
    }
}

/// Renders an argument list as `(a, b, c)`.
#[must_use]
pub fn format_arguments(arguments: &ServiceArguments) -> String {
    let parts: Vec<String> = arguments.as_slice().iter().map(format_argument).collect();
    format!("({})", parts.join(", "))
}

/// Formats a count with the singular or plural noun.
#[must_use]
pub fn count(n: usize, singular: &str, plural: &str) -> String {
    format!("{n} {}", if n == 1 { singular } else { plural })
}
