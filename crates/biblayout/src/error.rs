/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for layout compilation and rendering.

use std::fmt;
use thiserror::Error;

/// A position in layout source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    /// Byte offset from the start of the source.
    pub offset: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
}

impl Location {
    /// Compute the location of a byte offset within `source`.
    pub fn at(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors that can occur while compiling or rendering a layout.
///
/// Syntax variants are only produced by compilation; [`LayoutError::Format`]
/// is only produced by rendering.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// Malformed layout syntax.
    #[error("Parse error at {location}: {message}")]
    Syntax { message: String, location: Location },

    /// A `\format[...]` names a formatter that is not registered.
    #[error("Unknown formatter '{name}' at {location}")]
    UnknownFormatter { name: String, location: Location },

    /// `\end{...}` does not repeat the expression of its `\begin{...}`.
    #[error("Mismatched block end at {location}: expected \\end{{{expected}}}, found \\end{{{found}}}")]
    MismatchedEnd {
        expected: String,
        found: String,
        location: Location,
    },

    /// A block or bracket is opened but never closed.
    #[error("Unterminated {construct} starting at {location}")]
    Unterminated {
        construct: &'static str,
        location: Location,
    },

    /// A condition joins predicates with both `&&` and `||`.
    #[error("Condition '{expression}' at {location} mixes '&&' and '||'")]
    MixedOperators {
        expression: String,
        location: Location,
    },

    /// A formatter rejected its input or argument during rendering.
    #[error("Formatter '{formatter}' failed: {source}")]
    Format {
        formatter: String,
        #[source]
        source: FormatError,
    },

    /// Invalid configuration data.
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// I/O error (e.g., reading a layout file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LayoutError {
    /// Source location for errors raised while compiling.
    pub fn location(&self) -> Option<Location> {
        match self {
            LayoutError::Syntax { location, .. }
            | LayoutError::UnknownFormatter { location, .. }
            | LayoutError::MismatchedEnd { location, .. }
            | LayoutError::Unterminated { location, .. }
            | LayoutError::MixedOperators { location, .. } => Some(*location),
            LayoutError::Format { .. } | LayoutError::Config { .. } | LayoutError::Io(_) => None,
        }
    }

    /// Whether this error was raised by layout compilation.
    pub fn is_syntax_error(&self) -> bool {
        self.location().is_some()
    }
}

/// Error returned by a formatter that cannot handle its input or argument.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FormatError {
    message: String,
}

impl FormatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_first_line() {
        let location = Location::at("abc", 2);
        assert_eq!(
            location,
            Location {
                offset: 2,
                line: 1,
                column: 3
            }
        );
    }

    #[test]
    fn test_location_later_line() {
        let source = "one\ntwo\nthree";
        let location = Location::at(source, source.find("ree").unwrap());
        assert_eq!(location.line, 3);
        assert_eq!(location.column, 3);
        assert_eq!(location.to_string(), "line 3, column 3");
    }

    #[test]
    fn test_location_counts_characters() {
        let source = "ñé\\x";
        let location = Location::at(source, source.find('\\').unwrap());
        assert_eq!(location.column, 3);
    }

    #[test]
    fn test_location_clamps_offset() {
        assert_eq!(Location::at("ab", 10).offset, 2);
    }

    #[test]
    fn test_error_display() {
        let err = LayoutError::MismatchedEnd {
            expected: "author".to_string(),
            found: "editor".to_string(),
            location: Location::at("x", 0),
        };
        assert_eq!(
            err.to_string(),
            "Mismatched block end at line 1, column 1: expected \\end{author}, found \\end{editor}"
        );
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_format_error_is_not_syntax() {
        let err = LayoutError::Format {
            formatter: "NameFormatter".to_string(),
            source: FormatError::new("bad spec"),
        };
        assert!(!err.is_syntax_error());
        assert_eq!(err.to_string(), "Formatter 'NameFormatter' failed: bad spec");
    }
}
