//! Parse failure type.

use miette::{Diagnostic, SourceSpan};

/// A syntax error found while parsing Python source.
///
/// Malformed input is an expected outcome for an auditor, so callers are
/// meant to turn this into a report entry rather than abort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Diagnostic)]
#[error("{message} at line {line}, column {column}")]
#[diagnostic(code(nbaudit::python::syntax))]
pub struct ParseError {
    /// Human-readable description of the problem.
    pub message: String,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset of the offending node.
    pub offset: usize,
    #[label("here")]
    span: SourceSpan,
}

impl ParseError {
    /// Creates a parse error at the given position.
    #[must_use]
    pub fn new(
        message: impl Into<String>,
        line: usize,
        column: usize,
        offset: usize,
        length: usize,
    ) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            offset,
            span: SourceSpan::from((offset, length)),
        }
    }

    /// Error for a parser that produced no tree at all.
    #[must_use]
    pub fn no_tree(message: impl Into<String>) -> Self {
        Self::new(message, 1, 1, 0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position() {
        let err = ParseError::new("invalid syntax", 3, 7, 20, 1);
        assert_eq!(err.to_string(), "invalid syntax at line 3, column 7");
    }

    #[test]
    fn no_tree_points_at_start() {
        let err = ParseError::no_tree("parser unavailable");
        assert_eq!((err.line, err.column, err.offset), (1, 1, 0));
    }
}
