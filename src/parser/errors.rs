//! Parser error type.

use crate::span::Span;
use thiserror::Error;

/// A fatal parse failure. The parser has no recovery; the first
/// misplaced token aborts the parse.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    /// What the parser would have accepted here, when it knows.
    pub expected: Option<String>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
            expected: None,
        }
    }

    pub fn expecting(message: impl Into<String>, expected: impl Into<String>, span: Span) -> Self {
        ParseError {
            message: message.into(),
            span,
            expected: Some(expected.into()),
        }
    }

    /// A truncated token stream, as opposed to a misplaced token.
    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        let expected = expected.into();
        ParseError {
            message: format!("Unexpected end of input, expected {expected}"),
            span,
            expected: Some(expected),
        }
    }
}
