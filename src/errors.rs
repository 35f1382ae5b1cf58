//! Top-level error type unifying all four stages.

use crate::engine::errors::RuntimeError;
use crate::lexer::LexerError;
use crate::parser::ParseError;
use crate::span::Span;
use crate::validator::ValidationErrors;
use thiserror::Error;

/// Any failure from the lex → parse → validate → execute pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrailQlError {
    #[error("lex error: {0}")]
    Lexer(#[from] LexerError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl TrailQlError {
    /// The primary offending span, when one exists.
    pub fn span(&self) -> Option<Span> {
        match self {
            TrailQlError::Lexer(e) => Some(e.span()),
            TrailQlError::Parse(e) => Some(e.span),
            TrailQlError::Validation(e) => e.errors.first().map(|err| err.span),
            TrailQlError::Runtime(e) => e.span(),
        }
    }

    /// Format the error for display to the user, with line/column and a
    /// caret underline pointing at the offending substring:
    ///
    /// ```text
    /// error: expected expression, found keyword `and`
    ///   --> line 3, column 7
    ///    |
    ///  3 | where and
    ///    |       ^^^
    /// ```
    pub fn render(&self, source: &str) -> String {
        match self {
            TrailQlError::Validation(errors) => {
                let mut out = String::new();
                for error in &errors.errors {
                    out.push_str(&format!("error: {error}\n{}\n", error.span.render(source)));
                }
                out
            }
            _ => match self.span() {
                Some(span) => format!("error: {self}\n{}", span.render(source)),
                None => format!("error: {self}"),
            },
        }
    }
}
