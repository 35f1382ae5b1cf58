//! Validation error types.
//!
//! The validator walks the whole AST and collects every problem before
//! reporting, so a user fixing a query sees all of it at once.

use crate::span::Span;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationCode {
    UnknownRelation,
    UnknownGroup,
    UnknownFunction,
    InvalidArity,
    AmbiguousIdentifier,
    UnknownIdentifier,
    TypeMismatch,
    CircularReference,
    InvalidRangeType,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::UnknownRelation => "UNKNOWN_RELATION",
            ValidationCode::UnknownGroup => "UNKNOWN_GROUP",
            ValidationCode::UnknownFunction => "UNKNOWN_FUNCTION",
            ValidationCode::InvalidArity => "INVALID_ARITY",
            ValidationCode::AmbiguousIdentifier => "AMBIGUOUS_IDENTIFIER",
            ValidationCode::UnknownIdentifier => "UNKNOWN_IDENTIFIER",
            ValidationCode::TypeMismatch => "TYPE_MISMATCH",
            ValidationCode::CircularReference => "CIRCULAR_REFERENCE",
            ValidationCode::InvalidRangeType => "INVALID_RANGE_TYPE",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One static check failure, anchored to the offending span.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[{code}] {message}")]
pub struct ValidationError {
    pub message: String,
    pub span: Span,
    pub code: ValidationCode,
}

impl ValidationError {
    pub fn new(code: ValidationCode, message: impl Into<String>, span: Span) -> Self {
        ValidationError {
            message: message.into(),
            span,
            code,
        }
    }
}

/// All failures from one validation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl std::error::Error for ValidationErrors {}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "query validation failed with {} error(s):", self.errors.len())?;
        for error in &self.errors {
            writeln!(f, "  {error}")?;
        }
        Ok(())
    }
}
