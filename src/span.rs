//! Source spans for error reporting.
//!
//! Every token and AST node carries a half-open byte range `[start, end)`
//! into the original query text. Spans survive all the way from the lexer
//! to runtime errors so the host can underline the offending substring.

use serde::Serialize;
use std::fmt;

/// Half-open byte range `[start, end)` into the query source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// A span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 1-based line and column of the span start within `source`.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        let upto = &source[..self.start.min(source.len())];
        let line = upto.matches('\n').count() + 1;
        let col = match upto.rfind('\n') {
            Some(nl) => upto[nl + 1..].chars().count() + 1,
            None => upto.chars().count() + 1,
        };
        (line, col)
    }

    /// Render the source line containing this span with a caret underline:
    ///
    /// ```text
    ///   --> line 3, column 9
    ///    |
    ///  3 | where and
    ///    |       ^^^
    /// ```
    pub fn render(&self, source: &str) -> String {
        let (line, col) = self.line_col(source);
        let line_text = source.lines().nth(line - 1).unwrap_or("");
        let gutter = line.to_string().len();
        let carets = "^".repeat(self.len().max(1).min(line_text.len().saturating_sub(col - 1).max(1)));
        format!(
            "  --> line {line}, column {col}\n{pad} |\n{line} | {text}\n{pad} | {space}{carets}",
            pad = " ".repeat(gutter),
            text = line_text,
            space = " ".repeat(col - 1),
        )
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}
