//! `from` clause parsing: an ordered, non-empty list of relation specs.
//!
//! ```text
//! from    := "from" relSpec ("," relSpec)*
//! relSpec := ident { "depth" (Number|"unlimited") | "extend" (string|ident) | "flatten" }*
//! ```
//!
//! Modifiers may appear in any order; a repeated modifier overwrites the
//! earlier one.

use super::ast::{Depth, FromClause, RelationSpec};
use super::{ParseError, Parser};
use crate::lexer::{Keyword, TokenKind};

impl Parser {
    pub(crate) fn parse_from_clause(&mut self) -> Result<FromClause, ParseError> {
        let start = self.expect_keyword(Keyword::From)?.span;

        let mut relations = vec![self.parse_relation_spec()?];
        while self.eat_kind(TokenKind::Comma) {
            relations.push(self.parse_relation_spec()?);
        }

        let span = start.merge(relations.last().expect("non-empty").span);
        Ok(FromClause { relations, span })
    }

    /// One relation plus its modifiers. Shared with inline aggregate
    /// sources (`count(from child, ...)`).
    pub(crate) fn parse_relation_spec(&mut self) -> Result<RelationSpec, ParseError> {
        let (name, name_span) = self.expect_ident()?;
        let mut spec = RelationSpec {
            name,
            depth: Depth::default(),
            extend: None,
            flatten: false,
            span: name_span,
        };

        loop {
            if self.eat_keyword(Keyword::Depth) {
                spec.depth = self.parse_depth()?;
            } else if self.eat_keyword(Keyword::Extend) {
                spec.extend = Some(self.parse_extend_target()?);
            } else if self.peek_keyword(Keyword::Flatten) {
                self.advance();
                spec.flatten = true;
            } else {
                break;
            }
            spec.span = name_span.merge(self.peek_at_prev_span());
        }

        Ok(spec)
    }

    fn parse_depth(&mut self) -> Result<Depth, ParseError> {
        if self.eat_keyword(Keyword::Unlimited) {
            return Ok(Depth::Unlimited);
        }
        match self.peek().kind {
            TokenKind::Number(value) => {
                let span = self.advance().span;
                if value.fract() != 0.0 || value < 0.0 {
                    return Err(ParseError::new(
                        format!("depth must be a non-negative integer, got `{value}`"),
                        span,
                    ));
                }
                Ok(Depth::Limited(value as u32))
            }
            _ => Err(self.error_expected("number or `unlimited`")),
        }
    }

    /// `extend` accepts a quoted group label or a bare identifier.
    fn parse_extend_target(&mut self) -> Result<String, ParseError> {
        match &self.peek().kind {
            TokenKind::Str(_) => Ok(self.expect_string()?.0),
            TokenKind::Ident => Ok(self.expect_ident()?.0),
            _ => Err(self.error_expected("group name (string or identifier)")),
        }
    }

    /// Span of the last consumed token, for extending modifier spans.
    fn peek_at_prev_span(&self) -> crate::span::Span {
        // pos points at the next token; the previous one always exists
        // because a relation spec consumes at least its name.
        self.tokens[self.pos - 1].span
    }
}
