//! `sort by` clause parsing.
//!
//! ```text
//! sort    := "sort" "by" sortKey ("," sortKey)*
//! sortKey := ("chain" | propertyPath) ("asc"|"desc")?
//! ```

use super::ast::{SortClause, SortDirection, SortKey, SortKeyKind};
use super::{ParseError, Parser};
use crate::lexer::{Keyword, TokenKind};

impl Parser {
    pub(crate) fn parse_sort_clause(&mut self) -> Result<SortClause, ParseError> {
        let start = self.expect_keyword(Keyword::Sort)?.span;
        self.expect_keyword(Keyword::By)?;

        let mut keys = vec![self.parse_sort_key()?];
        while self.eat_kind(TokenKind::Comma) {
            keys.push(self.parse_sort_key()?);
        }

        let span = start.merge(keys.last().expect("non-empty").span);
        Ok(SortClause { keys, span })
    }

    fn parse_sort_key(&mut self) -> Result<SortKey, ParseError> {
        let (key, mut span) = if self.peek_keyword(Keyword::Chain) {
            let token = self.advance();
            (SortKeyKind::Chain, token.span)
        } else if matches!(self.peek().kind, TokenKind::Ident) {
            let path = self.parse_property_path()?;
            let span = path.span;
            (SortKeyKind::Property(path), span)
        } else {
            return Err(self.error_expected("`chain` or property path"));
        };

        let direction = if self.eat_keyword(Keyword::Asc) {
            span = span.merge(self.last_span());
            SortDirection::Asc
        } else if self.eat_keyword(Keyword::Desc) {
            span = span.merge(self.last_span());
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };

        Ok(SortKey { key, direction, span })
    }

    fn last_span(&self) -> crate::span::Span {
        self.tokens[self.pos - 1].span
    }
}
