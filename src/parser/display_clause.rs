//! `display` clause parsing.
//!
//! ```text
//! display := "display" ("all" | propertyPath) ("," propertyPath)*
//! ```
//!
//! `all` projects every non-reserved top-level property, unioned with any
//! explicitly listed paths.

use super::ast::DisplayClause;
use super::{ParseError, Parser};
use crate::lexer::{Keyword, TokenKind};

impl Parser {
    pub(crate) fn parse_display_clause(&mut self) -> Result<DisplayClause, ParseError> {
        let start = self.expect_keyword(Keyword::Display)?.span;
        let mut span = start;

        let mut all = false;
        let mut properties = Vec::new();

        if self.eat_keyword(Keyword::All) {
            all = true;
            span = span.merge(self.tokens[self.pos - 1].span);
        } else {
            let path = self.parse_property_path()?;
            span = span.merge(path.span);
            properties.push(path);
        }

        while self.eat_kind(TokenKind::Comma) {
            let path = self.parse_property_path()?;
            span = span.merge(path.span);
            properties.push(path);
        }

        Ok(DisplayClause { all, properties, span })
    }
}
