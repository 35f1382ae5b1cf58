//! TQL parser: token stream → typed AST.
//!
//! A recursive-descent parser over the lexer's token list, with
//! precedence climbing for expressions. Clause parsers live one per file;
//! they all hang off the same token-cursor [`Parser`].

pub mod aggregate;
pub mod ast;
pub mod display_clause;
pub mod errors;
pub mod expression;
pub mod from_clause;
pub mod sort_clause;

pub use errors::ParseError;

use crate::lexer::{Keyword, Token, TokenKind};
use crate::span::Span;
use ast::Query;

/// Parse a lexed token stream into a [`Query`].
pub fn parse_query(tokens: Vec<Token>) -> Result<Query, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse_query()
}

/// Token cursor shared by all clause parsers.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "token stream must end in Eof"
        );
        Parser { tokens, pos: 0 }
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Look ahead `offset` tokens (0 = current), clamped to `Eof`.
    pub(crate) fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    pub(crate) fn peek_keyword(&self, kw: Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if *k == kw)
    }

    /// Consume the keyword if it is next; report whether it was.
    pub(crate) fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.peek_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_keyword(&mut self, kw: Keyword) -> Result<Token, ParseError> {
        if self.peek_keyword(kw) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&format!("keyword `{kw}`")))
        }
    }

    /// Consume an operator/delimiter token by exact kind.
    pub(crate) fn expect_kind(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.error_expected(&kind.describe()))
        }
    }

    pub(crate) fn eat_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<(String, Span), ParseError> {
        match &self.peek().kind {
            TokenKind::Ident => {
                let token = self.advance();
                Ok((token.text, token.span))
            }
            _ => Err(self.error_expected("identifier")),
        }
    }

    pub(crate) fn expect_string(&mut self) -> Result<(String, Span), ParseError> {
        match &self.peek().kind {
            TokenKind::Str(value) => {
                let value = value.clone();
                let token = self.advance();
                Ok((value, token.span))
            }
            _ => Err(self.error_expected("string literal")),
        }
    }

    /// Build an "expected X, found Y" error at the current token. A
    /// truncated stream produces the distinct end-of-input message.
    pub(crate) fn error_expected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        if matches!(token.kind, TokenKind::Eof) {
            ParseError::unexpected_eof(expected, token.span)
        } else {
            ParseError::expecting(
                format!("expected {expected}, found {}", token.kind.describe()),
                expected,
                token.span,
            )
        }
    }

    /// `query := "group" string from prune? where? when? sort? display? EOF`
    fn parse_query(&mut self) -> Result<Query, ParseError> {
        let start = self.peek().span;

        self.expect_keyword(Keyword::Group)?;
        let (group, _) = self.expect_string()?;

        let from = self.parse_from_clause()?;

        let prune = if self.eat_keyword(Keyword::Prune) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let where_clause = if self.eat_keyword(Keyword::Where) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let when = if self.eat_keyword(Keyword::When) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let sort = if self.peek_keyword(Keyword::Sort) {
            Some(self.parse_sort_clause()?)
        } else {
            None
        };
        let display = if self.peek_keyword(Keyword::Display) {
            Some(self.parse_display_clause()?)
        } else {
            None
        };

        if !self.at_eof() {
            return Err(self.error_expected("end of query"));
        }
        let span = start.merge(self.peek().span);

        Ok(Query {
            group,
            from,
            prune,
            where_clause,
            when,
            sort,
            display,
            span,
        })
    }
}
