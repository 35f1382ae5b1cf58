//! Expression parsing with precedence climbing.
//!
//! Precedence, low to high: `or`, `and`, `not`, comparison (including `in`
//! and ranges), additive `+ -`, primary. All binary operators associate
//! left; a comparison takes at most one operator (no `a < b < c`).

use super::ast::{
    ArithOp, ComparisonOp, Expr, ExprKind, Literal, LogicalOp, PropertyPath, RelativeDate,
};
use super::{ParseError, Parser};
use crate::lexer::{Keyword, TokenKind};

impl Parser {
    pub(crate) fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) {
            let rhs = self.parse_and()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::Or,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_not()?;
        while self.eat_keyword(Keyword::And) {
            let rhs = self.parse_not()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Logical {
                    op: LogicalOp::And,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek();
        let is_not = matches!(&token.kind, TokenKind::Keyword(Keyword::Not))
            || matches!(&token.kind, TokenKind::Bang);
        if is_not {
            let start = self.advance().span;
            let operand = self.parse_not()?;
            let span = start.merge(operand.span);
            return Ok(Expr::new(ExprKind::Not(Box::new(operand)), span));
        }
        self.parse_comparison()
    }

    /// `compare := arith (cmp arith | "in" (arith | arith ".." arith))?`
    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_additive()?;

        if let Some(op) = comparison_op(&self.peek().kind) {
            self.advance();
            let rhs = self.parse_additive()?;
            let span = lhs.span.merge(rhs.span);
            return Ok(Expr::new(
                ExprKind::Comparison {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            ));
        }

        if self.eat_keyword(Keyword::In) {
            let first = self.parse_additive()?;
            if self.eat_kind(TokenKind::DotDot) {
                let upper = self.parse_additive()?;
                let span = lhs.span.merge(upper.span);
                return Ok(Expr::new(
                    ExprKind::Range {
                        item: Box::new(lhs),
                        lower: Box::new(first),
                        upper: Box::new(upper),
                    },
                    span,
                ));
            }
            let span = lhs.span.merge(first.span);
            return Ok(Expr::new(
                ExprKind::In {
                    item: Box::new(lhs),
                    collection: Box::new(first),
                },
                span,
            ));
        }

        Ok(lhs)
    }

    /// Additive chain. A duration on the right-hand side of `+`/`-` with a
    /// date-shaped left side folds into a date offset instead of generic
    /// arithmetic.
    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_primary()?;
        loop {
            let op = match &self.peek().kind {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_primary()?;
            let span = lhs.span.merge(rhs.span);
            lhs = match rhs.kind {
                ExprKind::Literal(Literal::Duration { millis }) if is_date_base(&lhs) => {
                    Expr::new(
                        ExprKind::DateOffset {
                            base: Box::new(lhs),
                            op,
                            duration_millis: millis,
                        },
                        span,
                    )
                }
                _ => Expr::new(
                    ExprKind::Arith {
                        op,
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                    span,
                ),
            };
        }
        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                let close = self.expect_kind(TokenKind::RParen)?;
                Ok(Expr::new(inner.kind, token.span.merge(close.span)))
            }
            TokenKind::Number(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Number(*value)), token.span))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::String(value.clone())),
                    token.span,
                ))
            }
            TokenKind::Duration { millis } => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Literal(Literal::Duration { millis: *millis }),
                    token.span,
                ))
            }
            TokenKind::Date(date) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Date(*date)), token.span))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Bool(true)), token.span))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Bool(false)), token.span))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Null), token.span))
            }
            TokenKind::Keyword(kw) if kw.is_relative_date() => {
                self.advance();
                let relative = match kw {
                    Keyword::Today => RelativeDate::Today,
                    Keyword::Yesterday => RelativeDate::Yesterday,
                    Keyword::Tomorrow => RelativeDate::Tomorrow,
                    Keyword::StartOfWeek => RelativeDate::StartOfWeek,
                    Keyword::EndOfWeek => RelativeDate::EndOfWeek,
                    _ => unreachable!("is_relative_date covers exactly these"),
                };
                Ok(Expr::new(
                    ExprKind::Literal(Literal::RelativeDate(relative)),
                    token.span,
                ))
            }
            // `all(...)` is an aggregate call even though `all` is a keyword.
            TokenKind::Keyword(Keyword::All)
                if matches!(self.peek_at(1).kind, TokenKind::LParen) =>
            {
                self.advance();
                self.advance();
                self.parse_aggregate_call(super::ast::AggregateFunc::All, token.span)
            }
            TokenKind::Ident => {
                if matches!(self.peek_at(1).kind, TokenKind::LParen) {
                    self.advance();
                    self.advance();
                    if let Some(func) = super::ast::AggregateFunc::from_name(&token.text) {
                        self.parse_aggregate_call(func, token.span)
                    } else {
                        self.parse_function_call(token.text.clone(), token.span)
                    }
                } else {
                    let path = self.parse_property_path()?;
                    let span = path.span;
                    Ok(Expr::new(ExprKind::Property(path), span))
                }
            }
            _ => Err(self.error_expected("expression")),
        }
    }

    fn parse_function_call(
        &mut self,
        name: String,
        name_span: crate::span::Span,
    ) -> Result<Expr, ParseError> {
        let mut args = Vec::new();
        if !matches!(self.peek().kind, TokenKind::RParen) {
            args.push(self.parse_expression()?);
            while self.eat_kind(TokenKind::Comma) {
                args.push(self.parse_expression()?);
            }
        }
        let close = self.expect_kind(TokenKind::RParen)?;
        Ok(Expr::new(
            ExprKind::Call { name, args },
            name_span.merge(close.span),
        ))
    }

    /// `ident ("." ident)*`
    pub(crate) fn parse_property_path(&mut self) -> Result<PropertyPath, ParseError> {
        let (first, first_span) = self.expect_ident()?;
        let mut segments = vec![first];
        let mut span = first_span;
        while matches!(self.peek().kind, TokenKind::Dot)
            && matches!(self.peek_at(1).kind, TokenKind::Ident)
        {
            self.advance();
            let (segment, segment_span) = self.expect_ident()?;
            segments.push(segment);
            span = span.merge(segment_span);
        }
        Ok(PropertyPath::new(segments, span))
    }
}

fn comparison_op(kind: &TokenKind) -> Option<ComparisonOp> {
    match kind {
        TokenKind::Eq => Some(ComparisonOp::Eq),
        TokenKind::NotEq => Some(ComparisonOp::NotEq),
        TokenKind::Lt => Some(ComparisonOp::Lt),
        TokenKind::Gt => Some(ComparisonOp::Gt),
        TokenKind::Le => Some(ComparisonOp::Le),
        TokenKind::Ge => Some(ComparisonOp::Ge),
        TokenKind::NullSafeEq => Some(ComparisonOp::NullSafeEq),
        TokenKind::NullSafeNotEq => Some(ComparisonOp::NullSafeNotEq),
        _ => None,
    }
}

/// Can this expression serve as the base of a date offset?
fn is_date_base(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Literal(Literal::Date(_))
            | ExprKind::Literal(Literal::RelativeDate(_))
            | ExprKind::Property(_)
            | ExprKind::DateOffset { .. }
    )
}
