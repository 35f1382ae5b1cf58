//! Aggregate call parsing: `count/sum/avg/min/max/any/all(...)`.
//!
//! Inside the parentheses the source is one of an inline `from` clause, a
//! `group("Name")` reference, or a bare identifier. After an inline `from`,
//! a comma continues the relation list only when the following identifier
//! is itself followed by a modifier keyword; otherwise the comma introduces
//! the property/condition argument. This look-ahead is the only
//! disambiguation the parser does.

use super::ast::{AggregateExpr, AggregateFunc, AggregateSource, Expr, ExprKind};
use super::{ParseError, Parser};
use crate::lexer::{Keyword, TokenKind};
use crate::span::Span;

impl Parser {
    /// Called with the function name and `(` already consumed.
    pub(crate) fn parse_aggregate_call(
        &mut self,
        func: AggregateFunc,
        name_span: Span,
    ) -> Result<Expr, ParseError> {
        let source = self.parse_aggregate_source()?;

        let mut property = None;
        let mut condition = None;
        if self.eat_kind(TokenKind::Comma) {
            if func.needs_property() {
                property = Some(self.parse_property_path()?);
            } else if func.needs_condition() {
                condition = Some(self.parse_expression()?);
            } else {
                // count(...) takes no extra argument; parse it anyway and
                // let the executor warn instead of failing the query.
                let extra = self.parse_expression()?;
                match extra.kind {
                    ExprKind::Property(path) => property = Some(path),
                    _ => condition = Some(extra),
                }
            }
        }

        let close = self.expect_kind(TokenKind::RParen)?;
        let span = name_span.merge(close.span);
        Ok(Expr::new(
            ExprKind::Aggregate(Box::new(AggregateExpr {
                func,
                source,
                property,
                condition,
                span,
            })),
            span,
        ))
    }

    fn parse_aggregate_source(&mut self) -> Result<AggregateSource, ParseError> {
        if self.eat_keyword(Keyword::From) {
            let mut relations = vec![self.parse_relation_spec()?];
            while self.comma_continues_relation_list() {
                self.advance(); // the comma
                relations.push(self.parse_relation_spec()?);
            }
            return Ok(AggregateSource::Relations(relations));
        }

        if self.eat_keyword(Keyword::Group) {
            self.expect_kind(TokenKind::LParen)?;
            let (name, _) = self.expect_string()?;
            self.expect_kind(TokenKind::RParen)?;
            return Ok(AggregateSource::Group(name));
        }

        if matches!(self.peek().kind, TokenKind::Ident) {
            let (name, _) = self.expect_ident()?;
            return Ok(AggregateSource::Named(name));
        }

        Err(self.error_expected("aggregate source (`from ...`, `group(\"...\")`, or identifier)"))
    }

    /// After a relation spec: does the upcoming comma introduce another
    /// relation spec (identifier followed by a modifier keyword) rather
    /// than the property/condition argument?
    fn comma_continues_relation_list(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Comma)
            && matches!(self.peek_at(1).kind, TokenKind::Ident)
            && matches!(
                self.peek_at(2).kind,
                TokenKind::Keyword(Keyword::Depth) | TokenKind::Keyword(Keyword::Extend)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::super::ast::{ComparisonOp, Depth};
    use super::*;
    use crate::lexer::tokenize;

    fn parse_expr(source: &str) -> Expr {
        let mut parser = Parser::new(tokenize(source).unwrap());
        let expr = parser.parse_expression().unwrap();
        assert!(parser.at_eof(), "unconsumed input in {source:?}");
        expr
    }

    fn as_aggregate(expr: Expr) -> AggregateExpr {
        match expr.kind {
            ExprKind::Aggregate(agg) => *agg,
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn test_count_inline_from() {
        let agg = as_aggregate(parse_expr("count(from down depth 2)"));
        assert_eq!(agg.func, AggregateFunc::Count);
        match &agg.source {
            AggregateSource::Relations(specs) => {
                assert_eq!(specs.len(), 1);
                assert_eq!(specs[0].name, "down");
                assert_eq!(specs[0].depth, Depth::Limited(2));
            }
            other => panic!("expected inline from, got {other:?}"),
        }
        assert!(agg.property.is_none());
        assert!(agg.condition.is_none());
    }

    #[test]
    fn test_inline_from_two_relations_lookahead() {
        // `child depth 1` continues the relation list because `child` is
        // followed by a modifier keyword.
        let agg = as_aggregate(parse_expr("count(from down depth 1, child depth 3)"));
        match &agg.source {
            AggregateSource::Relations(specs) => {
                assert_eq!(specs.len(), 2);
                assert_eq!(specs[1].name, "child");
            }
            other => panic!("expected inline from, got {other:?}"),
        }
    }

    #[test]
    fn test_any_with_condition_after_relation_spec() {
        // `status` is not followed by a modifier keyword, so the comma
        // introduces the condition.
        let agg = as_aggregate(parse_expr(r#"any(from down depth 1, status = "done")"#));
        assert_eq!(agg.func, AggregateFunc::Any);
        match &agg.source {
            AggregateSource::Relations(specs) => assert_eq!(specs.len(), 1),
            other => panic!("expected inline from, got {other:?}"),
        }
        let condition = agg.condition.expect("condition parsed");
        assert!(matches!(
            condition.kind,
            ExprKind::Comparison { op: ComparisonOp::Eq, .. }
        ));
    }

    #[test]
    fn test_sum_with_property() {
        let agg = as_aggregate(parse_expr("sum(from down, estimate.hours)"));
        assert_eq!(agg.func, AggregateFunc::Sum);
        let property = agg.property.expect("property parsed");
        assert_eq!(property.joined(), "estimate.hours");
    }

    #[test]
    fn test_group_source() {
        let agg = as_aggregate(parse_expr(r#"count(group("Subtasks"))"#));
        assert_eq!(agg.source, AggregateSource::Group("Subtasks".into()));
    }

    #[test]
    fn test_bare_identifier_source() {
        let agg = as_aggregate(parse_expr("count(children)"));
        assert_eq!(agg.source, AggregateSource::Named("children".into()));
    }

    #[test]
    fn test_all_keyword_parses_as_aggregate() {
        let agg = as_aggregate(parse_expr(r#"all(from down, done = true)"#));
        assert_eq!(agg.func, AggregateFunc::All);
        assert!(agg.condition.is_some());
    }

    #[test]
    fn test_count_extra_argument_is_kept_for_warning() {
        let agg = as_aggregate(parse_expr("count(from down, status)"));
        assert_eq!(agg.func, AggregateFunc::Count);
        assert!(agg.property.is_some());
    }

    #[test]
    fn test_missing_source_is_an_error() {
        let mut parser = Parser::new(tokenize("count()").unwrap());
        let err = parser.parse_expression().unwrap_err();
        assert!(err.message.contains("aggregate source"), "{}", err.message);
    }
}
