//! Static validation of parsed queries against the host's catalog.
//!
//! Checks relation and group references, builtin names and arities,
//! aggregate well-formedness, and the handful of literal type errors that
//! can be caught without executing. All errors are collected and reported
//! together; execution is never attempted on a query that failed here.

pub mod errors;

pub use errors::{ValidationCode, ValidationError, ValidationErrors};

use crate::functions;
use crate::parser::ast::{
    AggregateExpr, AggregateSource, Expr, ExprKind, Literal, PropertyPath, Query, RelationSpec,
    SortKeyKind,
};

/// The slice of the host's catalog the validator needs.
pub trait ValidationCatalog {
    fn has_relation(&self, name: &str) -> bool;
    fn relation_names(&self) -> Vec<String>;
    fn has_group(&self, name: &str) -> bool;
    fn group_names(&self) -> Vec<String>;
}

/// Validate a parsed query. Returns all problems at once.
pub fn validate(query: &Query, catalog: &dyn ValidationCatalog) -> Result<(), ValidationErrors> {
    let mut validator = Validator {
        catalog,
        errors: Vec::new(),
    };
    validator.check_query(query);
    if validator.errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors {
            errors: validator.errors,
        })
    }
}

struct Validator<'a> {
    catalog: &'a dyn ValidationCatalog,
    errors: Vec<ValidationError>,
}

impl Validator<'_> {
    fn push(&mut self, code: ValidationCode, message: String, span: crate::span::Span) {
        self.errors.push(ValidationError::new(code, message, span));
    }

    fn check_query(&mut self, query: &Query) {
        for spec in &query.from.relations {
            self.check_relation_spec(spec);
        }
        if let Some(expr) = &query.prune {
            self.check_expr(expr);
        }
        if let Some(expr) = &query.where_clause {
            self.check_expr(expr);
        }
        if let Some(expr) = &query.when {
            self.check_expr(expr);
        }
        if let Some(sort) = &query.sort {
            for key in &sort.keys {
                if let SortKeyKind::Property(path) = &key.key {
                    self.check_property_path(path);
                }
            }
        }
        if let Some(display) = &query.display {
            for path in &display.properties {
                self.check_property_path(path);
            }
        }
    }

    fn check_relation_spec(&mut self, spec: &RelationSpec) {
        if !self.catalog.has_relation(&spec.name) {
            self.push(
                ValidationCode::UnknownRelation,
                format!("unknown relation `{}`", spec.name),
                spec.span,
            );
        }
        if let Some(group) = &spec.extend {
            if !self.catalog.has_group(group) {
                self.push(
                    ValidationCode::UnknownGroup,
                    format!("`extend` references unknown group `{group}`"),
                    spec.span,
                );
            }
        }
    }

    fn check_property_path(&mut self, path: &PropertyPath) {
        if path.segments.is_empty() || path.segments.iter().any(String::is_empty) {
            self.push(
                ValidationCode::TypeMismatch,
                "property path must be non-empty".to_string(),
                path.span,
            );
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) => {}
            ExprKind::Property(path) => self.check_property_path(path),
            ExprKind::Logical { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            ExprKind::Comparison { lhs, rhs, .. } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
            }
            ExprKind::Arith { op, lhs, rhs } => {
                self.check_expr(lhs);
                self.check_expr(rhs);
                self.check_arith_literals(*op, lhs, rhs, expr);
            }
            ExprKind::Not(inner) => self.check_expr(inner),
            ExprKind::In { item, collection } => {
                self.check_expr(item);
                self.check_expr(collection);
            }
            ExprKind::Range { item, lower, upper } => {
                self.check_expr(item);
                self.check_expr(lower);
                self.check_expr(upper);
                self.check_range_bound(lower);
                self.check_range_bound(upper);
            }
            ExprKind::Call { name, args } => {
                self.check_call(name, args, expr);
                for arg in args {
                    self.check_expr(arg);
                }
            }
            ExprKind::Aggregate(aggregate) => self.check_aggregate(aggregate),
            ExprKind::DateOffset { base, .. } => self.check_expr(base),
        }
    }

    /// Arithmetic on boolean or null literals can never succeed.
    fn check_arith_literals(
        &mut self,
        op: crate::parser::ast::ArithOp,
        lhs: &Expr,
        rhs: &Expr,
        whole: &Expr,
    ) {
        let bad = |e: &Expr| {
            matches!(
                e.kind,
                ExprKind::Literal(Literal::Bool(_)) | ExprKind::Literal(Literal::Null)
            )
        };
        if bad(lhs) || bad(rhs) {
            let op = match op {
                crate::parser::ast::ArithOp::Add => "+",
                crate::parser::ast::ArithOp::Sub => "-",
            };
            self.push(
                ValidationCode::TypeMismatch,
                format!("`{op}` is not defined for boolean or null literals"),
                whole.span,
            );
        }
    }

    /// Range bounds must be orderable; boolean/null literals are not.
    fn check_range_bound(&mut self, bound: &Expr) {
        if matches!(
            bound.kind,
            ExprKind::Literal(Literal::Bool(_)) | ExprKind::Literal(Literal::Null)
        ) {
            self.push(
                ValidationCode::InvalidRangeType,
                "range bounds must be comparable values".to_string(),
                bound.span,
            );
        }
    }

    fn check_call(&mut self, name: &str, args: &[Expr], expr: &Expr) {
        match functions::lookup(name) {
            None => {
                self.push(
                    ValidationCode::UnknownFunction,
                    format!("unknown function `{name}`"),
                    expr.span,
                );
            }
            Some(builtin) => {
                if args.len() < builtin.min_args || args.len() > builtin.max_args {
                    let expected = if builtin.min_args == builtin.max_args {
                        builtin.min_args.to_string()
                    } else if builtin.max_args == usize::MAX {
                        format!("at least {}", builtin.min_args)
                    } else {
                        format!("{} to {}", builtin.min_args, builtin.max_args)
                    };
                    self.push(
                        ValidationCode::InvalidArity,
                        format!(
                            "`{name}` expects {expected} argument(s), got {}",
                            args.len()
                        ),
                        expr.span,
                    );
                }
            }
        }
    }

    fn check_aggregate(&mut self, aggregate: &AggregateExpr) {
        match &aggregate.source {
            AggregateSource::Group(name) => {
                if !self.catalog.has_group(name) {
                    self.push(
                        ValidationCode::UnknownGroup,
                        format!("aggregate references unknown group `{name}`"),
                        aggregate.span,
                    );
                }
            }
            AggregateSource::Relations(specs) => {
                for spec in specs {
                    self.check_relation_spec(spec);
                }
            }
            AggregateSource::Named(name) => {
                let is_group = self.catalog.has_group(name);
                let is_relation = self.catalog.has_relation(name);
                if is_group && is_relation {
                    self.push(
                        ValidationCode::AmbiguousIdentifier,
                        format!("`{name}` names both a group and a relation; use `group(\"{name}\")` or `from {name}`"),
                        aggregate.span,
                    );
                } else if !is_group && !is_relation {
                    self.push(
                        ValidationCode::UnknownIdentifier,
                        format!("`{name}` is neither a group nor a relation"),
                        aggregate.span,
                    );
                }
            }
        }

        if aggregate.func.needs_property() && aggregate.property.is_none() {
            self.push(
                ValidationCode::InvalidArity,
                format!("`{}` requires a property argument", aggregate.func),
                aggregate.span,
            );
        }
        if aggregate.func.needs_condition() && aggregate.condition.is_none() {
            self.push(
                ValidationCode::InvalidArity,
                format!("`{}` requires a condition argument", aggregate.func),
                aggregate.span,
            );
        }

        if let Some(path) = &aggregate.property {
            self.check_property_path(path);
        }
        if let Some(condition) = &aggregate.condition {
            self.check_expr(condition);
        }
    }
}
