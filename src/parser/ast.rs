//! Typed abstract syntax tree for TQL queries.
//!
//! The AST is fully owned: parsed queries are cached and shared between
//! executions, so nothing borrows from the source text. Every node carries
//! the span it was parsed from.

use crate::span::Span;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// A complete parsed query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    /// Label from the mandatory `group "Name"` clause. Also the reference
    /// name other queries use for `extend` and `group(...)` aggregates.
    pub group: String,
    pub from: FromClause,
    pub prune: Option<Expr>,
    pub where_clause: Option<Expr>,
    pub when: Option<Expr>,
    pub sort: Option<SortClause>,
    pub display: Option<DisplayClause>,
    pub span: Span,
}

/// `from rel [depth N|unlimited] [extend "Group"] [flatten], ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FromClause {
    pub relations: Vec<RelationSpec>,
    pub span: Span,
}

/// One relation to traverse, with its modifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationSpec {
    pub name: String,
    pub depth: Depth,
    /// Group whose `from` clause continues traversal at the leaves.
    pub extend: Option<String>,
    /// Collapse the reachable subgraph into a deduplicated depth-1 list.
    pub flatten: bool,
    pub span: Span,
}

impl RelationSpec {
    /// A bare relation with no modifiers, as used for bare-identifier
    /// aggregate sources (which traverse without a depth bound).
    pub fn unlimited(name: impl Into<String>, span: Span) -> Self {
        RelationSpec {
            name: name.into(),
            depth: Depth::Unlimited,
            extend: None,
            flatten: false,
            span,
        }
    }
}

/// Traversal depth bound. Relations traverse one step unless told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Depth {
    Limited(u32),
    Unlimited,
}

impl Default for Depth {
    fn default() -> Self {
        Depth::Limited(1)
    }
}

impl Depth {
    pub fn allows(&self, depth: u32) -> bool {
        match self {
            Depth::Limited(max) => depth <= *max,
            Depth::Unlimited => true,
        }
    }
}

/// `sort by key [asc|desc], ...`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortClause {
    pub keys: Vec<SortKey>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SortKey {
    pub key: SortKeyKind,
    pub direction: SortDirection,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SortKeyKind {
    /// Order siblings along sequential-relation chains.
    Chain,
    Property(PropertyPath),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// `display all` and/or an explicit list of property paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayClause {
    pub all: bool,
    pub properties: Vec<PropertyPath>,
    pub span: Span,
}

/// Dotted property path such as `task.status`.
///
/// Resolution prefers nested maps and falls back to a flat key equal to the
/// joined path. The `file.*` and `traversal.*` namespaces are reserved and
/// served by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyPath {
    pub segments: Vec<String>,
    pub span: Span,
}

impl PropertyPath {
    pub fn new(segments: Vec<String>, span: Span) -> Self {
        PropertyPath { segments, span }
    }

    /// The path joined with dots, used as the flat-key fallback and as the
    /// display projection key.
    pub fn joined(&self) -> String {
        self.segments.join(".")
    }

    pub fn first(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.joined())
    }
}

/// An expression node with its source span.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ExprKind {
    Literal(Literal),
    Property(PropertyPath),
    Logical {
        op: LogicalOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Comparison {
        op: ComparisonOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Arith {
        op: ArithOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Not(Box<Expr>),
    /// `item in collection` — list membership or substring test.
    In {
        item: Box<Expr>,
        collection: Box<Expr>,
    },
    /// `item in lower..upper`.
    Range {
        item: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Aggregate(Box<AggregateExpr>),
    /// A date base plus or minus a duration literal.
    DateOffset {
        base: Box<Expr>,
        op: ArithOp,
        duration_millis: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Date(NaiveDateTime),
    Duration { millis: i64 },
    RelativeDate(RelativeDate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelativeDate {
    Today,
    Yesterday,
    Tomorrow,
    StartOfWeek,
    EndOfWeek,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    /// `=?` — false instead of null-propagation when the left side is null.
    NullSafeEq,
    /// `!=?` — true instead of null-propagation when the left side is null.
    NullSafeNotEq,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ArithOp {
    Add,
    Sub,
}

/// `count/sum/avg/min/max/any/all` over a subquery from the current node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateExpr {
    pub func: AggregateFunc,
    pub source: AggregateSource,
    /// Required for `sum/avg/min/max`; ignored (with a warning) by `count`.
    pub property: Option<PropertyPath>,
    /// Required for `any/all`; ignored (with a warning) by `count`.
    pub condition: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AggregateFunc {
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Any,
    All,
}

impl AggregateFunc {
    pub fn from_name(name: &str) -> Option<AggregateFunc> {
        match name {
            "count" => Some(AggregateFunc::Count),
            "sum" => Some(AggregateFunc::Sum),
            "avg" => Some(AggregateFunc::Avg),
            "min" => Some(AggregateFunc::Min),
            "max" => Some(AggregateFunc::Max),
            "any" => Some(AggregateFunc::Any),
            "all" => Some(AggregateFunc::All),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Sum => "sum",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::Any => "any",
            AggregateFunc::All => "all",
        }
    }

    /// `sum/avg/min/max` aggregate a property value per node.
    pub fn needs_property(&self) -> bool {
        matches!(
            self,
            AggregateFunc::Sum | AggregateFunc::Avg | AggregateFunc::Min | AggregateFunc::Max
        )
    }

    /// `any/all` evaluate a condition per node.
    pub fn needs_condition(&self) -> bool {
        matches!(self, AggregateFunc::Any | AggregateFunc::All)
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where an aggregate's subquery pulls its relations from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AggregateSource {
    /// `group("Name")` — the named group's `from` clause.
    Group(String),
    /// Inline `from rel [modifiers], ...`.
    Relations(Vec<RelationSpec>),
    /// Bare identifier: a group name, or failing that a relation traversed
    /// with unlimited depth.
    Named(String),
}
