//! Token vocabulary of TQL.
//!
//! The lexer turns query text into a flat list of spanned tokens ending in
//! `Eof`. Each token keeps the exact source slice it was scanned from in
//! `text`, so joining token texts reproduces the query up to whitespace.

use crate::span::Span;
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fmt;

/// A single lexed token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Exact source slice this token was scanned from (empty for `Eof`).
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Token {
            kind,
            text: text.into(),
            span,
        }
    }
}

/// Closed set of token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Unicode identifier (relation names, property names, function names).
    Ident,
    /// Reserved word, including `true` / `false` / `null`.
    Keyword(Keyword),
    /// Integer or decimal literal.
    Number(f64),
    /// Duration literal such as `7d` or `2.5w`, normalized to milliseconds.
    Duration { millis: i64 },
    /// ISO date literal `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`.
    Date(NaiveDateTime),
    /// Double-quoted string with escapes already applied.
    Str(String),

    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Dot,
    DotDot,
    Eq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    /// `=?` null-safe equality.
    NullSafeEq,
    /// `!=?` null-safe inequality.
    NullSafeNotEq,
    Bang,

    Eof,
}

impl TokenKind {
    /// Human-readable name used in "expected X, found Y" parse errors.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident => "identifier".into(),
            TokenKind::Keyword(kw) => format!("keyword `{kw}`"),
            TokenKind::Number(_) => "number".into(),
            TokenKind::Duration { .. } => "duration".into(),
            TokenKind::Date(_) => "date".into(),
            TokenKind::Str(_) => "string".into(),
            TokenKind::LParen => "`(`".into(),
            TokenKind::RParen => "`)`".into(),
            TokenKind::Comma => "`,`".into(),
            TokenKind::Plus => "`+`".into(),
            TokenKind::Minus => "`-`".into(),
            TokenKind::Dot => "`.`".into(),
            TokenKind::DotDot => "`..`".into(),
            TokenKind::Eq => "`=`".into(),
            TokenKind::NotEq => "`!=`".into(),
            TokenKind::Lt => "`<`".into(),
            TokenKind::Gt => "`>`".into(),
            TokenKind::Le => "`<=`".into(),
            TokenKind::Ge => "`>=`".into(),
            TokenKind::NullSafeEq => "`=?`".into(),
            TokenKind::NullSafeNotEq => "`!=?`".into(),
            TokenKind::Bang => "`!`".into(),
            TokenKind::Eof => "end of input".into(),
        }
    }
}

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Group,
    From,
    Depth,
    Unlimited,
    Extend,
    Flatten,
    Prune,
    Where,
    When,
    Sort,
    By,
    Chain,
    Asc,
    Desc,
    Display,
    All,
    And,
    Or,
    Not,
    In,
    True,
    False,
    Null,
    Today,
    Yesterday,
    Tomorrow,
    StartOfWeek,
    EndOfWeek,
}

impl Keyword {
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Group => "group",
            Keyword::From => "from",
            Keyword::Depth => "depth",
            Keyword::Unlimited => "unlimited",
            Keyword::Extend => "extend",
            Keyword::Flatten => "flatten",
            Keyword::Prune => "prune",
            Keyword::Where => "where",
            Keyword::When => "when",
            Keyword::Sort => "sort",
            Keyword::By => "by",
            Keyword::Chain => "chain",
            Keyword::Asc => "asc",
            Keyword::Desc => "desc",
            Keyword::Display => "display",
            Keyword::All => "all",
            Keyword::And => "and",
            Keyword::Or => "or",
            Keyword::Not => "not",
            Keyword::In => "in",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Today => "today",
            Keyword::Yesterday => "yesterday",
            Keyword::Tomorrow => "tomorrow",
            Keyword::StartOfWeek => "startOfWeek",
            Keyword::EndOfWeek => "endOfWeek",
        }
    }

    /// Relative-date keywords double as date expressions.
    pub fn is_relative_date(&self) -> bool {
        matches!(
            self,
            Keyword::Today
                | Keyword::Yesterday
                | Keyword::Tomorrow
                | Keyword::StartOfWeek
                | Keyword::EndOfWeek
        )
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Static keyword table; identifier lookups are exact-case.
lazy_static::lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, Keyword> = {
        let mut m = HashMap::new();
        for kw in [
            Keyword::Group, Keyword::From, Keyword::Depth, Keyword::Unlimited,
            Keyword::Extend, Keyword::Flatten, Keyword::Prune, Keyword::Where,
            Keyword::When, Keyword::Sort, Keyword::By, Keyword::Chain,
            Keyword::Asc, Keyword::Desc, Keyword::Display, Keyword::All,
            Keyword::And, Keyword::Or, Keyword::Not, Keyword::In,
            Keyword::True, Keyword::False, Keyword::Null, Keyword::Today,
            Keyword::Yesterday, Keyword::Tomorrow, Keyword::StartOfWeek,
            Keyword::EndOfWeek,
        ] {
            m.insert(kw.as_str(), kw);
        }
        m
    };
}

/// Look up an identifier against the keyword table.
pub fn lookup_keyword(ident: &str) -> Option<Keyword> {
    KEYWORDS.get(ident).copied()
}
