//! TrailQL - a query language for labeled note graphs
//!
//! This crate implements TQL (Trail Query Language): small declarative
//! queries that name a group, traverse out from an active note along named
//! relations, filter and sort what they reach, and project properties for
//! display.
//!
//! ```text
//! group "Subtasks"
//! from down depth 2
//! where exists(status) and status != "archived"
//! sort by chain, priority desc
//! display status, due
//! ```
//!
//! The pipeline has four stages, each usable on its own:
//! - [`parse`] - source text to a typed AST (lexer + parser)
//! - [`validate`] - static checks against the host's relation/group catalog
//! - [`execute`] - traversal, filtering, aggregates, chain-aware sorting,
//!   display projection, all through the host's [`engine::QueryContext`]
//! - [`run`] - the three stages chained
//!
//! [`cache::QueryCache`] wraps parsing and execution results in a
//! two-tier LRU with per-file invalidation. The crate is a pure library:
//! no I/O, no threads, no global state outside the optional cache
//! singleton.

pub mod cache;
pub mod engine;
pub mod errors;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod validator;
pub mod value;

pub use cache::{query_cache, CacheConfig, QueryCache};
pub use engine::{execute, QueryContext, QueryResult, QueryResultNode};
pub use errors::TrailQlError;
pub use parser::ast::Query;
pub use validator::{ValidationCatalog, ValidationErrors};
pub use value::Value;

/// Lex and parse a query. No catalog checks happen here.
pub fn parse(source: &str) -> Result<Query, TrailQlError> {
    let tokens = lexer::tokenize(source)?;
    Ok(parser::parse_query(tokens)?)
}

/// Validate a parsed query against the host's catalog. All problems are
/// reported together.
pub fn validate(query: &Query, catalog: &dyn ValidationCatalog) -> Result<(), ValidationErrors> {
    validator::validate(query, catalog)
}

/// Parse, validate, and execute in one call.
pub fn run(
    source: &str,
    catalog: &dyn ValidationCatalog,
    ctx: &dyn QueryContext,
) -> Result<QueryResult, TrailQlError> {
    let query = parse(source)?;
    validate(&query, catalog)?;
    Ok(execute(&query, ctx)?)
}
