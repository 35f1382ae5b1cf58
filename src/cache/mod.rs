//! Two-tier query/result cache with LRU eviction.
//!
//! - **Parsed-query tier**: raw query string → validated AST. Parsing the
//!   same query text twice is pure waste; the host re-renders views far
//!   more often than users edit queries.
//! - **Result tier**: `(query string, active path)` → executed result,
//!   with a TTL and fine-grained invalidation. Each entry remembers every
//!   path that appears in its result tree, so one file change evicts
//!   exactly the results that could have seen it.
//!
//! Both tiers live behind one mutex; the cache is the only mutable state
//! in the crate. A process-wide instance is available via [`query_cache`],
//! constructed lazily from environment overrides.

use crate::engine::result::QueryResult;
use crate::errors::TrailQlError;
use crate::lexer::tokenize;
use crate::parser::{ast::Query, parse_query};
use crate::validator::{validate, ValidationCatalog};
use lru::LruCache;
use regex::Regex;
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Cache sizing and TTL knobs.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Capacity of the parsed-query tier.
    pub max_query_entries: usize,
    /// Capacity of the result tier.
    pub max_result_entries: usize,
    /// How long a cached result stays servable.
    pub result_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            max_query_entries: 100,
            max_result_entries: 50,
            result_ttl: Duration::from_millis(5000),
        }
    }
}

impl CacheConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults: `TRAILQL_CACHE_MAX_QUERIES`, `TRAILQL_CACHE_MAX_RESULTS`,
    /// `TRAILQL_CACHE_RESULT_TTL_MS`.
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();
        fn read<T: std::str::FromStr>(name: &str) -> Option<T> {
            std::env::var(name).ok().and_then(|v| v.parse().ok())
        }
        CacheConfig {
            max_query_entries: read("TRAILQL_CACHE_MAX_QUERIES")
                .unwrap_or(defaults.max_query_entries),
            max_result_entries: read("TRAILQL_CACHE_MAX_RESULTS")
                .unwrap_or(defaults.max_result_entries),
            result_ttl: read("TRAILQL_CACHE_RESULT_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.result_ttl),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResultKey {
    query: String,
    active_path: String,
}

struct CachedResult {
    result: Arc<QueryResult>,
    /// Every path in the result tree plus the active path.
    included_paths: HashSet<String>,
    stored_at: Instant,
}

struct CacheInner {
    queries: LruCache<String, Arc<Query>>,
    results: LruCache<ResultKey, CachedResult>,
}

/// Counters exposed by [`QueryCache::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub query_hits: u64,
    pub query_misses: u64,
    pub result_hits: u64,
    pub result_misses: u64,
    pub query_entries: usize,
    pub result_entries: usize,
}

pub struct QueryCache {
    inner: Mutex<CacheInner>,
    config: CacheConfig,
    query_hits: AtomicU64,
    query_misses: AtomicU64,
    result_hits: AtomicU64,
    result_misses: AtomicU64,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let queries = NonZeroUsize::new(config.max_query_entries.max(1)).expect("max(1)");
        let results = NonZeroUsize::new(config.max_result_entries.max(1)).expect("max(1)");
        QueryCache {
            inner: Mutex::new(CacheInner {
                queries: LruCache::new(queries),
                results: LruCache::new(results),
            }),
            config,
            query_hits: AtomicU64::new(0),
            query_misses: AtomicU64::new(0),
            result_hits: AtomicU64::new(0),
            result_misses: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    pub fn from_env() -> Self {
        Self::new(CacheConfig::from_env())
    }

    /// Parse (and validate) through the cache. A hit promotes the entry to
    /// most-recently-used; a miss parses, validates, and stores.
    pub fn parse_query(
        &self,
        source: &str,
        catalog: &dyn ValidationCatalog,
    ) -> Result<Arc<Query>, TrailQlError> {
        {
            let mut inner = self.inner.lock().expect("cache mutex poisoned");
            if let Some(query) = inner.queries.get(source) {
                self.query_hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Arc::clone(query));
            }
        }
        self.query_misses.fetch_add(1, Ordering::Relaxed);

        let query = parse_query(tokenize(source)?)?;
        validate(&query, catalog)?;
        let query = Arc::new(query);

        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.queries.put(source.to_string(), Arc::clone(&query));
        Ok(query)
    }

    /// Fetch a cached result if present and not expired.
    pub fn get_result(&self, source: &str, active_path: &str) -> Option<Arc<QueryResult>> {
        let key = ResultKey {
            query: source.to_string(),
            active_path: active_path.to_string(),
        };
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let expired = match inner.results.get(&key) {
            None => {
                self.result_misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Some(entry) => entry.stored_at.elapsed() > self.config.result_ttl,
        };
        if expired {
            inner.results.pop(&key);
            self.result_misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        self.result_hits.fetch_add(1, Ordering::Relaxed);
        inner
            .results
            .get(&key)
            .map(|entry| Arc::clone(&entry.result))
    }

    /// Store an execution result, recording every path the result tree
    /// touches for later invalidation.
    pub fn set_result(&self, source: &str, active_path: &str, result: Arc<QueryResult>) {
        let key = ResultKey {
            query: source.to_string(),
            active_path: active_path.to_string(),
        };
        let mut included_paths = result.collect_paths();
        included_paths.insert(active_path.to_string());
        let entry = CachedResult {
            result,
            included_paths,
            stored_at: Instant::now(),
        };
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.results.put(key, entry);
    }

    /// Drop every result whose active path is `path` or whose result tree
    /// included `path`.
    pub fn invalidate_file(&self, path: &str) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let stale: Vec<ResultKey> = inner
            .results
            .iter()
            .filter(|(key, entry)| {
                key.active_path == path || entry.included_paths.contains(path)
            })
            .map(|(key, _)| key.clone())
            .collect();
        if !stale.is_empty() {
            log::debug!("invalidating {} cached result(s) for `{path}`", stale.len());
        }
        for key in stale {
            inner.results.pop(&key);
        }
    }

    /// Drop every result whose active path matches the pattern.
    pub fn invalidate_pattern(&self, pattern: &Regex) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        let stale: Vec<ResultKey> = inner
            .results
            .iter()
            .filter(|(key, _)| pattern.is_match(&key.active_path))
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            inner.results.pop(&key);
        }
    }

    pub fn invalidate_all_results(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.results.clear();
    }

    /// Drop both tiers.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().expect("cache mutex poisoned");
        inner.queries.clear();
        inner.results.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().expect("cache mutex poisoned");
        CacheStats {
            query_hits: self.query_hits.load(Ordering::Relaxed),
            query_misses: self.query_misses.load(Ordering::Relaxed),
            result_hits: self.result_hits.load(Ordering::Relaxed),
            result_misses: self.result_misses.load(Ordering::Relaxed),
            query_entries: inner.queries.len(),
            result_entries: inner.results.len(),
        }
    }
}

lazy_static::lazy_static! {
    static ref GLOBAL_CACHE: QueryCache = QueryCache::from_env();
}

/// The process-wide cache instance, constructed lazily on first use.
pub fn query_cache() -> &'static QueryCache {
    &GLOBAL_CACHE
}
