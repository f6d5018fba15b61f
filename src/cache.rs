//! Thread-local compiled-query cache.
//!
//! Caches compiled tree-sitter queries keyed by their pattern string, since
//! compilation cost dominates execution for small files. A compiled query is
//! reusable across tree revisions of the same grammar, so the cache never
//! needs version-based invalidation. Capped at 256 entries; cleared
//! wholesale when full. Compile errors are never cached.

use crate::ts::{QueryEngine, TreeSitterError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    static QUERY_CACHE: RefCell<HashMap<String, Arc<QueryEngine>>> =
        RefCell::new(HashMap::new());
}

/// Get a compiled query from cache, or compile and cache it.
pub fn get_or_compile(pattern: &str) -> Result<Arc<QueryEngine>, TreeSitterError> {
    QUERY_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();

        if let Some(engine) = cache.get(pattern) {
            return Ok(Arc::clone(engine));
        }

        // Evict all if at capacity (simple but effective for batch workloads)
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }

        let compiled = Arc::new(QueryEngine::new(pattern)?);
        cache.insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    })
}

/// Clear the query cache (mainly for testing).
pub fn clear_cache() {
    QUERY_CACHE.with(|cache| {
        cache.borrow_mut().clear();
    });
}

/// Get cache statistics for monitoring.
pub fn cache_size() -> usize {
    QUERY_CACHE.with(|cache| cache.borrow().len())
}
