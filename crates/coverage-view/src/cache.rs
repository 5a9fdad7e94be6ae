//! LRU cache for opened composition sessions.
//!
//! Entries carry the version token of the source set they were opened
//! against; a lookup whose current token differs gets a miss and the stale
//! entry is dropped. There is no push-based invalidation to go missing.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::handler::{CompositionHandler, SourceSetToken};

/// Statistics about the session cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CachedSession {
    session: Arc<CompositionHandler>,
    token: SourceSetToken,
}

/// LRU cache of opened sessions, keyed by view name.
pub struct SessionCache {
    cache: LruCache<String, CachedSession>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl SessionCache {
    /// Create a cache holding up to `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity.max(1)).unwrap()),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Look up a session by view name, requiring its source-set token to
    /// match `current`. A stale entry counts as a miss and is dropped.
    pub fn get(&mut self, view: &str, current: &SourceSetToken) -> Option<Arc<CompositionHandler>> {
        match self.cache.get(view) {
            Some(entry) if &entry.token == current => {
                self.hits += 1;
                Some(entry.session.clone())
            }
            Some(_) => {
                debug!(view, "session cache entry is stale, dropping");
                self.cache.pop(view);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Insert an opened session, keyed by its view name and stamped with
    /// its current source-set token.
    pub fn insert(&mut self, session: Arc<CompositionHandler>) {
        let key = session.definition().name().to_string();
        let token = session.source_set_token();

        if self.cache.len() == self.cache.cap().get() && !self.cache.contains(&key) {
            self.evictions += 1;
        }
        self.cache.put(key, CachedSession { session, token });
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
            evictions: self.evictions,
        }
    }

    /// Drop every cached session.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
