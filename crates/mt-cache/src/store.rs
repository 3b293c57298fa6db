//! Cache stores holding type-erased request results.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use lru::LruCache;
use mt_core::Clock;
use serde_json::Value;

/// A stored value with the moment it was computed and how long it stays valid.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult<T> {
    pub value: T,
    pub computed_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl<T> CachedResult<T> {
    /// Returns true once `ttl` has passed since `computed_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.computed_at
            .checked_add_signed(self.ttl)
            .is_some_and(|expires| expires <= now)
    }
}

/// Key/value storage for request results.
///
/// Stores decide eviction. Concurrent puts for the same key are last-write-wins.
pub trait CacheStore: Send + Sync {
    /// The unexpired value under `key`.
    fn get(&self, key: &str) -> Option<CachedResult<Value>>;

    fn put(&self, key: &str, value: Value, ttl: Duration);

    fn remove(&self, key: &str);
}

/// Bounded in-memory store evicting the least recently used entry.
pub struct LruCacheStore {
    entries: Mutex<LruCache<String, CachedResult<Value>>>,
    clock: Arc<dyn Clock>,
}

impl LruCacheStore {
    /// Creates a store holding at most `capacity` entries (at least one).
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or_else(|| {
            tracing::warn!("cache capacity 0 raised to 1");
            NonZeroUsize::MIN
        });
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            clock,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, CachedResult<Value>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for LruCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        f.debug_struct("LruCacheStore")
            .field("len", &entries.len())
            .field("capacity", &entries.cap())
            .finish_non_exhaustive()
    }
}

impl CacheStore for LruCacheStore {
    fn get(&self, key: &str) -> Option<CachedResult<Value>> {
        let now = self.clock.now();
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.is_expired(now) {
            tracing::debug!(key, computed_at = %entry.computed_at, "cache entry expired");
            entries.pop(key);
            return None;
        }
        Some(entry.clone())
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        let entry = CachedResult {
            value,
            computed_at: self.clock.now(),
            ttl,
        };
        if let Some((evicted, _)) = self.lock().push(key.to_string(), entry) {
            if evicted != key {
                tracing::debug!(key = %evicted, "cache entry evicted");
            }
        }
    }

    fn remove(&self, key: &str) {
        self.lock().pop(key);
    }
}
