//! Get-or-compute over a cache store.

use std::fmt;
use std::sync::Arc;

use chrono::Duration;

use crate::context::RequestContext;
use crate::error::RequestError;
use crate::request::CachedRequest;
use crate::store::CacheStore;

/// Serves requests from a cache store, computing and storing on a miss.
///
/// Concurrent misses for the same key each compute; the last put wins.
#[derive(Clone)]
pub struct CachedRequests {
    store: Arc<dyn CacheStore>,
    ctx: RequestContext,
}

impl CachedRequests {
    pub fn new(store: Arc<dyn CacheStore>, ctx: RequestContext) -> Self {
        Self { store, ctx }
    }

    pub const fn context(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn get<R: CachedRequest>(&self, request: &R) -> Result<R::Output, RequestError> {
        let key = request.cache_key();
        if let Some(hit) = self.lookup(request, &key) {
            return Ok(hit);
        }
        let value = request.compute(&self.ctx)?;
        self.store_value(request, &key, &value)?;
        Ok(value)
    }

    pub async fn get_async<R: CachedRequest>(
        &self,
        request: &R,
    ) -> Result<R::Output, RequestError> {
        let key = request.cache_key();
        if let Some(hit) = self.lookup(request, &key) {
            return Ok(hit);
        }
        let value = request.compute_async(&self.ctx).await?;
        self.store_value(request, &key, &value)?;
        Ok(value)
    }

    /// Drops any cached value of `request`.
    pub fn invalidate<R: CachedRequest>(&self, request: &R) {
        let key = request.cache_key();
        tracing::debug!(key = %key, "cache entry invalidated");
        self.store.remove(&key);
    }

    fn lookup<R: CachedRequest>(&self, request: &R, key: &str) -> Option<R::Output> {
        let Some(cached) = self.store.get(key) else {
            tracing::debug!(key, "cache miss");
            return None;
        };
        match serde_json::from_value::<R::Output>(cached.value) {
            Ok(value) if request.is_cache_valid(&value) => {
                tracing::debug!(key, computed_at = %cached.computed_at, "cache hit");
                Some(value)
            }
            Ok(_) => {
                tracing::debug!(key, "cached value rejected");
                self.store.remove(key);
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "dropping undecodable cached value");
                self.store.remove(key);
                None
            }
        }
    }

    fn store_value<R: CachedRequest>(
        &self,
        request: &R,
        key: &str,
        value: &R::Output,
    ) -> Result<(), RequestError> {
        if !request.is_cache_valid(value) {
            tracing::warn!(key, "computed value not cacheable");
            return Ok(());
        }
        let ttl = request.cache_timeout(&self.ctx, value);
        if ttl <= Duration::zero() {
            return Ok(());
        }
        let payload = serde_json::to_value(value).map_err(|source| RequestError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.store.put(key, payload, ttl);
        Ok(())
    }
}

impl fmt::Debug for CachedRequests {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedRequests")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
