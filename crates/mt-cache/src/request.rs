//! The cached-request abstraction and its expiry policy.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use mt_core::TimeRange;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::RequestError;

/// An expensive, deterministic computation whose result may be memoized.
///
/// Requests are immutable values. Two requests with the same
/// [`cache_key`](Self::cache_key) must compute the same result.
pub trait CachedRequest: Clone + Send + Sync + 'static {
    type Output: Serialize + DeserializeOwned + Send + 'static;

    /// Deterministic key derived from the request parameters.
    fn cache_key(&self) -> String;

    fn compute(&self, ctx: &RequestContext) -> Result<Self::Output, RequestError>;

    /// Runs [`compute`](Self::compute) on the blocking thread pool.
    fn compute_async(
        &self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<Self::Output, RequestError>> + Send {
        let request = self.clone();
        let ctx = ctx.clone();
        async move { tokio::task::spawn_blocking(move || request.compute(&ctx)).await? }
    }

    /// Returns false to reject a cached value and recompute.
    fn is_cache_valid(&self, _cached: &Self::Output) -> bool {
        true
    }

    /// How long a freshly computed value stays valid.
    fn cache_timeout(&self, ctx: &RequestContext, computed: &Self::Output) -> Duration;
}

/// Where a queried range lies relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeRecency {
    /// Ended before the current plant day started.
    Past,
    /// Ended earlier during the current plant day.
    Today,
    /// Includes now.
    Current,
    /// Starts at or after now.
    Future,
}

impl RangeRecency {
    pub fn classify(range: &TimeRange, now: DateTime<Utc>, start_of_today: DateTime<Utc>) -> Self {
        if range.upper().is_some_and(|upper| upper <= start_of_today) {
            return Self::Past;
        }
        if range.contains(now) {
            return Self::Current;
        }
        if range.upper().is_some_and(|upper| upper <= now) {
            return Self::Today;
        }
        Self::Future
    }
}

/// Cache lifetimes in seconds per [`RangeRecency`], plus one for mode hierarchy lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TtlPolicy {
    pub past: u64,
    pub today: u64,
    pub current: u64,
    pub future: u64,
    pub hierarchy: u64,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            past: 24 * 60 * 60,
            today: 10 * 60,
            current: 10,
            future: 60,
            hierarchy: 24 * 60 * 60,
        }
    }
}

impl TtlPolicy {
    pub fn for_recency(&self, recency: RangeRecency) -> Duration {
        let seconds = match recency {
            RangeRecency::Past => self.past,
            RangeRecency::Today => self.today,
            RangeRecency::Current => self.current,
            RangeRecency::Future => self.future,
        };
        seconds_to_duration(seconds)
    }

    /// The lifetime of a value computed over `range` at the context's now.
    pub fn for_range(&self, range: &TimeRange, ctx: &RequestContext) -> Duration {
        let recency = RangeRecency::classify(range, ctx.now(), ctx.start_of_today());
        self.for_recency(recency)
    }

    pub fn hierarchy(&self) -> Duration {
        seconds_to_duration(self.hierarchy)
    }
}

fn seconds_to_duration(seconds: u64) -> Duration {
    i64::try_from(seconds)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}
