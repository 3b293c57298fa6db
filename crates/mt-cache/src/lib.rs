//! Memoized timeline requests.
//!
//! A [`CachedRequest`] is an immutable value that computes a result from the
//! timeline collaborators in a [`RequestContext`]. [`CachedRequests`] serves it
//! from a [`CacheStore`], picking the entry lifetime from where the queried
//! range lies relative to now.

mod context;
mod error;
mod executor;
mod hierarchy;
mod request;
mod running_duration;
mod store;
#[cfg(test)]
mod test_support;
mod utilization;

pub use context::RequestContext;
pub use error::RequestError;
pub use executor::CachedRequests;
pub use hierarchy::IsDescendantOrSelfOf;
pub use request::{CachedRequest, RangeRecency, TtlPolicy};
pub use running_duration::RunningDuration;
pub use store::{CacheStore, CachedResult, LruCacheStore};
pub use utilization::UtilizationPercentage;
