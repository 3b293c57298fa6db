//! Everything a command needs: the loaded timeline, plant days and the request cache.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use mt_cache::{CachedRequests, LruCacheStore, RequestContext};
use mt_core::{Clock, FixedClock, MemoryTimeline, PlantDayResolver, SystemClock};

use crate::Config;

pub struct App {
    pub timeline: Arc<MemoryTimeline>,
    pub days: Arc<PlantDayResolver>,
    pub requests: CachedRequests,
}

impl App {
    /// Loads the configured timeline; `now` pins the clock.
    pub fn open(config: &Config, now: Option<DateTime<Utc>>) -> Result<Self> {
        let clock: Arc<dyn Clock> = match now {
            Some(now) => Arc::new(FixedClock::new(now)),
            None => Arc::new(SystemClock),
        };
        let days = config.day_resolver()?;
        let timeline = crate::timeline::load_timeline(&config.timeline_path, &days, clock.now())
            .context("failed to load timeline")?;
        Ok(Self::new(timeline, days, clock, config))
    }

    pub fn new(
        timeline: MemoryTimeline,
        days: PlantDayResolver,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let timeline = Arc::new(timeline);
        let days = Arc::new(days);
        let ctx = RequestContext::from_timeline(timeline.clone(), days.clone(), clock.clone())
            .with_ttl(config.ttl);
        let store = Arc::new(LruCacheStore::new(config.cache_capacity, clock));
        Self {
            timeline,
            days,
            requests: CachedRequests::new(store, ctx),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.requests.context().now()
    }
}
