//! Collaborators shared by every request computation.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mt_core::{
    Clock, DayResolver, DaySummaryStore, MemoryTimeline, ModeCatalog, SlotSource,
};

use crate::request::TtlPolicy;

/// Read-only access to timeline data, plant days, the clock and TTL settings.
///
/// Cheap to clone; the async path moves a clone onto a blocking thread.
#[derive(Clone)]
pub struct RequestContext {
    pub slots: Arc<dyn SlotSource>,
    pub summaries: Arc<dyn DaySummaryStore>,
    pub modes: Arc<dyn ModeCatalog>,
    pub days: Arc<dyn DayResolver>,
    pub clock: Arc<dyn Clock>,
    pub ttl: TtlPolicy,
}

impl RequestContext {
    /// Serves every collaborator from one in-memory timeline.
    pub fn from_timeline(
        timeline: Arc<MemoryTimeline>,
        days: Arc<dyn DayResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            slots: timeline.clone(),
            summaries: timeline.clone(),
            modes: timeline,
            days,
            clock,
            ttl: TtlPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: TtlPolicy) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The first instant of the plant day containing now.
    pub fn start_of_today(&self) -> DateTime<Utc> {
        let now = self.now();
        self.days
            .resolve_day_bounds(self.days.resolve_day(now))
            .lower()
            .unwrap_or(now)
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("now", &self.now())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

