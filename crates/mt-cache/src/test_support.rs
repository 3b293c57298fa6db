//! Shared fixture for request tests.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use mt_core::testing::SlotBuilder;
use mt_core::{
    DayResolver, FixedClock, MachineId, MachineMode, MachineModeId, MemoryTimeline,
    PlantDayResolver, TimeRange,
};

use crate::context::RequestContext;

pub fn t(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
}

pub fn range(from: DateTime<Utc>, to: DateTime<Utc>) -> TimeRange {
    TimeRange::closed_open(from, to).unwrap()
}

pub fn m1() -> MachineId {
    MachineId::new("m1").unwrap()
}

pub fn mode(id: &str, running: bool, parent: Option<&str>) -> MachineMode {
    MachineMode {
        id: MachineModeId::new(id).unwrap(),
        name: id.to_string(),
        running,
        parent: parent.map(|p| MachineModeId::new(p).unwrap()),
    }
}

/// Now is 2025-03-10 15:00 UTC; days up to 2025-03-09 are processed.
pub fn now() -> DateTime<Utc> {
    t(10, 15, 0)
}

pub fn last_processed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
}

pub fn resolver() -> PlantDayResolver {
    PlantDayResolver::default().with_last_processed_day(last_processed_day())
}

/// A plant at UTC+1 whose day starts at 06:00 local, i.e. 05:00 UTC.
pub fn plant_resolver() -> PlantDayResolver {
    PlantDayResolver::new(
        FixedOffset::east_opt(3600).unwrap(),
        NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
    )
    .with_last_processed_day(last_processed_day())
}

/// Machine `m1` alternating production (running) and setup (stopped):
///
/// | from | to | mode |
/// |------|----|------|
/// | 08 06:00 | 08 22:00 | production |
/// | 08 22:00 | 09 04:00 | setup |
/// | 09 04:00 | 09 20:00 | production |
/// | 09 20:00 | 10 09:30 | setup |
/// | 10 09:30 | open | production |
///
/// Day summaries are rebuilt from the slots up to now.
pub fn timeline() -> MemoryTimeline {
    timeline_for(&resolver())
}

/// The same slots with summaries bucketed by `days`.
pub fn timeline_for(days: &dyn DayResolver) -> MemoryTimeline {
    let mut timeline = MemoryTimeline::new();
    timeline.insert_mode(mode("production", true, None));
    timeline.insert_mode(mode("setup", false, None));
    let runs = [
        (t(8, 6, 0), Some(t(8, 22, 0)), "production"),
        (t(8, 22, 0), Some(t(9, 4, 0)), "setup"),
        (t(9, 4, 0), Some(t(9, 20, 0)), "production"),
        (t(9, 20, 0), Some(t(10, 9, 30)), "setup"),
        (t(10, 9, 30), None, "production"),
    ];
    for (from, to, mode) in runs {
        let builder = SlotBuilder::new("m1", from, to).mode(mode);
        let builder = if mode == "production" {
            builder.running()
        } else {
            builder.stopped().color("yellow")
        };
        timeline.insert_slot(builder.build());
    }
    timeline.rebuild_day_summaries(days, now());
    timeline
}

pub fn context_for(timeline: MemoryTimeline) -> (Arc<FixedClock>, RequestContext) {
    context_with(timeline, resolver())
}

pub fn context_with(
    timeline: MemoryTimeline,
    days: PlantDayResolver,
) -> (Arc<FixedClock>, RequestContext) {
    let clock = Arc::new(FixedClock::new(now()));
    let ctx = RequestContext::from_timeline(Arc::new(timeline), Arc::new(days), clock.clone());
    (clock, ctx)
}

pub fn context() -> RequestContext {
    context_for(timeline()).1
}
