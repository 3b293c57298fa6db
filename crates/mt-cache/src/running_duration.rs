//! Total running time of a machine over a range.
//!
//! Whole processed plant days are answered from day summaries. Everything
//! else, the partial first day and the stretch after the last processed
//! boundary, is scanned live from the machine mode projection and clipped at
//! now. Both paths decide "running" by the mode catalog, so splitting a range
//! anywhere gives the same total.

use std::collections::HashMap;

use chrono::Duration;
use mt_core::{
    DaySummary, MachineId, MachineModeId, MachineModeProjection, SlotProjection, TimeRange,
};

use crate::context::RequestContext;
use crate::error::RequestError;
use crate::request::CachedRequest;

/// Seconds `machine` spent running within `range`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunningDuration {
    machine: MachineId,
    range: TimeRange,
}

impl RunningDuration {
    pub const fn new(machine: MachineId, range: TimeRange) -> Self {
        Self { machine, range }
    }

    pub const fn machine(&self) -> &MachineId {
        &self.machine
    }

    pub const fn range(&self) -> &TimeRange {
        &self.range
    }
}

impl CachedRequest for RunningDuration {
    type Output = f64;

    fn cache_key(&self) -> String {
        format!("RunningDuration.{}.{}", self.machine, self.range)
    }

    fn compute(&self, ctx: &RequestContext) -> Result<f64, RequestError> {
        let mut modes = RunningModes::new(ctx, &self.machine);
        running_seconds(ctx, &mut modes, &self.range.half_open())
    }

    fn is_cache_valid(&self, cached: &f64) -> bool {
        cached.is_finite() && *cached >= 0.0
    }

    fn cache_timeout(&self, ctx: &RequestContext, _computed: &f64) -> Duration {
        ctx.ttl.for_range(&self.range, ctx)
    }
}

/// Expects `range` in `[lower, upper)` form; every split below preserves it.
fn running_seconds(
    ctx: &RequestContext,
    modes: &mut RunningModes<'_>,
    range: &TimeRange,
) -> Result<f64, RequestError> {
    if range.is_empty() {
        return Ok(0.0);
    }
    let now = ctx.now();
    let end = range.upper().map_or(now, |upper| upper.min(now));
    let boundary = ctx.days.resolve_processed_boundary(end);

    if range.upper() != Some(boundary) {
        if range.lower().is_some_and(|lower| boundary <= lower) {
            return live_scan(ctx, modes, range);
        }
        let (processed, live) = range.split_at(boundary);
        return Ok(running_seconds(ctx, modes, &processed)? + live_scan(ctx, modes, &live)?);
    }

    if let Some(lower) = range.lower() {
        if !ctx.days.is_day_boundary(lower) {
            let first_day = ctx.days.resolve_day_bounds(ctx.days.resolve_day(lower));
            return match first_day.upper() {
                Some(day_end) if day_end < boundary => {
                    let (partial, whole_days) = range.split_at(day_end);
                    Ok(live_scan(ctx, modes, &partial)?
                        + running_seconds(ctx, modes, &whole_days)?)
                }
                _ => live_scan(ctx, modes, range),
            };
        }
    }

    let days = ctx.days.resolve_day_range(range);
    let summaries = ctx.summaries.find_day_summaries(modes.machine, &days)?;
    Ok(modes.split(&summaries)?.0)
}

/// Whether each machine mode counts as running, looked up once per mode.
pub(crate) struct RunningModes<'a> {
    ctx: &'a RequestContext,
    machine: &'a MachineId,
    known: HashMap<MachineModeId, bool>,
}

impl<'a> RunningModes<'a> {
    pub(crate) fn new(ctx: &'a RequestContext, machine: &'a MachineId) -> Self {
        Self {
            ctx,
            machine,
            known: HashMap::new(),
        }
    }

    /// Unknown modes count as not running.
    pub(crate) fn is_running(&mut self, mode: &MachineModeId) -> Result<bool, RequestError> {
        if let Some(known) = self.known.get(mode) {
            return Ok(*known);
        }
        let running = match self.ctx.modes.find_mode(mode)? {
            Some(found) => found.running,
            None => {
                tracing::warn!(
                    machine = %self.machine,
                    %mode,
                    "unknown machine mode counted as not running"
                );
                false
            }
        };
        self.known.insert(mode.clone(), running);
        Ok(running)
    }

    /// Splits summary seconds into `(running, total)`.
    pub(crate) fn split(&mut self, summaries: &[DaySummary]) -> Result<(f64, f64), RequestError> {
        let mut running = 0.0;
        let mut total = 0.0;
        for summary in summaries {
            total += summary.total_seconds;
            if self.is_running(&summary.machine_mode)? {
                running += summary.total_seconds;
            }
        }
        Ok((running, total))
    }
}

fn live_scan(
    ctx: &RequestContext,
    modes: &mut RunningModes<'_>,
    range: &TimeRange,
) -> Result<f64, RequestError> {
    let machine = modes.machine;
    let window = range.intersect(&TimeRange::before(ctx.now()));
    if window.is_empty() {
        return Ok(0.0);
    }
    let slots =
        MachineModeProjection::find_overlaps_range(ctx.slots.as_ref(), machine, &window, false)?;
    let mut seconds = 0.0;
    for slot in &slots {
        if !modes.is_running(&slot.value.machine_mode)? {
            continue;
        }
        let clipped = slot.time_range.intersect(&window);
        match clipped.duration() {
            Some(d) => seconds += duration_seconds(d),
            None => tracing::warn!(%machine, range = %clipped, "unbounded running slot skipped"),
        }
    }
    tracing::debug!(%machine, range = %window, seconds, "live scan");
    Ok(seconds)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "slot durations are far below f64 integer precision"
)]
fn duration_seconds(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::RangeRecency;
    use crate::test_support::{
        context, context_for, context_with, m1, mode, now, plant_resolver, range, resolver, t,
        timeline_for,
    };
    use mt_core::testing::SlotBuilder;
    use mt_core::{DaySummary, MemoryTimeline};

    const HOUR: f64 = 3600.0;

    fn seconds(from: chrono::DateTime<chrono::Utc>, to: chrono::DateTime<chrono::Utc>) -> f64 {
        RunningDuration::new(m1(), range(from, to))
            .compute(&context())
            .unwrap()
    }

    #[test]
    fn counts_running_time_across_processed_and_live_days() {
        assert!((seconds(t(8, 0, 0), t(11, 0, 0)) - 37.5 * HOUR).abs() < 1e-6);
        assert!((seconds(t(8, 3, 0), t(10, 14, 0)) - 36.5 * HOUR).abs() < 1e-6);
    }

    #[test]
    fn is_additive_over_any_split_point() {
        let (a, c) = (t(8, 3, 0), t(10, 14, 0));
        let whole = seconds(a, c);
        for b in [t(8, 10, 0), t(9, 0, 0), t(9, 12, 30), t(10, 0, 0), t(10, 11, 0)] {
            let parts = seconds(a, b) + seconds(b, c);
            assert!((whole - parts).abs() < 1e-6, "split at {b}: {whole} != {parts}");
        }
    }

    #[test]
    fn open_ended_range_stops_at_now() {
        let request = RunningDuration::new(m1(), TimeRange::at_least(t(10, 0, 0)));
        let value = request.compute(&context()).unwrap();
        assert!((value - 5.5 * HOUR).abs() < 1e-6);
    }

    #[test]
    fn future_and_empty_ranges_are_zero() {
        assert!(seconds(t(10, 16, 0), t(10, 18, 0)).abs() < f64::EPSILON);
        let request = RunningDuration::new(m1(), TimeRange::empty(t(9, 0, 0)));
        assert!(request.compute(&context()).unwrap().abs() < f64::EPSILON);
        let request = RunningDuration::new(
            mt_core::MachineId::new("unknown").unwrap(),
            range(t(8, 0, 0), t(10, 12, 0)),
        );
        assert!(request.compute(&context()).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn whole_processed_days_come_from_summaries() {
        let mut timeline = MemoryTimeline::new();
        timeline.insert_mode(mode("production", true, None));
        timeline.insert_mode(mode("setup", false, None));
        let rows = [
            (8, "production", 100.0),
            (8, "setup", 50.0),
            (9, "production", 20.0),
        ];
        for (day, mode, total_seconds) in rows {
            timeline.insert_summary(
                m1(),
                DaySummary {
                    machine_mode: MachineModeId::new(mode).unwrap(),
                    day: chrono::NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
                    total_seconds,
                },
            );
        }
        let (_, ctx) = context_for(timeline);
        let request = RunningDuration::new(m1(), range(t(8, 0, 0), t(10, 0, 0)));
        assert!((request.compute(&ctx).unwrap() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_modes_in_summaries_count_as_not_running() {
        let mut timeline = MemoryTimeline::new();
        timeline.insert_summary(
            m1(),
            DaySummary {
                machine_mode: MachineModeId::new("mystery").unwrap(),
                day: chrono::NaiveDate::from_ymd_opt(2025, 3, 8).unwrap(),
                total_seconds: 500.0,
            },
        );
        let (_, ctx) = context_for(timeline);
        let request = RunningDuration::new(m1(), range(t(8, 0, 0), t(9, 0, 0)));
        assert!(request.compute(&ctx).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn past_ranges_are_cached_longer_than_current_ones() {
        let ctx = context();
        let past = RunningDuration::new(m1(), range(t(8, 0, 0), t(9, 0, 0)));
        let current = RunningDuration::new(m1(), range(t(10, 0, 0), t(11, 0, 0)));
        let past_ttl = past.cache_timeout(&ctx, &1.0);
        let current_ttl = current.cache_timeout(&ctx, &1.0);
        assert!(past_ttl > current_ttl);
        assert_eq!(past_ttl, ctx.ttl.for_recency(RangeRecency::Past));
        assert_eq!(current_ttl, ctx.ttl.for_recency(RangeRecency::Current));
    }

    #[test]
    fn cache_key_names_machine_and_range() {
        let request = RunningDuration::new(m1(), range(t(8, 0, 0), t(9, 0, 0)));
        assert_eq!(
            request.cache_key(),
            "RunningDuration.m1.[2025-03-08T00:00:00Z,2025-03-09T00:00:00Z)"
        );
    }

    #[test]
    fn rejects_negative_and_non_finite_cached_values() {
        let request = RunningDuration::new(m1(), range(t(8, 0, 0), t(9, 0, 0)));
        assert!(request.is_cache_valid(&0.0));
        assert!(!request.is_cache_valid(&-1.0));
        assert!(!request.is_cache_valid(&f64::NAN));
    }

    #[test]
    fn closed_and_half_open_ranges_agree() {
        let ctx = context();
        for (from, to) in [
            (t(8, 0, 0), t(10, 0, 0)),
            (t(8, 3, 0), t(10, 14, 0)),
            (t(9, 0, 0), t(9, 12, 0)),
        ] {
            let half_open = RunningDuration::new(m1(), range(from, to)).compute(&ctx).unwrap();
            let closed = RunningDuration::new(m1(), TimeRange::closed(from, to).unwrap())
                .compute(&ctx)
                .unwrap();
            assert!(
                (half_open - closed).abs() < 1e-6,
                "[{from}, {to}]: {closed} != {half_open}"
            );
        }
        let closed_days = TimeRange::closed(t(8, 0, 0), t(10, 0, 0)).unwrap();
        let value = RunningDuration::new(m1(), closed_days).compute(&ctx).unwrap();
        assert!((value - 32.0 * HOUR).abs() < 1e-6);
    }

    #[test]
    fn mode_catalog_decides_running_on_every_path() {
        // Slot flags disagree with the catalog: production is running, setup is not.
        let mut timeline = MemoryTimeline::new();
        timeline.insert_mode(mode("production", true, None));
        timeline.insert_mode(mode("setup", false, None));
        timeline.insert_slot(
            SlotBuilder::new("m1", t(8, 0, 0), Some(t(8, 12, 0)))
                .mode("production")
                .stopped()
                .build(),
        );
        timeline.insert_slot(
            SlotBuilder::new("m1", t(8, 12, 0), Some(t(9, 0, 0)))
                .mode("setup")
                .flags(true, true)
                .build(),
        );
        timeline.rebuild_day_summaries(&resolver(), now());
        let (_, ctx) = context_for(timeline);
        let duration = |from, to| {
            RunningDuration::new(m1(), range(from, to))
                .compute(&ctx)
                .unwrap()
        };

        let (a, c) = (t(8, 0, 0), t(9, 0, 0));
        let whole = duration(a, c);
        assert!((whole - 12.0 * HOUR).abs() < 1e-6);
        for b in [t(8, 6, 0), t(8, 12, 0), t(8, 18, 0)] {
            let parts = duration(a, b) + duration(b, c);
            assert!((whole - parts).abs() < 1e-6, "split at {b}: {whole} != {parts}");
        }
    }

    #[test]
    fn is_additive_across_offset_plant_days() {
        let days = plant_resolver();
        let (_, ctx) = context_with(timeline_for(&days), days);
        let duration = |from, to| {
            RunningDuration::new(m1(), range(from, to))
                .compute(&ctx)
                .unwrap()
        };

        // Plant days start at 05:00 UTC; 03-08 holds 17h of production, 03-09 holds 15h.
        assert!((duration(t(8, 5, 0), t(10, 5, 0)) - 32.0 * HOUR).abs() < 1e-6);

        let (a, c) = (t(8, 3, 0), t(10, 14, 0));
        let whole = duration(a, c);
        assert!((whole - 36.5 * HOUR).abs() < 1e-6);
        for b in [
            t(8, 5, 0),
            t(8, 10, 0),
            t(9, 0, 0),
            t(9, 5, 0),
            t(9, 12, 30),
            t(10, 0, 0),
            t(10, 5, 0),
            t(10, 11, 0),
        ] {
            let parts = duration(a, b) + duration(b, c);
            assert!((whole - parts).abs() < 1e-6, "split at {b}: {whole} != {parts}");
        }
    }

    #[tokio::test]
    async fn async_compute_matches_sync_compute() {
        let ctx = context();
        let request = RunningDuration::new(m1(), range(t(8, 3, 0), t(10, 14, 0)));
        let sync = request.compute(&ctx).unwrap();
        let async_value = request.compute_async(&ctx).await.unwrap();
        assert!((sync - async_value).abs() < f64::EPSILON);
    }
}
