//! Share of running time from the current plant day onwards.

use chrono::Duration;
use mt_core::{DayRange, MachineId, TimeRange};

use crate::context::RequestContext;
use crate::error::RequestError;
use crate::request::CachedRequest;
use crate::running_duration::RunningModes;

/// Running seconds over total seconds of `machine` from today on, in `[0, 1]`.
///
/// A machine without any recorded time today counts as fully utilized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UtilizationPercentage {
    machine: MachineId,
}

impl UtilizationPercentage {
    pub const fn new(machine: MachineId) -> Self {
        Self { machine }
    }

    pub const fn machine(&self) -> &MachineId {
        &self.machine
    }
}

impl CachedRequest for UtilizationPercentage {
    type Output = f64;

    fn cache_key(&self) -> String {
        format!("UtilizationPercentage.{}", self.machine)
    }

    fn compute(&self, ctx: &RequestContext) -> Result<f64, RequestError> {
        let today = ctx.days.resolve_day(ctx.now());
        let summaries = ctx
            .summaries
            .find_day_summaries(&self.machine, &DayRange::at_least(today))?;
        let (running, total) = RunningModes::new(ctx, &self.machine).split(&summaries)?;
        if total <= 0.0 {
            tracing::debug!(
                machine = %self.machine,
                %today,
                "no recorded time, reporting full utilization"
            );
            return Ok(1.0);
        }
        Ok((running / total).clamp(0.0, 1.0))
    }

    fn is_cache_valid(&self, cached: &f64) -> bool {
        (0.0..=1.0).contains(cached)
    }

    fn cache_timeout(&self, ctx: &RequestContext, _computed: &f64) -> Duration {
        ctx.ttl.for_range(&TimeRange::at_least(ctx.start_of_today()), ctx)
    }
}
