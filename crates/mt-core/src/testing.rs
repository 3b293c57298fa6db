//! Fixture builders for tests in this and downstream crates.

use chrono::{DateTime, Utc};

use crate::day::{DayResolver, PlantDayResolver};
use crate::range::TimeRange;
use crate::slot::SourceSlot;
use crate::types::{MachineId, MachineModeId, ObservationStateId, ReasonId};

/// Builds a [`SourceSlot`] with sensible defaults.
///
/// Defaults: mode `production`, running, reason `none` (default reason),
/// observation state `available`, color `green`, UTC calendar days.
#[derive(Debug, Clone)]
pub struct SlotBuilder {
    slot: SourceSlot,
}

impl SlotBuilder {
    /// Starts a slot `[start, end)`; `None` leaves it open-ended.
    ///
    /// # Panics
    ///
    /// Panics on an empty machine id or an inverted range.
    pub fn new(machine: &str, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        let time_range = TimeRange::new(Some(start), end, true, false).expect("valid slot range");
        Self {
            slot: SourceSlot {
                machine: MachineId::new(machine).expect("valid machine id"),
                time_range,
                day_range: PlantDayResolver::default().resolve_day_range(&time_range),
                machine_mode: MachineModeId::new("production").expect("valid mode id"),
                running: true,
                not_running: false,
                reason: ReasonId::new("none").expect("valid reason id"),
                reason_details: None,
                is_default_reason: true,
                observation_state: ObservationStateId::new("available").expect("valid state id"),
                color: "green".to_string(),
            },
        }
    }

    #[must_use]
    pub fn mode(mut self, mode: &str) -> Self {
        self.slot.machine_mode = MachineModeId::new(mode).expect("valid mode id");
        self
    }

    /// Sets both running flags as given, including contradictory combinations.
    #[must_use]
    pub fn flags(mut self, running: bool, not_running: bool) -> Self {
        self.slot.running = running;
        self.slot.not_running = not_running;
        self
    }

    #[must_use]
    pub fn running(self) -> Self {
        self.flags(true, false)
    }

    #[must_use]
    pub fn stopped(self) -> Self {
        self.flags(false, true)
    }

    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.slot.color = color.to_string();
        self
    }

    #[must_use]
    pub fn reason(mut self, reason: &str, details: Option<&str>) -> Self {
        self.slot.reason = ReasonId::new(reason).expect("valid reason id");
        self.slot.reason_details = details.map(str::to_string);
        self.slot.is_default_reason = false;
        self
    }

    #[must_use]
    pub fn observation(mut self, state: &str) -> Self {
        self.slot.observation_state = ObservationStateId::new(state).expect("valid state id");
        self
    }

    /// Recomputes the day range with `resolver`.
    #[must_use]
    pub fn days(mut self, resolver: &dyn DayResolver) -> Self {
        self.slot.day_range = resolver.resolve_day_range(&self.slot.time_range);
        self
    }

    pub fn build(self) -> SourceSlot {
        self.slot
    }
}
