//! In-memory timeline implementing every read collaborator.
//!
//! Used by the CLI to answer queries over a fixture file and by tests. Slots
//! are kept sorted by their lower bound per machine.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};

use crate::day::DayResolver;
use crate::mode::{MachineMode, ModeCatalog};
use crate::range::{DayRange, TimeRange};
use crate::slot::SourceSlot;
use crate::source::{DaySummary, DaySummaryStore, SlotSource, SourceResult};
use crate::types::{MachineId, MachineModeId};

/// Slots, day summaries and modes held in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryTimeline {
    slots: HashMap<MachineId, Vec<SourceSlot>>,
    summaries: HashMap<MachineId, Vec<DaySummary>>,
    modes: HashMap<MachineModeId, MachineMode>,
}

impl MemoryTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a slot, keeping the machine's slots in time order.
    pub fn insert_slot(&mut self, slot: SourceSlot) {
        let slots = self.slots.entry(slot.machine.clone()).or_default();
        if let Some(existing) = slots.iter().find(|s| s.time_range.overlaps(&slot.time_range)) {
            tracing::warn!(
                machine = %slot.machine,
                existing = %existing.time_range,
                inserted = %slot.time_range,
                "inserted slot overlaps an existing slot"
            );
        }
        let position = slots.partition_point(|s| s.time_range.lower() <= slot.time_range.lower());
        slots.insert(position, slot);
    }

    pub fn insert_mode(&mut self, mode: MachineMode) {
        self.modes.insert(mode.id.clone(), mode);
    }

    pub fn insert_summary(&mut self, machine: MachineId, summary: DaySummary) {
        self.summaries.entry(machine).or_default().push(summary);
    }

    /// Machines with at least one slot or summary, sorted.
    pub fn machines(&self) -> Vec<MachineId> {
        let mut machines: Vec<_> = self
            .slots
            .keys()
            .chain(self.summaries.keys())
            .cloned()
            .collect();
        machines.sort();
        machines.dedup();
        machines
    }

    /// The slots of `machine` in time order.
    pub fn slots_of(&self, machine: &MachineId) -> &[SourceSlot] {
        self.slots.get(machine).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replaces all day summaries with per-day, per-mode totals computed from slots.
    ///
    /// Open-ended slots count up to `until`. Returns the number of summaries written.
    pub fn rebuild_day_summaries(
        &mut self,
        resolver: &dyn DayResolver,
        until: DateTime<Utc>,
    ) -> usize {
        let mut totals: BTreeMap<(MachineId, NaiveDate, MachineModeId), f64> = BTreeMap::new();
        let window = TimeRange::before(until);
        for slot in self.slots.values().flatten() {
            let clipped = slot.time_range.intersect(&window);
            let (Some(mut cursor), Some(end)) = (clipped.lower(), clipped.upper()) else {
                if !clipped.is_empty() {
                    tracing::warn!(
                        machine = %slot.machine,
                        range = %slot.time_range,
                        "slot without start skipped"
                    );
                }
                continue;
            };
            while cursor < end {
                let day = resolver.resolve_day(cursor);
                let Some(day_end) = resolver.resolve_day_bounds(day).upper() else {
                    break;
                };
                if day_end <= cursor {
                    tracing::error!(
                        machine = %slot.machine,
                        %cursor,
                        "day resolver made no progress"
                    );
                    break;
                }
                let piece_end = day_end.min(end);
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "day pieces are far below f64 integer precision"
                )]
                let seconds = (piece_end - cursor).num_milliseconds() as f64 / 1000.0;
                *totals
                    .entry((slot.machine.clone(), day, slot.machine_mode.clone()))
                    .or_default() += seconds;
                cursor = piece_end;
            }
        }

        self.summaries.clear();
        let count = totals.len();
        for ((machine, day, machine_mode), total_seconds) in totals {
            self.insert_summary(
                machine,
                DaySummary {
                    machine_mode,
                    day,
                    total_seconds,
                },
            );
        }
        count
    }
}

impl SlotSource for MemoryTimeline {
    fn find_at(&self, machine: &MachineId, at: DateTime<Utc>) -> SourceResult<Option<SourceSlot>> {
        Ok(self
            .slots_of(machine)
            .iter()
            .find(|s| s.time_range.contains(at))
            .cloned())
    }

    fn find_all_overlapping(
        &self,
        machine: &MachineId,
        range: &TimeRange,
    ) -> SourceResult<Vec<SourceSlot>> {
        Ok(self
            .slots_of(machine)
            .iter()
            .filter(|s| s.time_range.overlaps(range))
            .cloned()
            .collect())
    }

    fn find_adjacent_ending_at(
        &self,
        machine: &MachineId,
        at: DateTime<Utc>,
    ) -> SourceResult<Option<SourceSlot>> {
        Ok(self
            .slots_of(machine)
            .iter()
            .find(|s| s.time_range.upper() == Some(at))
            .cloned())
    }

    fn find_adjacent_starting_at(
        &self,
        machine: &MachineId,
        at: DateTime<Utc>,
    ) -> SourceResult<Option<SourceSlot>> {
        Ok(self
            .slots_of(machine)
            .iter()
            .find(|s| s.time_range.lower() == Some(at))
            .cloned())
    }
}

impl DaySummaryStore for MemoryTimeline {
    fn find_day_summaries(
        &self,
        machine: &MachineId,
        days: &DayRange,
    ) -> SourceResult<Vec<DaySummary>> {
        Ok(self
            .summaries
            .get(machine)
            .map(|summaries| {
                summaries
                    .iter()
                    .filter(|s| days.contains(s.day))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl ModeCatalog for MemoryTimeline {
    fn find_mode(&self, id: &MachineModeId) -> SourceResult<Option<MachineMode>> {
        Ok(self.modes.get(id).cloned())
    }
}
