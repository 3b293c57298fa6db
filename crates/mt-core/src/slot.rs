//! Source slots recorded by the tracking subsystem and the derived slots built from them.

use std::fmt;

use chrono::Duration;
use serde::Serialize;
use thiserror::Error;

use crate::day::DayResolver;
use crate::range::{DayRange, TimeRange};
use crate::source::SourceError;
use crate::types::{MachineId, MachineModeId, ObservationStateId, ReasonId};

/// Errors raised while deriving slots.
#[derive(Debug, Error)]
pub enum SlotError {
    /// Two slots of different machines were compared.
    #[error("cannot compare a slot of machine {left} with a slot of machine {right}")]
    MachineMismatch { left: MachineId, right: MachineId },
    /// The slot source failed.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// One fine-grained slot of a machine's timeline.
///
/// Source slots are produced and owned by the tracking subsystem; this crate
/// only reads them. Per machine they are ordered and do not overlap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSlot {
    pub machine: MachineId,
    pub time_range: TimeRange,
    pub day_range: DayRange,
    pub machine_mode: MachineModeId,
    pub running: bool,
    pub not_running: bool,
    pub reason: ReasonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_details: Option<String>,
    pub is_default_reason: bool,
    pub observation_state: ObservationStateId,
    pub color: String,
}

/// The part of a derived slot that decides whether two neighbours merge.
pub trait SlotValue: Clone + fmt::Debug {
    /// Returns true if two slots holding these values may be merged.
    fn reference_equals(&self, other: &Self) -> bool;

    /// Folds in the value of the slot that directly follows this one.
    ///
    /// Called only after [`reference_equals`](Self::reference_equals) returned true.
    fn absorb(&mut self, _later: Self) {}
}

/// A value held constant over a merged run of source slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedSlot<V> {
    pub machine: MachineId,
    pub time_range: TimeRange,
    pub day_range: DayRange,
    pub value: V,
}

impl<V: SlotValue> DerivedSlot<V> {
    pub fn new(machine: MachineId, time_range: TimeRange, day_range: DayRange, value: V) -> Self {
        Self {
            machine,
            time_range,
            day_range,
            value,
        }
    }

    /// Compares reference data with a slot of the same machine.
    pub fn reference_data_equals(&self, other: &Self) -> Result<bool, SlotError> {
        if self.machine != other.machine {
            return Err(SlotError::MachineMismatch {
                left: self.machine.clone(),
                right: other.machine.clone(),
            });
        }
        Ok(self.value.reference_equals(&other.value))
    }

    /// Returns true if `next`, which follows this slot, can be folded into it.
    pub fn is_mergeable_with(&self, next: &Self) -> Result<bool, SlotError> {
        if !self.reference_data_equals(next)? {
            return Ok(false);
        }
        if self.time_range.is_adjacent_to(&next.time_range) {
            return Ok(true);
        }
        if self.time_range.overlaps(&next.time_range) {
            tracing::error!(
                machine = %self.machine,
                left = %self.time_range,
                right = %next.time_range,
                "overlapping source slots, merging them"
            );
            return Ok(true);
        }
        Ok(false)
    }

    /// Joins this slot with the slot that directly follows it.
    #[must_use]
    pub fn join(mut self, later: Self) -> Self {
        self.time_range = self.time_range.union(&later.time_range);
        self.day_range = self.day_range.union(&later.day_range);
        self.value.absorb(later.value);
        self
    }

    /// Returns a copy covering a different range with the same value.
    #[must_use]
    pub fn with_range(&self, time_range: TimeRange, day_range: DayRange) -> Self {
        Self {
            machine: self.machine.clone(),
            time_range,
            day_range,
            value: self.value.clone(),
        }
    }

    /// Returns a copy clipped to `window`, or `None` if they do not overlap.
    pub fn restrict_to(&self, window: &TimeRange, resolver: &dyn DayResolver) -> Option<Self> {
        let time_range = self.time_range.intersect(window);
        if time_range.is_empty() {
            return None;
        }
        let day_range = resolver.resolve_day_range(&time_range);
        Some(self.with_range(time_range, day_range))
    }

    /// Length of the slot; `None` if it is still open.
    pub fn duration(&self) -> Option<Duration> {
        self.time_range.duration()
    }
}
