//! Machine-mode view with nested reason and observation-state runs.

use serde::Serialize;

use super::SlotProjection;
use crate::range::TimeRange;
use crate::slot::{DerivedSlot, SlotValue, SourceSlot};
use crate::types::{MachineModeId, ObservationStateId, ReasonId};

/// A run of equal values inside a machine-mode slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubSlot<T> {
    pub time_range: TimeRange,
    pub value: T,
}

impl<T: PartialEq> SubSlot<T> {
    /// Appends `next`, joining it with the last run when equal and adjacent.
    fn push_merged(runs: &mut Vec<Self>, next: Self) {
        if let Some(last) = runs.last_mut() {
            if last.value == next.value && last.time_range.is_adjacent_to(&next.time_range) {
                last.time_range = last.time_range.union(&next.time_range);
                return;
            }
        }
        runs.push(next);
    }
}

/// Reason assigned to a stretch of time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ReasonValue {
    pub reason: ReasonId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MachineModeValue {
    pub machine_mode: MachineModeId,
    pub reasons: Vec<SubSlot<ReasonValue>>,
    pub observation_states: Vec<SubSlot<ObservationStateId>>,
}

impl SlotValue for MachineModeValue {
    fn reference_equals(&self, other: &Self) -> bool {
        self.machine_mode == other.machine_mode
    }

    fn absorb(&mut self, later: Self) {
        for run in later.reasons {
            SubSlot::push_merged(&mut self.reasons, run);
        }
        for run in later.observation_states {
            SubSlot::push_merged(&mut self.observation_states, run);
        }
    }
}

pub type MachineModeSlot = DerivedSlot<MachineModeValue>;

/// Merges slots sharing a machine mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineModeProjection;

impl SlotProjection for MachineModeProjection {
    type Value = MachineModeValue;

    fn value_of(source: &SourceSlot) -> MachineModeValue {
        MachineModeValue {
            machine_mode: source.machine_mode.clone(),
            reasons: vec![SubSlot {
                time_range: source.time_range,
                value: ReasonValue {
                    reason: source.reason.clone(),
                    details: source.reason_details.clone(),
                    is_default: source.is_default_reason,
                },
            }],
            observation_states: vec![SubSlot {
                time_range: source.time_range,
                value: source.observation_state.clone(),
            }],
        }
    }
}
