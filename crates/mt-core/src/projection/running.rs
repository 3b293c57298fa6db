//! Running / not-running view.

use serde::Serialize;

use super::SlotProjection;
use crate::slot::{DerivedSlot, SlotValue, SourceSlot};

/// The recorded running flags of a slot.
///
/// Kept as two booleans: `(false, false)` means the state is unknown, not a
/// third recorded state. `(true, true)` is contradictory data and is logged
/// when projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RunningState {
    pub running: bool,
    pub not_running: bool,
}

/// Tri-state reading of [`RunningState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunningStatus {
    Running,
    NotRunning,
    Unknown,
}

impl RunningState {
    pub const fn new(running: bool, not_running: bool) -> Self {
        Self {
            running,
            not_running,
        }
    }

    /// Returns false when both flags are set.
    pub const fn is_consistent(&self) -> bool {
        !(self.running && self.not_running)
    }

    /// Contradictory flags read as [`RunningStatus::Unknown`].
    pub const fn status(&self) -> RunningStatus {
        match (self.running, self.not_running) {
            (true, false) => RunningStatus::Running,
            (false, true) => RunningStatus::NotRunning,
            _ => RunningStatus::Unknown,
        }
    }
}

impl SlotValue for RunningState {
    fn reference_equals(&self, other: &Self) -> bool {
        self == other
    }
}

pub type RunningSlot = DerivedSlot<RunningState>;

/// Merges slots sharing the same running flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningProjection;

impl SlotProjection for RunningProjection {
    type Value = RunningState;

    fn value_of(source: &SourceSlot) -> RunningState {
        let state = RunningState::new(source.running, source.not_running);
        if !state.is_consistent() {
            tracing::error!(
                machine = %source.machine,
                range = %source.time_range,
                "slot flagged both running and not running"
            );
        }
        state
    }
}
