//! Coarse views of the slot timeline.
//!
//! Each projection picks the reference data that decides mergeability and
//! reuses the engine in [`crate::merge`] for everything else.

mod color;
mod machine_mode;
mod running;

pub use color::{ColorProjection, ColorSlot, ColorValue};
pub use machine_mode::{
    MachineModeProjection, MachineModeSlot, MachineModeValue, ReasonValue, SubSlot,
};
pub use running::{RunningProjection, RunningSlot, RunningState, RunningStatus};

use chrono::{DateTime, Utc};

use crate::merge::{extend_left, extend_right, merge_slots};
use crate::range::TimeRange;
use crate::slot::{DerivedSlot, SlotError, SlotValue, SourceSlot};
use crate::source::SlotSource;
use crate::types::MachineId;

/// A derived view over source slots.
pub trait SlotProjection {
    type Value: SlotValue;

    /// Extracts the reference data of one source slot.
    fn value_of(source: &SourceSlot) -> Self::Value;

    /// Lifts one source slot into a derived slot.
    fn derive(source: &SourceSlot) -> DerivedSlot<Self::Value> {
        DerivedSlot::new(
            source.machine.clone(),
            source.time_range,
            source.day_range,
            Self::value_of(source),
        )
    }

    /// Merges time-ordered source slots.
    fn merge(sources: &[SourceSlot]) -> Result<Vec<DerivedSlot<Self::Value>>, SlotError> {
        merge_slots(sources.iter().map(Self::derive))
    }

    /// The derived slot covering `at`, optionally extended on both sides.
    fn find_at(
        source: &dyn SlotSource,
        machine: &MachineId,
        at: DateTime<Utc>,
        extend: bool,
    ) -> Result<Option<DerivedSlot<Self::Value>>, SlotError> {
        let Some(found) = source.find_at(machine, at)? else {
            tracing::debug!(%machine, %at, "no slot recorded");
            return Ok(None);
        };
        let slot = Self::derive(&found);
        if !extend {
            return Ok(Some(slot));
        }
        let slot = extend_left(slot, source, Self::derive)?;
        extend_right(slot, source, Self::derive).map(Some)
    }

    /// Merged slots overlapping `range`, in time order.
    ///
    /// With `extend`, the first slot is grown to the left and the last to the
    /// right beyond `range`.
    fn find_overlaps_range(
        source: &dyn SlotSource,
        machine: &MachineId,
        range: &TimeRange,
        extend: bool,
    ) -> Result<Vec<DerivedSlot<Self::Value>>, SlotError> {
        let sources = source.find_all_overlapping(machine, range)?;
        let mut slots = Self::merge(&sources)?;
        if extend {
            if let Some(first) = slots.first_mut() {
                *first = extend_left(first.clone(), source, Self::derive)?;
            }
            if let Some(last) = slots.last_mut() {
                *last = extend_right(last.clone(), source, Self::derive)?;
            }
        }
        tracing::debug!(
            %machine,
            %range,
            source_slots = sources.len(),
            derived_slots = slots.len(),
            "merged slots"
        );
        Ok(slots)
    }
}
