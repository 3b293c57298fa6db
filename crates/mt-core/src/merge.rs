//! Slot merge and extension engine.
//!
//! # Merge pass
//!
//! A single forward scan over time-ordered candidates. A candidate whose value
//! reference-equals the last emitted slot and whose range is adjacent to it is
//! joined into that slot; any other candidate is appended. The result is time
//! ordered, non-overlapping and maximal, so merging it again changes nothing.
//!
//! # Extension
//!
//! A merged slot only covers the source slots that overlapped the query. On
//! request, [`extend_left`] and [`extend_right`] keep pulling in the single
//! source slot adjacent to an open side while it carries equal reference data.
//! Both stop when the side is unbounded, nothing is adjacent, or the value
//! differs, which makes a second application a no-op.

use crate::slot::{DerivedSlot, SlotError, SlotValue, SourceSlot};
use crate::source::SlotSource;

/// Upper bound on source lookups made by one extension.
pub const MAX_EXTEND_STEPS: usize = 10_000;

/// Merges time-ordered candidates into maximal runs.
///
/// Candidates with an empty range are logged and absorbed.
pub fn merge_slots<V, I>(candidates: I) -> Result<Vec<DerivedSlot<V>>, SlotError>
where
    V: SlotValue,
    I: IntoIterator<Item = DerivedSlot<V>>,
{
    let mut merged: Vec<DerivedSlot<V>> = Vec::new();
    for candidate in candidates {
        if candidate.time_range.is_empty() {
            tracing::error!(
                machine = %candidate.machine,
                range = %candidate.time_range,
                "slot with empty range absorbed"
            );
            continue;
        }
        match merged.pop() {
            Some(last) if last.is_mergeable_with(&candidate)? => merged.push(last.join(candidate)),
            Some(last) => {
                merged.push(last);
                merged.push(candidate);
            }
            None => merged.push(candidate),
        }
    }
    Ok(merged)
}

/// Which open side of a slot to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Grows `slot` backwards over adjacent source slots with equal reference data.
pub fn extend_left<V, F>(
    slot: DerivedSlot<V>,
    source: &dyn SlotSource,
    project: F,
) -> Result<DerivedSlot<V>, SlotError>
where
    V: SlotValue,
    F: Fn(&SourceSlot) -> DerivedSlot<V>,
{
    extend(slot, source, &project, Side::Left)
}

/// Grows `slot` forwards over adjacent source slots with equal reference data.
pub fn extend_right<V, F>(
    slot: DerivedSlot<V>,
    source: &dyn SlotSource,
    project: F,
) -> Result<DerivedSlot<V>, SlotError>
where
    V: SlotValue,
    F: Fn(&SourceSlot) -> DerivedSlot<V>,
{
    extend(slot, source, &project, Side::Right)
}

fn extend<V, F>(
    mut slot: DerivedSlot<V>,
    source: &dyn SlotSource,
    project: &F,
    side: Side,
) -> Result<DerivedSlot<V>, SlotError>
where
    V: SlotValue,
    F: Fn(&SourceSlot) -> DerivedSlot<V>,
{
    for _ in 0..MAX_EXTEND_STEPS {
        let boundary = match side {
            Side::Left => slot.time_range.lower(),
            Side::Right => slot.time_range.upper(),
        };
        let Some(boundary) = boundary else {
            return Ok(slot);
        };
        let adjacent = match side {
            Side::Left => source.find_adjacent_ending_at(&slot.machine, boundary)?,
            Side::Right => source.find_adjacent_starting_at(&slot.machine, boundary)?,
        };
        let Some(adjacent) = adjacent else {
            return Ok(slot);
        };
        let candidate = project(&adjacent);
        if candidate.time_range.is_empty() {
            tracing::error!(
                machine = %candidate.machine,
                range = %candidate.time_range,
                "adjacent slot with empty range, stopping extension"
            );
            return Ok(slot);
        }
        if !slot.reference_data_equals(&candidate)?
            || !slot.time_range.is_adjacent_to(&candidate.time_range)
        {
            return Ok(slot);
        }
        slot = match side {
            Side::Left => candidate.join(slot),
            Side::Right => slot.join(candidate),
        };
    }
    tracing::warn!(
        machine = %slot.machine,
        range = %slot.time_range,
        steps = MAX_EXTEND_STEPS,
        "slot extension stopped at step limit"
    );
    Ok(slot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTimeline;
    use crate::range::{DayRange, TimeRange};
    use crate::testing::SlotBuilder;
    use crate::types::MachineId;
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    #[derive(Debug, Clone, PartialEq)]
    struct Color(String);

    impl SlotValue for Color {
        fn reference_equals(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }

    fn project(slot: &SourceSlot) -> DerivedSlot<Color> {
        DerivedSlot::new(
            slot.machine.clone(),
            slot.time_range,
            slot.day_range,
            Color(slot.color.clone()),
        )
    }

    fn t(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
    }

    fn range(from: (u32, u32), to: (u32, u32)) -> TimeRange {
        TimeRange::closed_open(t(from.0, from.1), t(to.0, to.1)).unwrap()
    }

    fn derived(from: (u32, u32), to: (u32, u32), color: &str) -> DerivedSlot<Color> {
        DerivedSlot::new(
            MachineId::new("m1").unwrap(),
            range(from, to),
            DayRange::single(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()),
            Color(color.to_string()),
        )
    }

    fn timeline(slots: &[((u32, u32), (u32, u32), &str)]) -> MemoryTimeline {
        let mut timeline = MemoryTimeline::new();
        for (from, to, color) in slots {
            timeline.insert_slot(
                SlotBuilder::new("m1", t(from.0, from.1), Some(t(to.0, to.1)))
                    .color(color)
                    .build(),
            );
        }
        timeline
    }

    #[test]
    fn adjacent_equal_slots_merge_into_one() {
        let merged = merge_slots(vec![
            derived((8, 0), (9, 0), "green"),
            derived((9, 0), (9, 30), "green"),
            derived((9, 30), (10, 0), "green"),
        ])
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].time_range, range((8, 0), (10, 0)));
    }

    #[test]
    fn differing_or_gapped_slots_stay_separate_and_ordered() {
        let merged = merge_slots(vec![
            derived((8, 0), (9, 0), "green"),
            derived((9, 0), (9, 30), "red"),
            derived((10, 0), (11, 0), "red"),
        ])
        .unwrap();
        let ranges: Vec<_> = merged.iter().map(|s| s.time_range).collect();
        assert_eq!(
            ranges,
            vec![range((8, 0), (9, 0)), range((9, 0), (9, 30)), range((10, 0), (11, 0))]
        );
    }

    #[test]
    fn merging_a_merged_list_is_idempotent() {
        let once = merge_slots(vec![
            derived((8, 0), (9, 0), "green"),
            derived((9, 0), (9, 30), "green"),
            derived((9, 30), (10, 0), "red"),
            derived((10, 0), (10, 15), "green"),
            derived((10, 30), (11, 0), "green"),
        ])
        .unwrap();
        let twice = merge_slots(once.clone()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 4);
    }

    #[test]
    fn empty_slot_is_absorbed() {
        let merged = merge_slots(vec![
            derived((8, 0), (9, 0), "green"),
            derived((9, 0), (9, 0), "red"),
            derived((9, 0), (10, 0), "green"),
        ])
        .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].time_range, range((8, 0), (10, 0)));
    }

    #[test]
    fn merge_rejects_mixed_machines() {
        let mut other = derived((9, 0), (10, 0), "green");
        other.machine = MachineId::new("m2").unwrap();
        let err = merge_slots(vec![derived((8, 0), (9, 0), "green"), other]).unwrap_err();
        assert!(matches!(err, SlotError::MachineMismatch { .. }));
    }

    #[test]
    fn extend_left_pulls_in_equal_neighbours_until_value_changes() {
        let source = timeline(&[
            ((6, 0), (7, 0), "red"),
            ((7, 0), (8, 0), "green"),
            ((8, 0), (9, 0), "green"),
            ((9, 0), (10, 0), "green"),
        ]);
        let slot = derived((9, 0), (10, 0), "green");
        let extended = extend_left(slot, &source, project).unwrap();
        assert_eq!(extended.time_range, range((7, 0), (10, 0)));
    }

    #[test]
    fn extend_left_is_a_fixed_point() {
        let source = timeline(&[
            ((6, 0), (7, 0), "red"),
            ((7, 0), (8, 0), "green"),
            ((8, 0), (9, 0), "green"),
        ]);
        let once = extend_left(derived((8, 0), (9, 0), "green"), &source, project).unwrap();
        let twice = extend_left(once.clone(), &source, project).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn extend_right_is_a_fixed_point_and_stops_at_gaps() {
        let source = timeline(&[
            ((8, 0), (9, 0), "green"),
            ((9, 0), (10, 0), "green"),
            ((10, 30), (11, 0), "green"),
        ]);
        let once = extend_right(derived((8, 0), (9, 0), "green"), &source, project).unwrap();
        assert_eq!(once.time_range, range((8, 0), (10, 0)));
        let twice = extend_right(once.clone(), &source, project).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn extension_stops_on_unbounded_side() {
        let mut timeline = MemoryTimeline::new();
        timeline.insert_slot(SlotBuilder::new("m1", t(8, 0), None).color("green").build());
        let open = project(&timeline.slots_of(&MachineId::new("m1").unwrap())[0]);
        let extended = extend_right(open.clone(), &timeline, project).unwrap();
        assert_eq!(extended, open);
    }
}
