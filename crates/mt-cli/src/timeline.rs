//! Timeline file loading.
//!
//! The file is JSON with three lists: `modes`, `slots` and, optionally,
//! `summaries`. Without summaries, they are rebuilt from the slots.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use mt_core::{
    DayResolver, DaySummary, MachineId, MachineMode, MachineModeId, MemoryTimeline,
    ObservationStateId, ReasonId, SourceSlot, TimeRange,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TimelineFile {
    #[serde(default)]
    pub modes: Vec<MachineMode>,
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
    #[serde(default)]
    pub summaries: Vec<SummaryRecord>,
}

/// One recorded slot; `end` is absent while the slot is still open.
#[derive(Debug, Deserialize)]
pub struct SlotRecord {
    pub machine: MachineId,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    pub machine_mode: MachineModeId,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub not_running: bool,
    pub reason: ReasonId,
    #[serde(default)]
    pub reason_details: Option<String>,
    #[serde(default)]
    pub is_default_reason: bool,
    pub observation_state: ObservationStateId,
    pub color: String,
}

#[derive(Debug, Deserialize)]
pub struct SummaryRecord {
    pub machine: MachineId,
    pub machine_mode: MachineModeId,
    pub day: NaiveDate,
    pub total_seconds: f64,
}

impl SlotRecord {
    fn into_source_slot(self, days: &dyn DayResolver) -> Result<SourceSlot> {
        let time_range = TimeRange::new(Some(self.start), self.end, true, false)
            .with_context(|| {
                format!("slot of {} starting {} ends before it starts", self.machine, self.start)
            })?;
        Ok(SourceSlot {
            machine: self.machine,
            time_range,
            day_range: days.resolve_day_range(&time_range),
            machine_mode: self.machine_mode,
            running: self.running,
            not_running: self.not_running,
            reason: self.reason,
            reason_details: self.reason_details,
            is_default_reason: self.is_default_reason,
            observation_state: self.observation_state,
            color: self.color,
        })
    }
}

/// Builds a timeline from parsed file contents.
pub fn build_timeline(
    file: TimelineFile,
    days: &dyn DayResolver,
    now: DateTime<Utc>,
) -> Result<MemoryTimeline> {
    let mut timeline = MemoryTimeline::new();
    for mode in file.modes {
        timeline.insert_mode(mode);
    }
    let slot_count = file.slots.len();
    for record in file.slots {
        timeline.insert_slot(record.into_source_slot(days)?);
    }
    if file.summaries.is_empty() {
        let written = timeline.rebuild_day_summaries(days, now);
        tracing::debug!(slots = slot_count, summaries = written, "rebuilt day summaries");
    } else {
        for record in file.summaries {
            timeline.insert_summary(
                record.machine,
                DaySummary {
                    machine_mode: record.machine_mode,
                    day: record.day,
                    total_seconds: record.total_seconds,
                },
            );
        }
    }
    Ok(timeline)
}

/// Reads and builds the timeline stored at `path`.
pub fn load_timeline(
    path: &Path,
    days: &dyn DayResolver,
    now: DateTime<Utc>,
) -> Result<MemoryTimeline> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read timeline {}", path.display()))?;
    let file: TimelineFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse timeline {}", path.display()))?;
    build_timeline(file, days, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mt_core::{DayRange, DaySummaryStore, PlantDayResolver, SlotSource};

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    const FILE: &str = r#"{
        "modes": [{"id": "production", "name": "Production", "running": true}],
        "slots": [
            {"machine": "m1", "start": "2025-03-10T08:00:00Z", "end": "2025-03-10T09:00:00Z",
             "machine_mode": "production", "running": true, "reason": "none",
             "is_default_reason": true, "observation_state": "available", "color": "green"},
            {"machine": "m1", "start": "2025-03-10T09:00:00Z",
             "machine_mode": "production", "running": true, "reason": "none",
             "observation_state": "available", "color": "green"}
        ]
    }"#;

    #[test]
    fn builds_slots_and_rebuilds_summaries() {
        let file: TimelineFile = serde_json::from_str(FILE).unwrap();
        let timeline = build_timeline(file, &PlantDayResolver::default(), t(12)).unwrap();
        let m1 = MachineId::new("m1").unwrap();

        let open = timeline.find_at(&m1, t(11)).unwrap().unwrap();
        assert!(open.time_range.is_upper_unbounded());

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let summaries = timeline.find_day_summaries(&m1, &DayRange::single(day)).unwrap();
        assert_eq!(summaries.len(), 1);
        assert!((summaries[0].total_seconds - 4.0 * 3600.0).abs() < f64::EPSILON);
    }

    #[test]
    fn inverted_slot_is_an_error() {
        let file: TimelineFile = serde_json::from_str(
            r#"{"slots": [{"machine": "m1", "start": "2025-03-10T09:00:00Z", "end": "2025-03-10T08:00:00Z",
                "machine_mode": "production", "reason": "none",
                "observation_state": "available", "color": "green"}]}"#,
        )
        .unwrap();
        let err = build_timeline(file, &PlantDayResolver::default(), t(12)).unwrap_err();
        assert!(err.to_string().contains("ends before it starts"));
    }

    #[test]
    fn blank_machine_is_rejected_while_parsing() {
        let result: Result<TimelineFile, _> = serde_json::from_str(
            r#"{"slots": [{"machine": " ", "start": "2025-03-10T09:00:00Z",
                "machine_mode": "production", "reason": "none",
                "observation_state": "available", "color": "green"}]}"#,
        );
        assert!(result.is_err());
    }
}
