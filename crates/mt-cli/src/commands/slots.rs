//! Slots command: merged slots overlapping a range.

use std::io::Write;

use anyhow::Result;
use mt_core::{
    ColorProjection, ColorValue, DerivedSlot, MachineId, MachineModeProjection, MachineModeValue,
    RunningProjection, RunningState, RunningStatus, SlotProjection, TimeRange,
};
use serde::Serialize;

use crate::app::App;
use crate::cli::View;

/// Human-readable rendering of a slot value.
pub trait Describe {
    fn describe(&self) -> String;

    /// Extra indented lines printed below the slot.
    fn details(&self) -> Vec<String> {
        Vec::new()
    }
}

impl Describe for MachineModeValue {
    fn describe(&self) -> String {
        self.machine_mode.to_string()
    }

    fn details(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .reasons
            .iter()
            .filter(|r| !r.value.is_default)
            .map(|r| match &r.value.details {
                Some(details) => format!("reason {} ({details}) {}", r.value.reason, r.time_range),
                None => format!("reason {} {}", r.value.reason, r.time_range),
            })
            .collect();
        if self.observation_states.len() > 1 {
            lines.extend(
                self.observation_states
                    .iter()
                    .map(|s| format!("state {} {}", s.value, s.time_range)),
            );
        }
        lines
    }
}

impl Describe for RunningState {
    fn describe(&self) -> String {
        match self.status() {
            RunningStatus::Running => "running".to_string(),
            RunningStatus::NotRunning => "not running".to_string(),
            RunningStatus::Unknown if self.is_consistent() => "unknown".to_string(),
            RunningStatus::Unknown => "unknown (contradictory flags)".to_string(),
        }
    }
}

impl Describe for ColorValue {
    fn describe(&self) -> String {
        let running = if self.running { "running" } else { "not running" };
        format!("{}, {running}", self.color)
    }
}

/// Writes slots one per line, or as a JSON array.
pub fn write_slots<W, V>(writer: &mut W, slots: &[DerivedSlot<V>], json: bool) -> Result<()>
where
    W: Write,
    V: Describe + Serialize,
{
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(slots)?)?;
        return Ok(());
    }
    for slot in slots {
        writeln!(writer, "{}  {}", slot.time_range, slot.value.describe())?;
        for line in slot.value.details() {
            writeln!(writer, "    {line}")?;
        }
    }
    Ok(())
}

/// What to list.
#[derive(Debug, Clone)]
pub struct SlotsQuery {
    pub machine: MachineId,
    pub range: TimeRange,
    pub view: View,
    pub extend: bool,
    /// Cut the returned slots down to the queried range.
    pub clip: bool,
}

pub fn run<W: Write>(writer: &mut W, app: &App, query: &SlotsQuery, json: bool) -> Result<()> {
    match query.view {
        View::Mode => render::<MachineModeProjection, W>(writer, app, query, json),
        View::Running => render::<RunningProjection, W>(writer, app, query, json),
        View::Color => render::<ColorProjection, W>(writer, app, query, json),
    }
}

fn render<P, W>(writer: &mut W, app: &App, query: &SlotsQuery, json: bool) -> Result<()>
where
    P: SlotProjection,
    P::Value: Describe + Serialize,
    W: Write,
{
    let mut slots =
        P::find_overlaps_range(app.timeline.as_ref(), &query.machine, &query.range, query.extend)?;
    if query.clip {
        slots = slots
            .iter()
            .filter_map(|slot| slot.restrict_to(&query.range, app.days.as_ref()))
            .collect();
    }
    if slots.is_empty() && !json {
        writeln!(writer, "No slots for {} in {}.", query.machine, query.range)?;
        return Ok(());
    }
    write_slots(writer, &slots, json)
}
