//! Running-duration command.

use std::io::Write;

use anyhow::Result;
use mt_cache::RunningDuration;
use mt_core::{MachineId, TimeRange};
use serde::Serialize;

use super::util::format_seconds;
use crate::app::App;

#[derive(Debug, Serialize)]
struct JsonRunningDuration<'a> {
    machine: &'a MachineId,
    range: String,
    running_seconds: f64,
}

pub fn run<W: Write>(
    writer: &mut W,
    app: &App,
    machine: &MachineId,
    range: &TimeRange,
    json: bool,
) -> Result<()> {
    let seconds = app
        .requests
        .get(&RunningDuration::new(machine.clone(), *range))?;

    if json {
        let report = JsonRunningDuration {
            machine,
            range: range.to_string(),
            running_seconds: seconds,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(writer, "{machine} ran {} in {range}", format_seconds(seconds))?;
    }
    Ok(())
}
