//! At command: the merged slot covering one instant.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use mt_core::{ColorProjection, MachineId, MachineModeProjection, RunningProjection, SlotProjection};
use serde::Serialize;

use super::slots::{Describe, write_slots};
use crate::app::App;
use crate::cli::View;

pub fn run<W: Write>(
    writer: &mut W,
    app: &App,
    machine: &MachineId,
    at: DateTime<Utc>,
    view: View,
    extend: bool,
    json: bool,
) -> Result<()> {
    match view {
        View::Mode => render::<MachineModeProjection, W>(writer, app, machine, at, extend, json),
        View::Running => render::<RunningProjection, W>(writer, app, machine, at, extend, json),
        View::Color => render::<ColorProjection, W>(writer, app, machine, at, extend, json),
    }
}

fn render<P, W>(
    writer: &mut W,
    app: &App,
    machine: &MachineId,
    at: DateTime<Utc>,
    extend: bool,
    json: bool,
) -> Result<()>
where
    P: SlotProjection,
    P::Value: Describe + Serialize,
    W: Write,
{
    match P::find_at(app.timeline.as_ref(), machine, at, extend)? {
        Some(slot) => write_slots(writer, std::slice::from_ref(&slot), json),
        None if json => {
            writeln!(writer, "[]")?;
            Ok(())
        }
        None => {
            writeln!(writer, "No slot for {machine} at {}.", at.to_rfc3339())?;
            Ok(())
        }
    }
}
