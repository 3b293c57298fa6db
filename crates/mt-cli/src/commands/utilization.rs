//! Utilization command for one machine or the whole fleet.

use std::io::Write;

use anyhow::Result;
use mt_cache::UtilizationPercentage;
use mt_core::MachineId;
use rayon::prelude::*;
use serde::Serialize;

use super::util::format_percent;
use crate::app::App;

#[derive(Debug, Serialize)]
pub struct MachineUtilization {
    pub machine: MachineId,
    pub utilization: f64,
}

/// Computes utilization per machine, one request per machine in parallel.
pub fn compute(app: &App, machines: &[MachineId]) -> Result<Vec<MachineUtilization>> {
    let results = machines
        .par_iter()
        .map(|machine| {
            app.requests
                .get(&UtilizationPercentage::new(machine.clone()))
                .map(|utilization| MachineUtilization {
                    machine: machine.clone(),
                    utilization,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(results)
}

pub fn run<W: Write>(
    writer: &mut W,
    app: &App,
    machine: Option<&MachineId>,
    json: bool,
) -> Result<()> {
    let machines = match machine {
        Some(machine) => vec![machine.clone()],
        None => app.timeline.machines(),
    };
    tracing::debug!(machines = machines.len(), "computing utilization");
    let rows = compute(app, &machines)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }
    if rows.is_empty() {
        writeln!(writer, "No machines recorded.")?;
        return Ok(());
    }
    let width = rows.iter().map(|r| r.machine.as_str().len()).max().unwrap_or(0);
    for row in rows {
        writeln!(
            writer,
            "{:<width$}  {:>6}",
            row.machine.as_str(),
            format_percent(row.utilization)
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fixture;
    use insta::assert_snapshot;

    fn output(machine: Option<&str>, json: bool) -> String {
        let machine = machine.map(|m| MachineId::new(m).unwrap());
        let mut buf = Vec::new();
        run(&mut buf, &fixture::app(), machine.as_ref(), json).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn fleet_report_lists_every_machine() {
        assert_snapshot!(output(None, false), @r"
        press-1   91.7%
        press-2    0.0%
        ");
    }

    #[test]
    fn machine_without_data_is_fully_utilized() {
        assert_snapshot!(output(Some("press-9"), false), @"press-9  100.0%");
    }

    #[test]
    fn json_rows() {
        let rows: serde_json::Value = serde_json::from_str(&output(Some("press-2"), true)).unwrap();
        assert_eq!(rows[0]["machine"], "press-2");
        assert_eq!(rows[0]["utilization"], 0.0);
    }
}
