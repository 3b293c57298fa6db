//! Mode hierarchy check.

use std::io::Write;

use anyhow::Result;
use mt_cache::IsDescendantOrSelfOf;
use mt_core::MachineModeId;
use serde::Serialize;

use crate::app::App;

#[derive(Debug, Serialize)]
struct JsonAnswer<'a> {
    ancestor: &'a MachineModeId,
    descendant: &'a MachineModeId,
    is_descendant_or_self: bool,
}

pub fn run<W: Write>(
    writer: &mut W,
    app: &App,
    ancestor: &MachineModeId,
    descendant: &MachineModeId,
    json: bool,
) -> Result<()> {
    let answer = app
        .requests
        .get(&IsDescendantOrSelfOf::new(ancestor.clone(), descendant.clone()))?;

    if json {
        let report = JsonAnswer {
            ancestor,
            descendant,
            is_descendant_or_self: answer,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else if answer {
        writeln!(writer, "{descendant} is {ancestor} or nested below it")?;
    } else {
        writeln!(writer, "{descendant} is not below {ancestor}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::fixture;
    use insta::assert_snapshot;

    fn output(ancestor: &str, descendant: &str) -> String {
        let mut buf = Vec::new();
        run(
            &mut buf,
            &fixture::app(),
            &MachineModeId::new(ancestor).unwrap(),
            &MachineModeId::new(descendant).unwrap(),
            false,
        )
        .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn nested_mode() {
        assert_snapshot!(output("stopped", "setup"), @"setup is stopped or nested below it");
    }

    #[test]
    fn sibling_modes_are_unrelated() {
        assert_snapshot!(output("idle", "setup"), @"setup is not below idle");
    }
}
