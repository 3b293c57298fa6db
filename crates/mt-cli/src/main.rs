use std::io::{self, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use mt_core::MachineModeId;
use tracing_subscriber::EnvFilter;

use mt_cli::commands::util::{parse_datetime, parse_machine, parse_range};
use mt_cli::commands::{at, is_descendant, running_duration, slots, utilization};
use mt_cli::{App, Cli, Commands, Config};

/// Load config and the timeline it points at.
fn open_app(cli: &Cli) -> Result<App> {
    let mut config =
        Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = &cli.timeline {
        config.timeline_path.clone_from(path);
    }
    tracing::debug!(?config, "loaded configuration");

    let now = cli
        .now
        .as_deref()
        .map(|now| parse_datetime(now, Utc::now()))
        .transpose()
        .context("invalid --now")?;
    App::open(&config, now)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(Commands::Slots {
            machine,
            from,
            to,
            view,
            extend,
            clip,
            json,
        }) => {
            let app = open_app(&cli)?;
            let query = slots::SlotsQuery {
                machine: parse_machine(machine)?,
                range: parse_range(from, to.as_deref(), app.now())?,
                view: *view,
                extend: *extend,
                clip: *clip,
            };
            slots::run(&mut stdout, &app, &query, *json)?;
        }
        Some(Commands::At {
            machine,
            time,
            view,
            extend,
            json,
        }) => {
            let app = open_app(&cli)?;
            let at: DateTime<Utc> = parse_datetime(time, app.now())?;
            at::run(&mut stdout, &app, &parse_machine(machine)?, at, *view, *extend, *json)?;
        }
        Some(Commands::RunningDuration {
            machine,
            from,
            to,
            json,
        }) => {
            let app = open_app(&cli)?;
            let range = parse_range(from, to.as_deref(), app.now())?;
            running_duration::run(&mut stdout, &app, &parse_machine(machine)?, &range, *json)?;
        }
        Some(Commands::Utilization { machine, json }) => {
            let app = open_app(&cli)?;
            let machine = machine.as_deref().map(parse_machine).transpose()?;
            utilization::run(&mut stdout, &app, machine.as_ref(), *json)?;
        }
        Some(Commands::IsDescendant {
            ancestor,
            descendant,
            json,
        }) => {
            let app = open_app(&cli)?;
            let ancestor = MachineModeId::new(ancestor.as_str()).context("invalid ancestor mode")?;
            let descendant =
                MachineModeId::new(descendant.as_str()).context("invalid descendant mode")?;
            is_descendant::run(&mut stdout, &app, &ancestor, &descendant, *json)?;
        }
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            writeln!(stdout)?;
        }
    }

    Ok(())
}
