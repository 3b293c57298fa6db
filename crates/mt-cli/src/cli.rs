//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Machine timeline analytics.
///
/// Loads a recorded machine timeline and answers questions about merged
/// slots, running time, utilization and the machine mode hierarchy.
#[derive(Debug, Parser)]
#[command(name = "mt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the timeline file (overrides the configured one).
    #[arg(short, long, global = true)]
    pub timeline: Option<PathBuf>,

    /// Evaluate as if it were this instant (ISO 8601).
    #[arg(long, global = true)]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which merged view of the timeline to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Machine mode, with reason and observation-state runs.
    Mode,
    /// Running / not running.
    Running,
    /// Display color.
    Color,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List merged slots overlapping a time range.
    Slots {
        /// Machine to query.
        #[arg(short, long)]
        machine: String,

        /// Range start (ISO 8601 or e.g. '2 hours ago').
        #[arg(long)]
        from: String,

        /// Range end; open-ended when omitted.
        #[arg(long)]
        to: Option<String>,

        /// View to merge by.
        #[arg(long, value_enum, default_value_t = View::Mode)]
        view: View,

        /// Grow the first and last slot beyond the range.
        #[arg(long)]
        extend: bool,

        /// Cut slots down to the range.
        #[arg(long, conflicts_with = "extend")]
        clip: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the merged slot covering an instant.
    At {
        /// Machine to query.
        #[arg(short, long)]
        machine: String,

        /// Instant to look up (ISO 8601 or e.g. '2 hours ago').
        #[arg(long)]
        time: String,

        /// View to merge by.
        #[arg(long, value_enum, default_value_t = View::Mode)]
        view: View,

        /// Grow the slot over equal neighbours.
        #[arg(long)]
        extend: bool,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Total running time of a machine within a range.
    RunningDuration {
        /// Machine to query.
        #[arg(short, long)]
        machine: String,

        /// Range start (ISO 8601 or e.g. '2 hours ago').
        #[arg(long)]
        from: String,

        /// Range end; up to now when omitted.
        #[arg(long)]
        to: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Share of running time from the start of today.
    Utilization {
        /// Machine to query; every machine when omitted.
        #[arg(short, long)]
        machine: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check whether one machine mode is nested below another.
    IsDescendant {
        /// The enclosing mode.
        #[arg(long)]
        ancestor: String,

        /// The mode to test.
        #[arg(long)]
        descendant: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
