//! CLI subcommand implementations.

pub mod at;
pub mod is_descendant;
pub mod running_duration;
pub mod slots;
pub mod util;
pub mod utilization;
