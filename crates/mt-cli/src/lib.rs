//! Machine timeline CLI library.
//!
//! This crate provides the CLI interface over the timeline and request crates.

mod app;
mod cli;
pub mod commands;
mod config;
pub mod timeline;

pub use app::App;
pub use cli::{Cli, Commands, View};
pub use config::Config;
