//! CLI Adapter
//!
//! Command-line interface for the NASDANQ leaderboard.
//! Uses clap derive macros for argument parsing.

mod commands;
pub mod render;

pub use commands::{
    parse_watch_input, CliApp, Command, OutputFormat, StatsCmd, TableArgs, TokenCmd, TopCmd,
    WatchCmd, WatchInput, WATCH_HELP,
};

use anyhow::Result;

use crate::config::Config;

/// Initialize the CLI application
pub fn init() -> CliApp {
    use clap::Parser;
    CliApp::parse()
}

/// Execute the CLI command
pub async fn execute(app: CliApp, config: Config) -> Result<()> {
    commands::execute(app, config).await
}
