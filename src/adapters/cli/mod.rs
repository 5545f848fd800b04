//! CLI Adapter
//!
//! Command-line interface for league standings.
//! Uses clap derive macros for argument parsing.

mod commands;
pub mod render;

pub use commands::{
    CliApp, Command, HistoryCmd, LeaderboardCmd, MembersCmd, OutputFormat, ValuateCmd,
};

use anyhow::Result;

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
