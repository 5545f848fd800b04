//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the league standings tool.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::render;
use crate::adapters::rest_quotes::RestQuoteClient;
use crate::adapters::snapshot::load_snapshot;
use crate::application::{StandingsService, ValuationSettings};
use crate::config::{load_config, Config};
use crate::domain::{AccountId, LeagueId, UserId};
use crate::ports::QuoteSource;

const DEFAULT_CONFIG: &str = "config/league.toml";

/// league-standings - Fantasy stock league valuation and leaderboard
#[derive(Parser, Debug)]
#[command(
    name = "league-standings",
    version = env!("CARGO_PKG_VERSION"),
    about = "Portfolio valuation and leaderboards for fantasy stock leagues",
    long_about = "league-standings values every member's holdings against current quotes \
                  and ranks the league by return. Members whose data cannot be loaded \
                  are reported at the bottom instead of failing the whole board."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Rank all members of a league
    Leaderboard(LeaderboardCmd),

    /// Value one member's portfolio
    Valuate(ValuateCmd),

    /// List a league's members
    Members(MembersCmd),

    /// Show a user's result in every league they joined
    History(HistoryCmd),
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Leaderboard(cmd) => &cmd.config,
            Command::Valuate(cmd) => &cmd.config,
            Command::Members(cmd) => &cmd.config,
            Command::History(cmd) => &cmd.config,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Rank a league
#[derive(Parser, Debug)]
pub struct LeaderboardCmd {
    /// League ID
    #[arg(short, long, value_name = "ID")]
    pub league: LeagueId,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Value one account
#[derive(Parser, Debug)]
pub struct ValuateCmd {
    /// League ID
    #[arg(short, long, value_name = "ID")]
    pub league: LeagueId,

    /// User ID
    #[arg(short, long, value_name = "ID")]
    pub user: UserId,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// List league members
#[derive(Parser, Debug)]
pub struct MembersCmd {
    /// League ID
    #[arg(short, long, value_name = "ID")]
    pub league: LeagueId,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,
}

/// Show one user's league history
#[derive(Parser, Debug)]
pub struct HistoryCmd {
    /// User ID
    #[arg(short, long, value_name = "ID")]
    pub user: UserId,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_config(app.command.config_path()).with_context(|| {
        format!(
            "Failed to load configuration from {}",
            app.command.config_path().display()
        )
    })?;

    // Initialize logging based on flags, falling back to the config level
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    let service = build_service(&config).await?;

    match app.command {
        Command::Leaderboard(cmd) => leaderboard_command(&service, cmd).await,
        Command::Valuate(cmd) => valuate_command(&service, cmd).await,
        Command::Members(cmd) => members_command(&service, cmd).await,
        Command::History(cmd) => history_command(&service, cmd).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, config_level: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        config_level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Wire the snapshot store and the configured quote source into a service
async fn build_service(config: &Config) -> Result<StandingsService> {
    let snapshot_path = config.store.expanded_snapshot_path();
    let snapshot = load_snapshot(&snapshot_path)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;
    let (store, snapshot_quotes) = snapshot
        .into_adapters()
        .await
        .context("Invalid snapshot")?;

    let quotes: Arc<dyn QuoteSource> = match config.quotes.get_api_url() {
        Some(url) => {
            tracing::info!("Using quote API at {}", url);
            let client = RestQuoteClient::new(
                url,
                config.quotes.get_api_token(),
                Duration::from_millis(config.quotes.request_timeout_ms),
            )
            .context("Failed to create quote client")?;
            Arc::new(client)
        }
        None => {
            tracing::info!("No quote API configured, using snapshot prices");
            Arc::new(snapshot_quotes)
        }
    };

    Ok(StandingsService::new(
        Arc::new(store),
        quotes,
        ValuationSettings::from(config),
    ))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Handle leaderboard command
async fn leaderboard_command(service: &StandingsService, cmd: LeaderboardCmd) -> Result<()> {
    let entries = service
        .get_leaderboard(cmd.league)
        .await
        .with_context(|| format!("Failed to build leaderboard for league {}", cmd.league))?;

    match cmd.format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Text => {
            println!("{}", render::leaderboard_table(cmd.league, &entries));
            Ok(())
        }
    }
}

/// Handle valuate command
async fn valuate_command(service: &StandingsService, cmd: ValuateCmd) -> Result<()> {
    let id = AccountId::new(cmd.user, cmd.league);
    let valuation = service
        .valuate(id)
        .await
        .with_context(|| format!("Failed to value {}", id))?;

    match cmd.format {
        OutputFormat::Json => print_json(&valuation),
        OutputFormat::Text => {
            println!("{}", render::valuation_report(&valuation));
            Ok(())
        }
    }
}

/// Handle members command
async fn members_command(service: &StandingsService, cmd: MembersCmd) -> Result<()> {
    let members = service
        .members(cmd.league)
        .await
        .with_context(|| format!("Failed to list members of league {}", cmd.league))?;

    println!("{}", render::members_list(cmd.league, &members));
    Ok(())
}

/// Handle history command
async fn history_command(service: &StandingsService, cmd: HistoryCmd) -> Result<()> {
    let history = service
        .league_history(cmd.user)
        .await
        .with_context(|| format!("Failed to load league history for user {}", cmd.user))?;

    match cmd.format {
        OutputFormat::Json => print_json(&history),
        OutputFormat::Text => {
            println!("{}", render::history_table(cmd.user, &history));
            Ok(())
        }
    }
}
