//! league-standings - Fantasy stock league leaderboard
//!
//! Values member portfolios and ranks leagues from a snapshot file and an
//! optional quote API.

use anyhow::Result;
use clap::Parser;

use league_standings::adapters::cli::{self, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API token goes here, not in the config)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::execute(app).await
}
