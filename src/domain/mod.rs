//! Domain Layer - Core business logic for league standings
//!
//! Pure types and math with no I/O. All external interactions happen
//! through the ports layer.
//!
//! - `account`: per-league cash and holdings, buy/sell rules
//! - `trade`: transaction ledger and replay
//! - `league`: league lifecycle (DRAFT → ACTIVE → ENDED)
//! - `valuation`: portfolio valuation against current prices
//! - `leaderboard`: ranking of member valuations

pub mod account;
pub mod trade;
pub mod league;
pub mod valuation;
pub mod leaderboard;

pub use account::{Account, AccountError, AccountId, Holding, LeagueId, UserId};
pub use trade::{replay_ledger, ReplayError, TradeSide, Transaction};
pub use league::{League, LeagueError, LeagueMember, LeagueStatus};
pub use valuation::{
    percent_of, valuate_account, HoldingValuation, PortfolioValuation, ValuationError,
};
pub use leaderboard::{rank_standings, LeaderboardEntry, LeagueSummary, MemberStanding};
