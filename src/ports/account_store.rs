//! Account Store port
//!
//! Source of leagues, rosters and per-member accounts. Implementations own
//! persistence and trade execution; the standings core only reads.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Account, AccountId, League, LeagueId, LeagueMember, UserId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// League, member or account does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backend unreachable or failed
    #[error("Account store unavailable: {0}")]
    Unavailable(String),
}

/// Read access to league state
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fetch league metadata
    async fn get_league(&self, league_id: LeagueId) -> Result<League, StoreError>;

    /// Active members of a league
    async fn list_members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, StoreError>;

    /// Account for one (user, league) pair
    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError>;

    /// Every league the user has been a member of, newest first
    async fn list_leagues_for_user(&self, user_id: UserId) -> Result<Vec<League>, StoreError>;
}
