//! Standings Service
//!
//! Public entry point: single-account valuation and the league leaderboard.
//! Holds no state between calls; every request recomputes from the store
//! and the quote source.

use std::sync::Arc;
use std::time::Duration;

use futures::future::try_join_all;
use thiserror::Error;

use super::roster::RosterAggregator;
use super::valuator::PortfolioValuator;
use crate::config::Config;
use crate::domain::{
    rank_standings, AccountId, LeaderboardEntry, LeagueId, LeagueMember, LeagueSummary,
    PortfolioValuation, UserId, ValuationError,
};
use crate::ports::{AccountStore, QuoteSource, StoreError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StandingsError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Account store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Valuation failed for user {user_id}: {reason}")]
    MemberValuationFailed { user_id: UserId, reason: String },

    #[error("Valuation timed out")]
    Timeout,

    #[error(transparent)]
    Valuation(#[from] ValuationError),
}

impl From<StoreError> for StandingsError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => StandingsError::NotFound(what),
            StoreError::Unavailable(msg) => StandingsError::StoreUnavailable(msg),
        }
    }
}

/// Timeouts applied to each unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValuationSettings {
    /// Budget for one member's full valuation
    pub member_timeout: Duration,
    /// Budget for one quote lookup
    pub quote_timeout: Duration,
}

impl Default for ValuationSettings {
    fn default() -> Self {
        Self {
            member_timeout: Duration::from_millis(5000),
            quote_timeout: Duration::from_millis(2000),
        }
    }
}

impl From<&Config> for ValuationSettings {
    fn from(config: &Config) -> Self {
        Self {
            member_timeout: Duration::from_millis(config.valuation.member_timeout_ms),
            quote_timeout: Duration::from_millis(config.valuation.quote_timeout_ms),
        }
    }
}

#[derive(Clone)]
pub struct StandingsService {
    store: Arc<dyn AccountStore>,
    valuator: PortfolioValuator,
    roster: RosterAggregator,
    settings: ValuationSettings,
}

impl StandingsService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        quotes: Arc<dyn QuoteSource>,
        settings: ValuationSettings,
    ) -> Self {
        let valuator = PortfolioValuator::new(store.clone(), quotes, settings.quote_timeout);
        let roster =
            RosterAggregator::new(store.clone(), valuator.clone(), settings.member_timeout);
        Self {
            store,
            valuator,
            roster,
            settings,
        }
    }

    /// Value a single account.
    ///
    /// Bounded by the member timeout like any leaderboard entry.
    pub async fn valuate(&self, id: AccountId) -> Result<PortfolioValuation, StandingsError> {
        tokio::time::timeout(self.settings.member_timeout, self.valuator.valuate(id))
            .await
            .map_err(|_| StandingsError::Timeout)?
    }

    /// Active members of a league, one entry per user
    pub async fn members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, StandingsError> {
        self.roster.members(league_id).await
    }

    /// Rank every member of a league by return.
    ///
    /// Members whose valuation fails are listed last as degraded entries.
    /// Only an unknown league or an unreachable store fails the call.
    pub async fn get_leaderboard(
        &self,
        league_id: LeagueId,
    ) -> Result<Vec<LeaderboardEntry>, StandingsError> {
        let league = self.store.get_league(league_id).await?;
        tracing::info!(
            "Building leaderboard for league {} ({}, {})",
            league.id,
            league.name,
            league.status
        );

        let standings = self.roster.collect(league_id).await?;
        let entries = rank_standings(standings);

        let degraded = entries.iter().filter(|e| e.is_degraded()).count();
        if degraded > 0 {
            tracing::warn!(
                "Leaderboard for league {}: {} of {} members degraded",
                league_id,
                degraded,
                entries.len()
            );
        } else {
            tracing::info!(
                "Leaderboard for league {}: {} members ranked",
                league_id,
                entries.len()
            );
        }
        Ok(entries)
    }

    /// The user's result in every league they have been in, newest first.
    ///
    /// Each league's board is rebuilt from current prices; a degraded
    /// valuation still reports the user's rank.
    pub async fn league_history(
        &self,
        user_id: UserId,
    ) -> Result<Vec<LeagueSummary>, StandingsError> {
        let leagues = self.store.list_leagues_for_user(user_id).await?;
        tracing::debug!("User {} has been in {} leagues", user_id, leagues.len());

        try_join_all(leagues.iter().map(|league| async move {
            let board = self.get_leaderboard(league.id).await?;
            Ok::<_, StandingsError>(LeagueSummary::from_board(league, user_id, &board))
        }))
        .await
    }
}
