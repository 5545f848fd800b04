//! Leaderboard ranking
//!
//! Order: return_pct descending, ties broken by the absolute size of
//! (total_asset - starting_cash) descending, then user_id ascending.
//! Members whose valuation failed go last. Ranks are 1..=N with no gaps
//! and no shared ranks.

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::account::{LeagueId, UserId};
use super::league::{League, LeagueMember, LeagueStatus};
use super::valuation::PortfolioValuation;

/// How a member fared during aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MemberStanding {
    Valued(PortfolioValuation),
    Degraded { reason: String },
}

impl MemberStanding {
    pub fn valuation(&self) -> Option<&PortfolioValuation> {
        match self {
            MemberStanding::Valued(v) => Some(v),
            MemberStanding::Degraded { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: UserId,
    pub username: String,
    pub standing: MemberStanding,
}

impl LeaderboardEntry {
    pub fn return_pct(&self) -> Option<Decimal> {
        self.standing.valuation().map(|v| v.return_pct)
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.standing, MemberStanding::Degraded { .. })
    }
}

/// One user's result in one league
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSummary {
    pub league_id: LeagueId,
    pub name: String,
    pub status: LeagueStatus,
    pub participant_count: usize,
    pub initial_asset: Decimal,
    /// None when the user's valuation failed
    pub final_asset: Option<Decimal>,
    pub return_pct: Option<Decimal>,
    /// None when the user is not on the board
    pub rank: Option<u32>,
}

impl LeagueSummary {
    /// Summarise `user_id`'s row of a ranked board.
    ///
    /// A degraded entry keeps its rank; the initial asset then falls back to
    /// the league's starting cash.
    pub fn from_board(league: &League, user_id: UserId, board: &[LeaderboardEntry]) -> Self {
        let entry = board.iter().find(|e| e.user_id == user_id);
        let valuation = entry.and_then(|e| e.standing.valuation());

        Self {
            league_id: league.id,
            name: league.name.clone(),
            status: league.status,
            participant_count: board.len(),
            initial_asset: valuation.map_or(league.initial_cash, |v| v.starting_cash),
            final_asset: valuation.map(|v| v.total_asset),
            return_pct: valuation.map(|v| v.return_pct),
            rank: entry.map(|e| e.rank),
        }
    }
}

/// Sort standings and assign ranks.
pub fn rank_standings(mut rows: Vec<(LeagueMember, MemberStanding)>) -> Vec<LeaderboardEntry> {
    rows.sort_by(|(a_member, a), (b_member, b)| {
        compare_standings(a, b).then_with(|| a_member.user_id.cmp(&b_member.user_id))
    });

    rows.into_iter()
        .zip(1u32..)
        .map(|((member, standing), rank)| LeaderboardEntry {
            rank,
            user_id: member.user_id,
            username: member.username,
            standing,
        })
        .collect()
}

fn compare_standings(a: &MemberStanding, b: &MemberStanding) -> Ordering {
    match (a, b) {
        (MemberStanding::Valued(a), MemberStanding::Valued(b)) => b
            .return_pct
            .cmp(&a.return_pct)
            .then_with(|| b.pnl.abs().cmp(&a.pnl.abs())),
        (MemberStanding::Valued(_), MemberStanding::Degraded { .. }) => Ordering::Less,
        (MemberStanding::Degraded { .. }, MemberStanding::Valued(_)) => Ordering::Greater,
        (MemberStanding::Degraded { .. }, MemberStanding::Degraded { .. }) => Ordering::Equal,
    }
}
