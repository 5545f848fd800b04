//! League Roster Aggregator
//!
//! Lists a league's members and values each one independently. One member's
//! failure or timeout becomes a degraded standing; it never aborts the batch.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use super::standings::StandingsError;
use super::valuator::PortfolioValuator;
use crate::domain::{AccountId, LeagueId, LeagueMember, MemberStanding};
use crate::ports::AccountStore;

#[derive(Clone)]
pub struct RosterAggregator {
    store: Arc<dyn AccountStore>,
    valuator: PortfolioValuator,
    member_timeout: Duration,
}

impl RosterAggregator {
    pub fn new(
        store: Arc<dyn AccountStore>,
        valuator: PortfolioValuator,
        member_timeout: Duration,
    ) -> Self {
        Self {
            store,
            valuator,
            member_timeout,
        }
    }

    /// Deduplicated active members of a league
    pub async fn members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, StandingsError> {
        let members = self.store.list_members(league_id).await?;
        Ok(dedup_members(members))
    }

    /// Value every member of a league.
    ///
    /// Results come back in roster order.
    pub async fn collect(
        &self,
        league_id: LeagueId,
    ) -> Result<Vec<(LeagueMember, MemberStanding)>, StandingsError> {
        let members = self.members(league_id).await?;
        tracing::debug!("Valuing {} members of league {}", members.len(), league_id);

        let standings = join_all(
            members
                .iter()
                .map(|member| self.valuate_member(league_id, member)),
        )
        .await;

        Ok(members.into_iter().zip(standings).collect())
    }

    async fn valuate_member(&self, league_id: LeagueId, member: &LeagueMember) -> MemberStanding {
        let id = AccountId::new(member.user_id, league_id);
        let valuation = tokio::time::timeout(self.member_timeout, self.valuator.valuate(id));
        let failure = match valuation.await {
            Ok(Ok(valuation)) => return MemberStanding::Valued(valuation),
            Ok(Err(e)) => StandingsError::MemberValuationFailed {
                user_id: member.user_id,
                reason: e.to_string(),
            },
            Err(_) => StandingsError::MemberValuationFailed {
                user_id: member.user_id,
                reason: format!("timed out after {:?}", self.member_timeout),
            },
        };

        tracing::warn!("{} ({})", failure, member.username);
        MemberStanding::Degraded {
            reason: failure.to_string(),
        }
    }
}

/// Keep the first occurrence of each user_id
fn dedup_members(members: Vec<LeagueMember>) -> Vec<LeagueMember> {
    let mut seen = HashSet::new();
    members
        .into_iter()
        .filter(|m| seen.insert(m.user_id))
        .collect()
}
