use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account::{LeagueId, UserId};

pub const MIN_MEMBERS: u32 = 2;
pub const MAX_MEMBERS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LeagueStatus {
    /// Listed and joinable, no trading yet
    Draft,
    /// Trading open
    Active,
    /// Historical only
    Ended,
}

impl fmt::Display for LeagueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LeagueStatus::Draft => "DRAFT",
            LeagueStatus::Active => "ACTIVE",
            LeagueStatus::Ended => "ENDED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LeagueError {
    #[error("Cannot {action} a league in {from} state")]
    InvalidTransition {
        from: LeagueStatus,
        action: &'static str,
    },
    #[error("max_members must be 2-500, got {0}")]
    InvalidMaxMembers(u32),
    #[error("initial_cash must be >= 0, got {0}")]
    InvalidInitialCash(Decimal),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub status: LeagueStatus,
    pub initial_cash: Decimal,
    pub max_members: u32,
}

/// A user on a league's active roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueMember {
    pub user_id: UserId,
    pub username: String,
}

impl LeagueMember {
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

impl League {
    /// Create a league in draft state
    pub fn new(
        id: LeagueId,
        name: impl Into<String>,
        initial_cash: Decimal,
        max_members: u32,
    ) -> Result<Self, LeagueError> {
        let league = Self {
            id,
            name: name.into(),
            status: LeagueStatus::Draft,
            initial_cash,
            max_members,
        };
        league.validate()?;
        Ok(league)
    }

    pub fn validate(&self) -> Result<(), LeagueError> {
        if !(MIN_MEMBERS..=MAX_MEMBERS).contains(&self.max_members) {
            return Err(LeagueError::InvalidMaxMembers(self.max_members));
        }
        if self.initial_cash < Decimal::ZERO {
            return Err(LeagueError::InvalidInitialCash(self.initial_cash));
        }
        Ok(())
    }

    pub fn is_joinable(&self, active_members: usize) -> bool {
        self.status == LeagueStatus::Draft && active_members < self.max_members as usize
    }

    pub fn allows_trading(&self) -> bool {
        self.status == LeagueStatus::Active
    }

    pub fn start(&mut self) -> Result<(), LeagueError> {
        self.transition(LeagueStatus::Draft, LeagueStatus::Active, "start")
    }

    pub fn end(&mut self) -> Result<(), LeagueError> {
        self.transition(LeagueStatus::Active, LeagueStatus::Ended, "end")
    }

    fn transition(
        &mut self,
        expected: LeagueStatus,
        next: LeagueStatus,
        action: &'static str,
    ) -> Result<(), LeagueError> {
        if self.status != expected {
            return Err(LeagueError::InvalidTransition {
                from: self.status,
                action,
            });
        }
        self.status = next;
        Ok(())
    }
}
