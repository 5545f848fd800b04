//! League snapshot files
//!
//! A TOML description of leagues, rosters, accounts and (optionally) a
//! price table. Loaded into the in-memory adapters for offline standings.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use super::memory::{MemoryAccountStore, StaticQuoteSource};
use crate::domain::{
    Account, AccountError, AccountId, Holding, League, LeagueError, LeagueId, LeagueMember,
    LeagueStatus, UserId,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse snapshot TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid league {league_id}: {source}")]
    InvalidLeague {
        league_id: LeagueId,
        #[source]
        source: LeagueError,
    },
    #[error("Invalid account for user {user_id} in league {league_id}: {source}")]
    InvalidAccount {
        user_id: UserId,
        league_id: LeagueId,
        #[source]
        source: AccountError,
    },
    #[error("Snapshot references unknown league {0}")]
    UnknownLeague(LeagueId),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub leagues: Vec<LeagueRecord>,
    #[serde(default)]
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub accounts: Vec<AccountRecord>,
    /// Symbol -> last close
    #[serde(default)]
    pub prices: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueRecord {
    pub id: LeagueId,
    pub name: String,
    pub status: LeagueStatus,
    pub initial_cash: Decimal,
    pub max_members: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberRecord {
    pub league_id: LeagueId,
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountRecord {
    pub league_id: LeagueId,
    pub user_id: UserId,
    pub starting_cash: Decimal,
    pub cash_balance: Decimal,
    #[serde(default)]
    pub holdings: Vec<Holding>,
}

/// Load a snapshot from a TOML file
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, SnapshotError> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = toml::from_str(&content)?;
    Ok(snapshot)
}

impl Snapshot {
    /// Populate the in-memory adapters from this snapshot.
    ///
    /// Roster entries are loaded as written, duplicates included.
    pub async fn into_adapters(
        self,
    ) -> Result<(MemoryAccountStore, StaticQuoteSource), SnapshotError> {
        let store = MemoryAccountStore::new();
        let mut known: HashSet<LeagueId> = HashSet::new();

        for record in self.leagues {
            let league = League {
                id: record.id,
                name: record.name,
                status: record.status,
                initial_cash: record.initial_cash,
                max_members: record.max_members,
            };
            league.validate().map_err(|source| SnapshotError::InvalidLeague {
                league_id: league.id,
                source,
            })?;
            known.insert(league.id);
            store.insert_league(league).await;
        }

        for record in self.members {
            if !known.contains(&record.league_id) {
                return Err(SnapshotError::UnknownLeague(record.league_id));
            }
            store
                .insert_member(record.league_id, LeagueMember::new(record.user_id, record.username))
                .await;
        }

        for record in self.accounts {
            if !known.contains(&record.league_id) {
                return Err(SnapshotError::UnknownLeague(record.league_id));
            }
            let id = AccountId::new(record.user_id, record.league_id);
            let account = Account::with_state(
                id,
                record.starting_cash,
                record.cash_balance,
                record.holdings,
            )
            .map_err(|source| SnapshotError::InvalidAccount {
                user_id: record.user_id,
                league_id: record.league_id,
                source,
            })?;
            store.insert_account(account).await;
        }

        let quotes = StaticQuoteSource::new();
        for (symbol, price) in &self.prices {
            quotes.set_price(symbol, *price);
        }

        tracing::debug!("Snapshot loaded: {} leagues, {} prices", known.len(), self.prices.len());
        Ok((store, quotes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AccountStore, QuoteSource};
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_snapshot() -> String {
        r#"
[[leagues]]
id = 1
name = "Spring Cup"
status = "ACTIVE"
initial_cash = "100000"
max_members = 10

[[members]]
league_id = 1
user_id = 7
username = "alice"

[[members]]
league_id = 1
user_id = 8
username = "bob"

[[accounts]]
league_id = 1
user_id = 7
starting_cash = "100000"
cash_balance = "40000"
holdings = [
    { symbol = "AAPL", quantity = "10", average_cost = "150" },
]

[[accounts]]
league_id = 1
user_id = 8
starting_cash = "100000"
cash_balance = "100000"

[prices]
AAPL = "172.32"
"#
        .to_string()
    }

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_load_snapshot_into_adapters() {
        let file = write_temp(&sample_snapshot());
        let snapshot = load_snapshot(file.path()).unwrap();
        let (store, quotes) = snapshot.into_adapters().await.unwrap();

        let league = store.get_league(1).await.unwrap();
        assert_eq!(league.status, LeagueStatus::Active);
        assert_eq!(store.list_members(1).await.unwrap().len(), 2);

        let alice = store.get_account(AccountId::new(7, 1)).await.unwrap();
        assert_eq!(alice.cash_balance, dec!(40000));
        assert_eq!(alice.holding("AAPL").unwrap().quantity, dec!(10));

        assert_eq!(quotes.get_quote("AAPL").await.unwrap().price, dec!(172.32));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_snapshot("/nonexistent/league.toml");
        assert!(matches!(result.unwrap_err(), SnapshotError::IoError(_)));
    }

    #[tokio::test]
    async fn test_member_of_unknown_league_rejected() {
        let file = write_temp(
            r#"
[[members]]
league_id = 42
user_id = 1
username = "ghost"
"#,
        );
        let snapshot = load_snapshot(file.path()).unwrap();
        let result = snapshot.into_adapters().await;
        assert!(matches!(result, Err(SnapshotError::UnknownLeague(42))));
    }

    #[tokio::test]
    async fn test_invalid_holding_rejected() {
        let file = write_temp(
            r#"
[[leagues]]
id = 1
name = "Spring Cup"
status = "ACTIVE"
initial_cash = "1000"
max_members = 10

[[accounts]]
league_id = 1
user_id = 7
starting_cash = "1000"
cash_balance = "1000"
holdings = [ { symbol = "AAPL", quantity = "0", average_cost = "10" } ]
"#,
        );
        let snapshot = load_snapshot(file.path()).unwrap();
        let result = snapshot.into_adapters().await;
        assert!(matches!(
            result,
            Err(SnapshotError::InvalidAccount { user_id: 7, .. })
        ));
    }

    #[tokio::test]
    async fn test_holding_beyond_decimal_range_rejected() {
        let file = write_temp(
            r#"
[[leagues]]
id = 1
name = "Spring Cup"
status = "ACTIVE"
initial_cash = "1000"
max_members = 10

[[accounts]]
league_id = 1
user_id = 7
starting_cash = "1000"
cash_balance = "0"
holdings = [
    { symbol = "AAPL", quantity = "39614081257132168796771975168", average_cost = "10" },
]
"#,
        );
        let snapshot = load_snapshot(file.path()).unwrap();
        let result = snapshot.into_adapters().await;
        assert!(matches!(
            result,
            Err(SnapshotError::InvalidAccount {
                source: AccountError::Overflow(_),
                ..
            })
        ));
    }
}
