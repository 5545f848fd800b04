//! In-memory adapters
//!
//! `MemoryAccountStore` keeps leagues, rosters and accounts in process and
//! enforces the league lifecycle and trading rules. `StaticQuoteSource`
//! serves a fixed price table. Both back the CLI snapshot mode and the tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{
    Account, AccountError, AccountId, League, LeagueError, LeagueId, LeagueMember, LeagueStatus,
    TradeSide, Transaction, UserId,
};
use crate::ports::{AccountStore, Quote, QuoteError, QuoteSource, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    League(#[from] LeagueError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error("League {0} already exists")]
    DuplicateLeague(LeagueId),
    #[error("League {0} is not joinable")]
    NotJoinable(LeagueId),
    #[error("User {user_id} already in league {league_id}")]
    AlreadyMember { user_id: UserId, league_id: LeagueId },
    #[error("User {0} is already in another open league")]
    InAnotherLeague(UserId),
    #[error("Trading is closed in league {0}")]
    TradingClosed(LeagueId),
}

#[derive(Debug, Default)]
struct LedgerState {
    leagues: HashMap<LeagueId, League>,
    members: HashMap<LeagueId, Vec<LeagueMember>>,
    accounts: HashMap<AccountId, Account>,
    transactions: HashMap<AccountId, Vec<Transaction>>,
}

/// League state held in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryAccountStore {
    state: Arc<RwLock<LedgerState>>,
    account_delays: Arc<Mutex<HashMap<UserId, Duration>>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to slow down account lookups for one user
    pub fn with_account_delay(self, user_id: UserId, delay: Duration) -> Self {
        lock(&self.account_delays).insert(user_id, delay);
        self
    }

    pub async fn create_league(&self, league: League) -> Result<(), LedgerError> {
        league.validate()?;
        let mut state = self.state.write().await;
        if state.leagues.contains_key(&league.id) {
            return Err(LedgerError::DuplicateLeague(league.id));
        }
        state.members.insert(league.id, Vec::new());
        state.leagues.insert(league.id, league);
        Ok(())
    }

    /// Join a draft league. The account holds no cash until the league starts.
    pub async fn join(&self, league_id: LeagueId, member: LeagueMember) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let league = state
            .leagues
            .get(&league_id)
            .ok_or_else(|| StoreError::NotFound(format!("league {}", league_id)))?;

        let roster = state.members.get(&league_id).map(Vec::as_slice).unwrap_or_default();
        if roster.iter().any(|m| m.user_id == member.user_id) {
            return Err(LedgerError::AlreadyMember {
                user_id: member.user_id,
                league_id,
            });
        }
        if !league.is_joinable(roster.len()) {
            return Err(LedgerError::NotJoinable(league_id));
        }
        if state.in_open_league(member.user_id) {
            return Err(LedgerError::InAnotherLeague(member.user_id));
        }

        let id = AccountId::new(member.user_id, league_id);
        state.accounts.insert(id, Account::new(id, Decimal::ZERO)?);
        state.members.entry(league_id).or_default().push(member);
        Ok(())
    }

    /// Start a league and seed every member with its initial cash
    pub async fn start_league(&self, league_id: LeagueId) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let league = state
            .leagues
            .get_mut(&league_id)
            .ok_or_else(|| StoreError::NotFound(format!("league {}", league_id)))?;
        league.start()?;
        let initial_cash = league.initial_cash;

        let user_ids: Vec<UserId> = state
            .members
            .get(&league_id)
            .map(|roster| roster.iter().map(|m| m.user_id).collect())
            .unwrap_or_default();
        for user_id in user_ids {
            let id = AccountId::new(user_id, league_id);
            state.accounts.insert(id, Account::new(id, initial_cash)?);
        }

        tracing::info!("League {} started with initial cash {}", league_id, initial_cash);
        Ok(())
    }

    /// End a league; accounts become read-only
    pub async fn end_league(&self, league_id: LeagueId) -> Result<(), LedgerError> {
        let mut state = self.state.write().await;
        let league = state
            .leagues
            .get_mut(&league_id)
            .ok_or_else(|| StoreError::NotFound(format!("league {}", league_id)))?;
        league.end()?;
        tracing::info!("League {} ended", league_id);
        Ok(())
    }

    /// Execute a fill against an account in an active league
    pub async fn execute_trade(
        &self,
        transaction: Transaction,
        id: AccountId,
    ) -> Result<Account, LedgerError> {
        let mut state = self.state.write().await;
        let trading_open = state
            .leagues
            .get(&id.league_id)
            .map(League::allows_trading)
            .ok_or_else(|| StoreError::NotFound(format!("league {}", id.league_id)))?;
        if !trading_open {
            return Err(LedgerError::TradingClosed(id.league_id));
        }

        let account = state
            .accounts
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account for {}", id)))?;
        transaction.apply_to(account)?;
        let snapshot = account.clone();

        tracing::debug!("Executed {} for {}", transaction, id);
        state.transactions.entry(id).or_default().push(transaction);
        Ok(snapshot)
    }

    /// Convenience wrapper over [`execute_trade`](Self::execute_trade)
    pub async fn trade(
        &self,
        id: AccountId,
        side: TradeSide,
        symbol: &str,
        shares: Decimal,
        price: Decimal,
    ) -> Result<Account, LedgerError> {
        let tx = Transaction::new(symbol, side, shares, price, chrono::Utc::now());
        self.execute_trade(tx, id).await
    }

    pub async fn transactions(&self, id: AccountId) -> Vec<Transaction> {
        let state = self.state.read().await;
        state.transactions.get(&id).cloned().unwrap_or_default()
    }

    /// Load a league, roster entry or account as-is (snapshot restore)
    pub async fn insert_league(&self, league: League) {
        let mut state = self.state.write().await;
        state.members.entry(league.id).or_default();
        state.leagues.insert(league.id, league);
    }

    pub async fn insert_member(&self, league_id: LeagueId, member: LeagueMember) {
        let mut state = self.state.write().await;
        state.members.entry(league_id).or_default().push(member);
    }

    pub async fn insert_account(&self, account: Account) {
        let mut state = self.state.write().await;
        state.accounts.insert(account.id, account);
    }

    fn account_delay(&self, user_id: UserId) -> Option<Duration> {
        lock(&self.account_delays).get(&user_id).copied()
    }
}

impl LedgerState {
    fn in_open_league(&self, user_id: UserId) -> bool {
        self.members.iter().any(|(league_id, roster)| {
            let open = self
                .leagues
                .get(league_id)
                .map(|l| l.status != LeagueStatus::Ended)
                .unwrap_or(false);
            open && roster.iter().any(|m| m.user_id == user_id)
        })
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn get_league(&self, league_id: LeagueId) -> Result<League, StoreError> {
        let state = self.state.read().await;
        state
            .leagues
            .get(&league_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("league {}", league_id)))
    }

    async fn list_members(&self, league_id: LeagueId) -> Result<Vec<LeagueMember>, StoreError> {
        let state = self.state.read().await;
        if !state.leagues.contains_key(&league_id) {
            return Err(StoreError::NotFound(format!("league {}", league_id)));
        }
        Ok(state.members.get(&league_id).cloned().unwrap_or_default())
    }

    async fn get_account(&self, id: AccountId) -> Result<Account, StoreError> {
        if let Some(delay) = self.account_delay(id.user_id) {
            tokio::time::sleep(delay).await;
        }
        let state = self.state.read().await;
        state
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account for {}", id)))
    }

    async fn list_leagues_for_user(&self, user_id: UserId) -> Result<Vec<League>, StoreError> {
        let state = self.state.read().await;
        let mut leagues: Vec<League> = state
            .members
            .iter()
            .filter(|(_, roster)| roster.iter().any(|m| m.user_id == user_id))
            .filter_map(|(league_id, _)| state.leagues.get(league_id).cloned())
            .collect();
        leagues.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(leagues)
    }
}

/// Fixed price table that records every lookup
#[derive(Debug, Default, Clone)]
pub struct StaticQuoteSource {
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StaticQuoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the price for a symbol
    pub fn with_price(self, symbol: &str, price: Decimal) -> Self {
        self.set_price(symbol, price);
        self
    }

    /// Builder method to delay the answer for a symbol
    pub fn with_delay(self, symbol: &str, delay: Duration) -> Self {
        lock(&self.delays).insert(symbol.to_string(), delay);
        self
    }

    /// Builder method to make a symbol fail with an HTTP error
    pub fn with_failure(self, symbol: &str) -> Self {
        lock(&self.failing).insert(symbol.to_string());
        self
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        lock(&self.prices).insert(symbol.to_string(), price);
    }

    /// Get all recorded lookups
    pub fn get_calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl QuoteSource for StaticQuoteSource {
    async fn get_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        lock(&self.calls).push(symbol.to_string());

        let delay = lock(&self.delays).get(symbol).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if lock(&self.failing).contains(symbol) {
            return Err(QuoteError::Http(format!("upstream error for {}", symbol)));
        }

        lock(&self.prices)
            .get(symbol)
            .map(|price| Quote::new(symbol, *price))
            .ok_or_else(|| QuoteError::Unavailable(symbol.to_string()))
    }
}
