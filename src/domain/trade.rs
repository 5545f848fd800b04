use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account::{Account, AccountError, AccountId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// One executed fill in a league account's ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub symbol: String,
    pub side: TradeSide,
    pub shares: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Error, PartialEq)]
#[error("Transaction {index} ({symbol}) rejected: {source}")]
pub struct ReplayError {
    pub index: usize,
    pub symbol: String,
    #[source]
    pub source: AccountError,
}

impl Transaction {
    pub fn new(
        symbol: impl Into<String>,
        side: TradeSide,
        shares: Decimal,
        price: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            shares,
            price,
            executed_at,
        }
    }

    /// shares × price; `None` if it exceeds the `Decimal` range
    pub fn notional(&self) -> Option<Decimal> {
        self.shares.checked_mul(self.price)
    }

    /// Apply this fill to an account. Returns the signed cash flow
    /// (negative for buys).
    pub fn apply_to(&self, account: &mut Account) -> Result<Decimal, AccountError> {
        match self.side {
            TradeSide::Buy => account.buy(&self.symbol, self.shares, self.price).map(|c| -c),
            TradeSide::Sell => account.sell(&self.symbol, self.shares, self.price),
        }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        };
        write!(f, "{} {} {} @ {}", side, self.shares, self.symbol, self.price)
    }
}

/// Rebuild an account by replaying its ledger from the starting cash.
///
/// Fills are applied in execution order; equal timestamps keep input order.
pub fn replay_ledger(
    id: AccountId,
    starting_cash: Decimal,
    transactions: &[Transaction],
) -> Result<Account, ReplayError> {
    let mut account = Account::new(id, starting_cash).map_err(|source| ReplayError {
        index: 0,
        symbol: String::new(),
        source,
    })?;

    let mut ordered: Vec<(usize, &Transaction)> = transactions.iter().enumerate().collect();
    ordered.sort_by_key(|(_, tx)| tx.executed_at);

    for (index, tx) in ordered {
        tx.apply_to(&mut account).map_err(|source| ReplayError {
            index,
            symbol: tx.symbol.clone(),
            source,
        })?;
    }

    Ok(account)
}
