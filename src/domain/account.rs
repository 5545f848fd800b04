use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type UserId = u64;
pub type LeagueId = u64;

/// An account is scoped to one (user, league) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId {
    pub user_id: UserId,
    pub league_id: LeagueId,
}

impl AccountId {
    pub fn new(user_id: UserId, league_id: LeagueId) -> Self {
        Self { user_id, league_id }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user {} in league {}", self.user_id, self.league_id)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(Decimal),
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),
    #[error("Invalid cash amount: {0}")]
    InvalidCash(Decimal),
    #[error("Insufficient cash: need {required}, have {available}")]
    InsufficientCash { required: Decimal, available: Decimal },
    #[error("No position in {0}")]
    PositionNotFound(String),
    #[error("Not enough shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: Decimal,
        held: Decimal,
    },
    #[error("Amount overflow: {0}")]
    Overflow(String),
}

fn overflow(what: impl Into<String>) -> AccountError {
    AccountError::Overflow(what.into())
}

/// A position in one symbol, carried at weighted-average cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
}

impl Holding {
    pub fn new(
        symbol: impl Into<String>,
        quantity: Decimal,
        average_cost: Decimal,
    ) -> Result<Self, AccountError> {
        if quantity <= Decimal::ZERO {
            return Err(AccountError::InvalidQuantity(quantity));
        }
        if average_cost <= Decimal::ZERO {
            return Err(AccountError::InvalidPrice(average_cost));
        }

        let holding = Self {
            symbol: symbol.into(),
            quantity,
            average_cost,
        };
        holding.cost_basis()?;
        Ok(holding)
    }

    pub fn cost_basis(&self) -> Result<Decimal, AccountError> {
        self.quantity
            .checked_mul(self.average_cost)
            .ok_or_else(|| overflow(format!("cost basis of {}", self.symbol)))
    }
}

/// Cash and holdings a member owns inside one league
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub starting_cash: Decimal,
    pub cash_balance: Decimal,
    holdings: BTreeMap<String, Holding>,
}

impl Account {
    /// Fresh account seeded with the league's initial cash
    pub fn new(id: AccountId, starting_cash: Decimal) -> Result<Self, AccountError> {
        Self::with_state(id, starting_cash, starting_cash, Vec::new())
    }

    /// Rebuild an account from stored state.
    ///
    /// Holdings sharing a symbol are merged at weighted-average cost.
    pub fn with_state(
        id: AccountId,
        starting_cash: Decimal,
        cash_balance: Decimal,
        holdings: Vec<Holding>,
    ) -> Result<Self, AccountError> {
        if starting_cash < Decimal::ZERO {
            return Err(AccountError::InvalidCash(starting_cash));
        }
        if cash_balance < Decimal::ZERO {
            return Err(AccountError::InvalidCash(cash_balance));
        }

        let mut account = Self {
            id,
            starting_cash,
            cash_balance,
            holdings: BTreeMap::new(),
        };
        for holding in holdings {
            let holding = Holding::new(holding.symbol, holding.quantity, holding.average_cost)?;
            account.merge_holding(holding)?;
        }
        Ok(account)
    }

    /// Holdings in symbol order
    pub fn holdings(&self) -> impl Iterator<Item = &Holding> {
        self.holdings.values()
    }

    pub fn holding(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn holding_count(&self) -> usize {
        self.holdings.len()
    }

    /// Cash plus every holding at cost
    pub fn invested_capital(&self) -> Result<Decimal, AccountError> {
        self.holdings().try_fold(self.cash_balance, |total, holding| {
            total
                .checked_add(holding.cost_basis()?)
                .ok_or_else(|| overflow("invested capital"))
        })
    }

    /// Buy `quantity` shares at `price`. Returns the cash spent.
    pub fn buy(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Decimal, AccountError> {
        validate_fill(quantity, price)?;

        let cost = quantity
            .checked_mul(price)
            .ok_or_else(|| overflow(format!("cost of {} {}", quantity, symbol)))?;
        if cost > self.cash_balance {
            return Err(AccountError::InsufficientCash {
                required: cost,
                available: self.cash_balance,
            });
        }

        self.merge_holding(Holding {
            symbol: symbol.to_string(),
            quantity,
            average_cost: price,
        })?;
        self.cash_balance -= cost;
        Ok(cost)
    }

    /// Sell `quantity` shares at `price`. Returns the cash received.
    ///
    /// Average cost is left untouched; the holding is dropped once it is empty.
    pub fn sell(
        &mut self,
        symbol: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Decimal, AccountError> {
        validate_fill(quantity, price)?;

        let held = self
            .holdings
            .get(symbol)
            .map(|h| h.quantity)
            .ok_or_else(|| AccountError::PositionNotFound(symbol.to_string()))?;
        if quantity > held {
            return Err(AccountError::InsufficientShares {
                symbol: symbol.to_string(),
                requested: quantity,
                held,
            });
        }

        let proceeds = quantity
            .checked_mul(price)
            .ok_or_else(|| overflow(format!("proceeds of {} {}", quantity, symbol)))?;
        let cash_balance = self
            .cash_balance
            .checked_add(proceeds)
            .ok_or_else(|| overflow("cash balance"))?;

        let remaining = held - quantity;
        if remaining.is_zero() {
            self.holdings.remove(symbol);
        } else if let Some(holding) = self.holdings.get_mut(symbol) {
            holding.quantity = remaining;
        }

        self.cash_balance = cash_balance;
        Ok(proceeds)
    }

    /// Add shares at weighted-average cost. Leaves the holding untouched on overflow.
    fn merge_holding(&mut self, incoming: Holding) -> Result<(), AccountError> {
        match self.holdings.get_mut(&incoming.symbol) {
            Some(existing) => {
                let too_large = || overflow(format!("position in {}", incoming.symbol));
                let total = existing
                    .quantity
                    .checked_add(incoming.quantity)
                    .ok_or_else(too_large)?;
                let combined_cost = existing
                    .cost_basis()?
                    .checked_add(incoming.cost_basis()?)
                    .ok_or_else(too_large)?;
                existing.average_cost = combined_cost.checked_div(total).ok_or_else(too_large)?;
                existing.quantity = total;
            }
            None => {
                incoming.cost_basis()?;
                self.holdings.insert(incoming.symbol.clone(), incoming);
            }
        }
        Ok(())
    }
}

fn validate_fill(quantity: Decimal, price: Decimal) -> Result<(), AccountError> {
    if quantity <= Decimal::ZERO {
        return Err(AccountError::InvalidQuantity(quantity));
    }
    if price <= Decimal::ZERO {
        return Err(AccountError::InvalidPrice(price));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account() -> Account {
        Account::new(AccountId::new(1, 10), dec!(100000)).unwrap()
    }

    #[test]
    fn test_new_account_seeded_with_starting_cash() {
        let account = account();
        assert_eq!(account.cash_balance, dec!(100000));
        assert_eq!(account.starting_cash, dec!(100000));
        assert_eq!(account.holding_count(), 0);
    }

    #[test]
    fn test_negative_starting_cash_rejected() {
        let result = Account::new(AccountId::new(1, 10), dec!(-1));
        assert!(matches!(result, Err(AccountError::InvalidCash(_))));
    }

    #[test]
    fn test_buy_creates_holding_and_debits_cash() {
        let mut account = account();
        let cost = account.buy("AAPL", dec!(10), dec!(150)).unwrap();

        assert_eq!(cost, dec!(1500));
        assert_eq!(account.cash_balance, dec!(98500));
        let holding = account.holding("AAPL").unwrap();
        assert_eq!(holding.quantity, dec!(10));
        assert_eq!(holding.average_cost, dec!(150));
    }

    #[test]
    fn test_second_buy_reaverages_cost() {
        let mut account = account();
        account.buy("AAPL", dec!(10), dec!(100)).unwrap();
        account.buy("AAPL", dec!(10), dec!(200)).unwrap();

        let holding = account.holding("AAPL").unwrap();
        assert_eq!(holding.quantity, dec!(20));
        assert_eq!(holding.average_cost, dec!(150));
        assert_eq!(account.cash_balance, dec!(97000));
    }

    #[test]
    fn test_buy_beyond_cash_rejected() {
        let mut account = account();
        let result = account.buy("TSLA", dec!(1000), dec!(200));

        assert!(matches!(result, Err(AccountError::InsufficientCash { .. })));
        assert_eq!(account.cash_balance, dec!(100000));
        assert!(account.holding("TSLA").is_none());
    }

    #[test]
    fn test_invalid_fill_rejected() {
        let mut account = account();
        assert_eq!(
            account.buy("AAPL", dec!(0), dec!(100)),
            Err(AccountError::InvalidQuantity(dec!(0)))
        );
        assert_eq!(
            account.buy("AAPL", dec!(1), dec!(-5)),
            Err(AccountError::InvalidPrice(dec!(-5)))
        );
    }

    #[test]
    fn test_partial_sell_keeps_average_cost() {
        let mut account = account();
        account.buy("MSFT", dec!(10), dec!(300)).unwrap();
        let proceeds = account.sell("MSFT", dec!(4), dec!(320)).unwrap();

        assert_eq!(proceeds, dec!(1280));
        let holding = account.holding("MSFT").unwrap();
        assert_eq!(holding.quantity, dec!(6));
        assert_eq!(holding.average_cost, dec!(300));
        assert_eq!(account.cash_balance, dec!(98280));
    }

    #[test]
    fn test_full_sell_removes_holding() {
        let mut account = account();
        account.buy("MSFT", dec!(10), dec!(300)).unwrap();
        account.sell("MSFT", dec!(10), dec!(290)).unwrap();

        assert!(account.holding("MSFT").is_none());
        assert_eq!(account.cash_balance, dec!(99900));
    }

    #[test]
    fn test_sell_unknown_or_oversized_rejected() {
        let mut account = account();
        assert_eq!(
            account.sell("NVDA", dec!(1), dec!(100)),
            Err(AccountError::PositionNotFound("NVDA".to_string()))
        );

        account.buy("NVDA", dec!(2), dec!(100)).unwrap();
        let result = account.sell("NVDA", dec!(3), dec!(100));
        assert!(matches!(result, Err(AccountError::InsufficientShares { .. })));
        assert_eq!(account.holding("NVDA").unwrap().quantity, dec!(2));
    }

    #[test]
    fn test_invested_capital_conserved_by_buys() {
        let mut account = account();
        account.buy("AAPL", dec!(10), dec!(150)).unwrap();
        account.buy("AAPL", dec!(5), dec!(170)).unwrap();
        account.buy("GOOG", dec!(3), dec!(120.5)).unwrap();

        assert_eq!(account.invested_capital(), Ok(dec!(100000)));
    }

    #[test]
    fn test_with_state_merges_duplicate_symbols() {
        let account = Account::with_state(
            AccountId::new(2, 10),
            dec!(1000),
            dec!(0),
            vec![
                Holding::new("AAPL", dec!(2), dec!(100)).unwrap(),
                Holding::new("AAPL", dec!(2), dec!(300)).unwrap(),
            ],
        )
        .unwrap();

        assert_eq!(account.holding_count(), 1);
        assert_eq!(account.holding("AAPL").unwrap().average_cost, dec!(200));
    }

    #[test]
    fn test_holding_beyond_decimal_range_rejected() {
        let result = Holding::new("AAPL", Decimal::MAX / dec!(2), dec!(10));
        assert!(matches!(result, Err(AccountError::Overflow(_))));
    }

    #[test]
    fn test_merge_overflow_rejected() {
        let half = Decimal::MAX / dec!(2);
        let result = Account::with_state(
            AccountId::new(2, 10),
            dec!(1000),
            dec!(0),
            vec![
                Holding::new("AAPL", half, Decimal::ONE).unwrap(),
                Holding::new("AAPL", half, Decimal::ONE).unwrap(),
            ],
        );
        assert!(matches!(result, Err(AccountError::Overflow(_))));
    }

    #[test]
    fn test_sell_proceeds_overflow_leaves_account_untouched() {
        let mut account = Account::with_state(
            AccountId::new(2, 10),
            Decimal::MAX,
            Decimal::MAX,
            vec![Holding::new("AAPL", dec!(10), dec!(1)).unwrap()],
        )
        .unwrap();

        let result = account.sell("AAPL", dec!(10), dec!(2));
        assert!(matches!(result, Err(AccountError::Overflow(_))));
        assert_eq!(account.holding("AAPL").unwrap().quantity, dec!(10));
        assert_eq!(account.cash_balance, Decimal::MAX);
    }
}
