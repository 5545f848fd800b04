//! Portfolio valuation math
//!
//! Pure functions of an [`Account`] and a symbol → price map. Quote fetching
//! lives in the application layer; a symbol missing from the map is treated as
//! "no quote available". All arithmetic is checked: an amount that does not
//! fit in a `Decimal` is an error, never a panic.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::account::{Account, AccountId, Holding};

/// Decimal places kept on percentages
pub const PERCENT_DP: u32 = 2;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValuationError {
    /// Named amount exceeded the `Decimal` range
    #[error("Arithmetic overflow computing {0}")]
    Overflow(String),
}

fn overflow(what: impl Into<String>) -> ValuationError {
    ValuationError::Overflow(what.into())
}

/// Point-in-time valuation of one holding.
///
/// Price-dependent fields are `None` when no quote was available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingValuation {
    pub symbol: String,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub cost_basis: Decimal,
    pub current_price: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub pnl_pct: Option<Decimal>,
}

impl HoldingValuation {
    fn new(holding: &Holding, price: Option<Decimal>) -> Result<Self, ValuationError> {
        let cost_basis = holding
            .quantity
            .checked_mul(holding.average_cost)
            .ok_or_else(|| overflow(format!("cost basis of {}", holding.symbol)))?;

        let (market_value, pnl, pnl_pct) = match price {
            Some(price) => {
                let market_value = price
                    .checked_mul(holding.quantity)
                    .ok_or_else(|| overflow(format!("market value of {}", holding.symbol)))?;
                let pnl = market_value
                    .checked_sub(cost_basis)
                    .ok_or_else(|| overflow(format!("pnl of {}", holding.symbol)))?;
                (Some(market_value), Some(pnl), Some(percent_of(pnl, cost_basis)?))
            }
            None => (None, None, None),
        };

        Ok(Self {
            symbol: holding.symbol.clone(),
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            cost_basis,
            current_price: price,
            market_value,
            pnl,
            pnl_pct,
        })
    }

    pub fn is_priced(&self) -> bool {
        self.current_price.is_some()
    }
}

/// Account-level financial snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub account: AccountId,
    pub starting_cash: Decimal,
    pub cash: Decimal,
    pub holdings_value: Decimal,
    pub total_asset: Decimal,
    /// total_asset - starting_cash
    pub pnl: Decimal,
    pub return_pct: Decimal,
    pub holdings: Vec<HoldingValuation>,
    /// Symbols held but not priced
    pub missing_quotes: Vec<String>,
}

impl PortfolioValuation {
    pub fn is_partial(&self) -> bool {
        !self.missing_quotes.is_empty()
    }
}

/// Value an account against the given prices.
pub fn valuate_account(
    account: &Account,
    prices: &HashMap<String, Decimal>,
) -> Result<PortfolioValuation, ValuationError> {
    let holdings = account
        .holdings()
        .map(|h| HoldingValuation::new(h, prices.get(&h.symbol).copied()))
        .collect::<Result<Vec<_>, _>>()?;

    let holdings_value = holdings
        .iter()
        .filter_map(|h| h.market_value)
        .try_fold(Decimal::ZERO, |acc, mv| acc.checked_add(mv))
        .ok_or_else(|| overflow("holdings value"))?;
    let missing_quotes = holdings
        .iter()
        .filter(|h| !h.is_priced())
        .map(|h| h.symbol.clone())
        .collect();

    let total_asset = account
        .cash_balance
        .checked_add(holdings_value)
        .ok_or_else(|| overflow("total asset"))?;
    let pnl = total_asset
        .checked_sub(account.starting_cash)
        .ok_or_else(|| overflow("pnl"))?;

    Ok(PortfolioValuation {
        account: account.id,
        starting_cash: account.starting_cash,
        cash: account.cash_balance,
        holdings_value,
        total_asset,
        pnl,
        return_pct: percent_of(pnl, account.starting_cash)?,
        holdings,
        missing_quotes,
    })
}

/// `part / base * 100` rounded to [`PERCENT_DP`]; zero when `base` is zero.
pub fn percent_of(part: Decimal, base: Decimal) -> Result<Decimal, ValuationError> {
    if base.is_zero() {
        return Ok(Decimal::ZERO);
    }
    part.checked_div(base)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(PERCENT_DP))
        .ok_or_else(|| overflow("percentage"))
}
